use std::time::Duration;

use async_trait::async_trait;
use fred::clients::Pool;
use fred::prelude::*;
use fred::types::scan::ScanType;
use fred::types::{Builder, Expiration};
use tracing::info;

use super::{CacheBackend, CacheError};

const POOL_SIZE: usize = 4;
const SCAN_PAGE_SIZE: u32 = 250;

/// Cache shared by every process pointed at the same Redis. Entries expire
/// server-side, so nothing needs purging locally.
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub async fn connect(redis_url: &str, command_timeout: Duration) -> Result<Self, CacheError> {
        let config = Config::from_url(redis_url).map_err(backend)?;
        let pool = Builder::from_config(config)
            .with_connection_config(|cfg| {
                cfg.connection_timeout = command_timeout;
                cfg.internal_command_timeout = command_timeout;
                cfg.max_command_attempts = 3;
            })
            .set_policy(ReconnectPolicy::new_exponential(0, 100, 1000, 2))
            .build_pool(POOL_SIZE)
            .map_err(backend)?;
        pool.init().await.map_err(backend)?;
        info!(pool_size = POOL_SIZE, "redis cache connected");
        Ok(Self { pool })
    }
}

fn backend(err: impl std::fmt::Display) -> CacheError {
    CacheError::Backend(err.to_string())
}

/// Whole-second TTLs use `EX`; anything shorter falls back to `PX`.
fn expiration_for(ttl: Duration) -> Result<Expiration, CacheError> {
    let out_of_range = || CacheError::Backend(format!("ttl {ttl:?} out of range"));
    if ttl < Duration::from_secs(1) {
        let millis = i64::try_from(ttl.as_millis().max(1)).map_err(|_| out_of_range())?;
        return Ok(Expiration::PX(millis));
    }
    let secs = i64::try_from(ttl.as_secs()).map_err(|_| out_of_range())?;
    Ok(Expiration::EX(secs))
}

/// SCAN match pattern for keys starting with `prefix`. Glob metacharacters in
/// the prefix are escaped so they match literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let value: Option<String> = self.pool.get(key).await.map_err(backend)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expiration = expiration_for(ttl)?;
        self.pool
            .set::<(), _, _>(key, value, Some(expiration), None, false)
            .await
            .map_err(backend)
    }

    async fn invalidate_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = prefix_pattern(prefix);
        let mut cursor = "0".to_string();
        let mut removed = 0u64;
        loop {
            let (next_cursor, keys): (String, Vec<String>) = self
                .pool
                .scan_page::<(String, Vec<String>), String, String>(
                    cursor,
                    pattern.clone(),
                    Some(SCAN_PAGE_SIZE),
                    None::<ScanType>,
                )
                .await
                .map_err(backend)?;
            if !keys.is_empty() {
                let deleted: i64 = self.pool.del(keys).await.map_err(backend)?;
                removed += u64::try_from(deleted).unwrap_or(0);
            }
            if next_cursor == "0" {
                break;
            }
            cursor = next_cursor;
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let count: i64 = self.pool.exists(key).await.map_err(backend)?;
        Ok(count > 0)
    }
}
