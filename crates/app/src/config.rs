use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Upper bound for cache TTLs. Keeps expiry arithmetic and Redis `EX`
/// values far from overflow.
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub request_timeout: Duration,
    pub search_cache_ttl: Duration,
    pub featured_cache_ttl: Duration,
    pub expiry_interval: Duration,
    pub cache_purge_interval: Duration,
    pub admin_token: Option<String>,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("dotenv read failed: {0}")]
    Dotenv(#[from] std::io::Error),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let env = Env(lookup);
        let http_addr_raw = env.string("REALTY_HTTP_ADDR", "127.0.0.1:8080");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;

        Ok(Self {
            http_addr,
            database_url: env.optional("REALTY_DATABASE_URL"),
            redis_url: env.optional("REALTY_REDIS_URL"),
            request_timeout: env.seconds("REALTY_REQUEST_TIMEOUT_SECS", 15)?,
            search_cache_ttl: env.ttl("REALTY_SEARCH_CACHE_TTL_SECS", 300)?,
            featured_cache_ttl: env.ttl("REALTY_FEATURED_CACHE_TTL_SECS", 900)?,
            expiry_interval: env.seconds("REALTY_EXPIRY_INTERVAL_SECS", 3600)?,
            cache_purge_interval: env.seconds("REALTY_CACHE_PURGE_INTERVAL_SECS", 60)?,
            admin_token: env.optional("REALTY_ADMIN_TOKEN"),
            cors_allow_origins: env
                .optional("REALTY_CORS_ALLOW_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&'static str) -> Option<String>,
{
    fn string(&self, key: &'static str, default: &'static str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn optional(&self, key: &'static str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Whole seconds; zero is rejected since every duration here drives a
    /// timer or a TTL.
    fn seconds(&self, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(Duration::from_secs(default));
        };
        let secs: u64 = raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key, raw.clone()))?;
        if secs == 0 {
            return Err(ConfigError::InvalidValue(key, raw));
        }
        Ok(Duration::from_secs(secs))
    }

    fn ttl(&self, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
        let ttl = self.seconds(key, default)?;
        if ttl.as_secs() > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::InvalidValue(
                key,
                format!("{} exceeds {MAX_CACHE_TTL_SECS}", ttl.as_secs()),
            ));
        }
        Ok(ttl)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loads `.env` from the working directory, never overriding variables that
/// are already set.
pub fn load_dotenv() -> Result<(), ConfigError> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in contents.lines().filter_map(parse_dotenv_line) {
        if std::env::var_os(&key).is_none() {
            // Safety: called from main before the runtime spawns workers.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = match value.as_bytes().first() {
        Some(b'"') => unquote_double(value),
        Some(b'\'') => value
            .strip_prefix('\'')
            .and_then(|inner| inner.strip_suffix('\''))
            .unwrap_or(value)
            .to_string(),
        _ => value.to_string(),
    };
    Some((key.to_string(), value))
}

fn unquote_double(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')) else {
        return value.to_string();
    };
    let mut output = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some(escaped @ ('\\' | '"')) => output.push(escaped),
            Some(other) => {
                output.push('\\');
                output.push(other);
            }
            None => output.push('\\'),
        }
    }
    output
}
