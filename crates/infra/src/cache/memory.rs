use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{CacheBackend, CacheError};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache. Expired entries are invisible to reads and are dropped
/// by [`MemoryCache::purge_expired`] or when overwritten.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(format!("ttl {ttl:?} out of range")))?;
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn invalidate_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries.get(key).is_some_and(|entry| entry.is_live(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = MemoryCache::default();
        cache.set("listings_search_a", "payload", TTL).await.unwrap();
        assert_eq!(
            cache.get("listings_search_a").await.unwrap().as_deref(),
            Some("payload")
        );
        assert!(cache.exists("listings_search_a").await.unwrap());
        assert!(cache.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prefix_invalidation_spares_other_prefixes() {
        let cache = MemoryCache::default();
        cache.set("listings_search_a", "1", TTL).await.unwrap();
        cache.set("listings_search_b", "2", TTL).await.unwrap();
        cache.set("featured_listings_10", "3", TTL).await.unwrap();

        let removed = cache.invalidate_by_prefix("listings_search_").await.unwrap();
        assert_eq!(removed, 2);
        assert!(!cache.exists("listings_search_a").await.unwrap());
        assert!(cache.exists("featured_listings_10").await.unwrap());

        // A second delete of the same prefix is a no-op.
        assert_eq!(
            cache.invalidate_by_prefix("listings_search_").await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn unrepresentable_ttl_is_rejected_without_storing() {
        let cache = MemoryCache::default();
        let err = cache
            .set("listings_search_a", "payload", Duration::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::default();
        cache
            .set("featured_listings_5", "x", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.exists("featured_listings_5").await.unwrap());
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("featured_listings_5").await.unwrap().is_none());
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 0);
    }
}
