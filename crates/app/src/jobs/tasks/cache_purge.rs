use realty_infra::cache::MemoryCache;
use tracing::debug;

pub async fn run(cache: &MemoryCache) -> usize {
    let removed = cache.purge_expired().await;
    if removed > 0 {
        debug!(removed, "expired cache entries purged");
    }
    removed
}
