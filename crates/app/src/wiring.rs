use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::state::{AppState, CacheHandle};
use realty_infra::cache::{CacheError, MemoryCache, RedisCache};
use realty_infra::db::{connect_lazy, DbPool, DbPoolError, PgListingStore};
use realty_infra::search::{CachePolicy, ListingSearchService};
use realty_infra::store::{InMemoryListingStore, ListingStore, ListingWriter};

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("db pool error: {0}")]
    Db(#[from] DbPoolError),
    #[error("cache connect error: {0}")]
    Cache(#[from] CacheError),
}

pub async fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let cache = build_cache(&config).await?;
    let Some(database_url) = config.database_url.clone() else {
        warn!("REALTY_DATABASE_URL not set; serving listings from an empty in-memory store");
        let store = Arc::new(InMemoryListingStore::default());
        return Ok(assemble(config, store.clone(), store, cache, None));
    };
    let pool = connect_lazy(&database_url, config.request_timeout)?;
    let store = Arc::new(PgListingStore::new(pool.clone()));
    info!("listing store backed by postgres");
    Ok(assemble(config, store.clone(), store, cache, Some(pool)))
}

async fn build_cache(config: &AppConfig) -> Result<CacheHandle, WiringError> {
    match config.redis_url.as_deref() {
        Some(url) => {
            let cache = RedisCache::connect(url, config.request_timeout).await?;
            info!("search cache backed by redis");
            Ok(CacheHandle::Redis(Arc::new(cache)))
        }
        None => {
            warn!("REALTY_REDIS_URL not set; search cache is local to this process");
            Ok(CacheHandle::Memory(Arc::new(MemoryCache::default())))
        }
    }
}

pub fn build_in_memory(config: AppConfig, store: Arc<InMemoryListingStore>) -> AppState {
    let cache = CacheHandle::Memory(Arc::new(MemoryCache::default()));
    assemble(config, store.clone(), store, cache, None)
}

pub fn assemble(
    config: AppConfig,
    store: Arc<dyn ListingStore>,
    writer: Arc<dyn ListingWriter>,
    cache: CacheHandle,
    db: Option<DbPool>,
) -> AppState {
    let policy = CachePolicy {
        search_ttl: config.search_cache_ttl,
        featured_ttl: config.featured_cache_ttl,
    };
    let listings = ListingSearchService::new(store, cache.backend(), policy);
    AppState {
        config: Arc::new(config),
        listings: Arc::new(listings),
        writer,
        cache,
        db,
    }
}
