use std::sync::Arc;

use crate::config::AppConfig;
use realty_infra::cache::{CacheBackend, MemoryCache, RedisCache};
use realty_infra::db::DbPool;
use realty_infra::search::ListingSearchService;
use realty_infra::store::ListingWriter;

/// The cache the search service writes through. Only the in-process variant
/// needs the purge job; Redis expires keys itself.
#[derive(Clone)]
pub enum CacheHandle {
    Memory(Arc<MemoryCache>),
    Redis(Arc<RedisCache>),
}

impl CacheHandle {
    pub fn backend(&self) -> Arc<dyn CacheBackend> {
        match self {
            CacheHandle::Memory(cache) => cache.clone(),
            CacheHandle::Redis(cache) => cache.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CacheHandle::Memory(_) => "memory",
            CacheHandle::Redis(_) => "redis",
        }
    }

    pub fn local(&self) -> Option<&Arc<MemoryCache>> {
        match self {
            CacheHandle::Memory(cache) => Some(cache),
            CacheHandle::Redis(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub listings: Arc<ListingSearchService>,
    pub writer: Arc<dyn ListingWriter>,
    pub cache: CacheHandle,
    pub db: Option<DbPool>,
}
