use std::sync::Arc;
use std::time::Duration;

use realty_core::domain::filter::{
    clamp_page_number, clamp_page_size, SearchFilter, ValidatedFilter,
};
use realty_core::domain::listing::{Listing, ListingStatus, ListingSummary};
use realty_core::domain::page::PaginatedResult;
use realty_core::error::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheBackend, CacheError};
use crate::search::translator::{featured_plan, translate, FetchPlan};
use crate::store::{ListingStore, StoreError};

pub const SEARCH_CACHE_PREFIX: &str = "listings_search_";
pub const FEATURED_CACHE_PREFIX: &str = "featured_listings_";
pub const MAX_FEATURED_COUNT: u32 = 100;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] CoreError),
    #[error("listing store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub search_ttl: Duration,
    pub featured_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            search_ttl: Duration::from_secs(5 * 60),
            featured_ttl: Duration::from_secs(15 * 60),
        }
    }
}

pub fn search_cache_key(filter: &ValidatedFilter) -> String {
    let digest = Sha256::digest(filter.canonical_key().as_bytes());
    format!("{SEARCH_CACHE_PREFIX}{}", hex::encode(digest))
}

pub fn featured_cache_key(count: u32) -> String {
    format!("{FEATURED_CACHE_PREFIX}{count}")
}

/// Cached listing search. The cache only ever saves store round trips; a
/// failing cache backend degrades latency, never results.
pub struct ListingSearchService {
    store: Arc<dyn ListingStore>,
    cache: Arc<dyn CacheBackend>,
    policy: CachePolicy,
}

impl ListingSearchService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        cache: Arc<dyn CacheBackend>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            store,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub async fn search(
        &self,
        filter: &SearchFilter,
    ) -> Result<PaginatedResult<ListingSummary>, SearchError> {
        let filter = filter.validate()?;
        let key = search_cache_key(&filter);
        if let Some(cached) = self.read_cached(&key).await {
            debug!(%key, "search cache hit");
            return Ok(cached);
        }

        let plan = translate(&filter);
        let (items, total_count) = self.fetch(&plan).await?;
        let result =
            PaginatedResult::new(items, total_count, filter.page_number, filter.page_size);
        debug!(%key, total = result.total_count, "search served from store");
        self.write_cached(&key, &result, self.policy.search_ttl).await;
        Ok(result)
    }

    pub async fn get_featured(&self, count: u32) -> Result<Vec<ListingSummary>, SearchError> {
        let count = count.clamp(1, MAX_FEATURED_COUNT);
        let key = featured_cache_key(count);
        if let Some(cached) = self.read_cached(&key).await {
            debug!(%key, "featured cache hit");
            return Ok(cached);
        }

        let (items, _) = self.fetch(&featured_plan(count)).await?;
        self.write_cached(&key, &items, self.policy.featured_ttl).await;
        Ok(items)
    }

    /// Detail lookup. Not cached; soft-deleted listings read as absent.
    pub async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, SearchError> {
        let listing = self.store.get_by_id(id).await?;
        Ok(listing.filter(|listing| !listing.is_deleted))
    }

    /// One owner's listings in every status. Not cached: owners expect their
    /// own edits to show immediately.
    pub async fn owner_listings(
        &self,
        owner_id: &str,
        page_number: i64,
        page_size: i64,
    ) -> Result<PaginatedResult<ListingSummary>, SearchError> {
        let page_number = clamp_page_number(page_number);
        let page_size = clamp_page_size(page_size);
        let offset = u64::from(page_number - 1) * u64::from(page_size);
        let page = self
            .store
            .list_by_owner(owner_id, offset, u64::from(page_size))
            .await?;
        let items = page.items.iter().map(ListingSummary::from).collect();
        Ok(PaginatedResult::new(items, page.total_count, page_number, page_size))
    }

    pub async fn on_listing_created(&self, id: Uuid) {
        debug!(%id, "listing created");
        self.invalidate_all().await;
    }

    pub async fn on_listing_updated(&self, id: Uuid) {
        debug!(%id, "listing updated");
        self.invalidate_all().await;
    }

    pub async fn on_status_changed(&self, id: Uuid, status: ListingStatus) {
        debug!(%id, %status, "listing status changed");
        self.invalidate_all().await;
    }

    pub async fn on_listing_deleted(&self, id: Uuid) {
        debug!(%id, "listing deleted");
        self.invalidate_all().await;
    }

    /// Bulk variant of [`Self::on_status_changed`] for the expiration sweep.
    pub async fn on_listings_expired(&self, ids: &[Uuid]) {
        if ids.is_empty() {
            return;
        }
        info!(count = ids.len(), "listings expired");
        self.invalidate_all().await;
    }

    async fn fetch(&self, plan: &FetchPlan) -> Result<(Vec<ListingSummary>, u64), StoreError> {
        let page = self.store.query(plan).await?;
        let items = page.items.iter().map(ListingSummary::from).collect();
        Ok((items, page.total_count))
    }

    async fn invalidate_all(&self) {
        for prefix in [SEARCH_CACHE_PREFIX, FEATURED_CACHE_PREFIX] {
            match self.cache.invalidate_by_prefix(prefix).await {
                Ok(removed) => debug!(prefix, removed, "cache prefix invalidated"),
                Err(err) => warn!(error = %err, prefix, "cache invalidation failed"),
            }
        }
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, %key, "cache read failed; using store");
                return None;
            }
        };
        match decode(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, %key, "cached payload unreadable; treating as miss");
                None
            }
        }
    }

    async fn write_cached<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let stored = match encode(value) {
            Ok(payload) => self.cache.set(key, &payload, ttl).await,
            Err(err) => Err(err),
        };
        if let Err(err) = stored {
            warn!(error = %err, %key, "cache write failed");
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, CacheError> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, CacheError> {
    Ok(serde_json::from_str(raw)?)
}
