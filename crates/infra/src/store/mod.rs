pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use realty_core::domain::draft::ValidatedDraft;
use realty_core::domain::listing::{Listing, ListingStatus};
use thiserror::Error;
use uuid::Uuid;

use crate::search::translator::FetchPlan;

pub use memory::InMemoryListingStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("invalid stored value: {0}")]
    Decode(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unknown ward {0}")]
    UnknownWard(Uuid),
}

/// A page of listings plus the number of listings matching the plan overall.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub items: Vec<Listing>,
    pub total_count: u64,
}

/// Read side of the authoritative listing store.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn query(&self, plan: &FetchPlan) -> Result<ListingPage, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;

    /// Every live listing of one owner regardless of status, newest first.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ListingPage, StoreError>;
}

/// Authoritative writes. Callers notify the search service after each one
/// returns.
#[async_trait]
pub trait ListingWriter: Send + Sync {
    /// Stores a new active listing ending after the default lifetime.
    async fn create(
        &self,
        owner_id: &str,
        draft: &ValidatedDraft,
        now: DateTime<Utc>,
    ) -> Result<Listing, StoreError>;

    /// Replaces the content of a live listing. Status, owner, featured flag
    /// and view count are kept. Returns `None` when no live listing matches.
    async fn update(&self, id: Uuid, draft: &ValidatedDraft) -> Result<Option<Listing>, StoreError>;

    async fn increment_view_count(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Returns `false` when no live listing has this id.
    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<bool, StoreError>;

    /// Flags the listing deleted. Returns `false` when it was missing or
    /// already deleted.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Moves active listings whose end date is before `now` to expired.
    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError>;
}
