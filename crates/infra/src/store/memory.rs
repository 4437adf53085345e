use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use realty_core::domain::draft::{ValidatedDraft, LISTING_LIFETIME_DAYS};
use realty_core::domain::listing::{Listing, ListingStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ListingPage, ListingStore, ListingWriter, StoreError};
use crate::search::translator::FetchPlan;

/// Listing store held in process memory. Evaluates fetch plans directly.
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    listings: RwLock<HashMap<Uuid, Listing>>,
}

impl InMemoryListingStore {
    pub fn with_listings<I>(listings: I) -> Self
    where
        I: IntoIterator<Item = Listing>,
    {
        let listings = listings
            .into_iter()
            .map(|listing| (listing.id, listing))
            .collect();
        Self {
            listings: RwLock::new(listings),
        }
    }

    /// Returns `false` if a listing with the same id already exists.
    pub async fn insert(&self, listing: Listing) -> bool {
        let mut listings = self.listings.write().await;
        if listings.contains_key(&listing.id) {
            return false;
        }
        listings.insert(listing.id, listing);
        true
    }

    /// Returns `false` if there was nothing to replace.
    pub async fn replace(&self, listing: Listing) -> bool {
        let mut listings = self.listings.write().await;
        match listings.get_mut(&listing.id) {
            Some(existing) => {
                *existing = listing;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }
}

/// Wards are known through the listings that reference them.
fn known_ward<'a>(
    listings: &'a HashMap<Uuid, Listing>,
    ward_id: Uuid,
) -> Result<&'a Listing, StoreError> {
    listings
        .values()
        .find(|listing| listing.ward_id == ward_id)
        .ok_or(StoreError::UnknownWard(ward_id))
}

fn apply_draft(listing: &mut Listing, draft: &ValidatedDraft, ward: &Listing) {
    listing.title = draft.title.clone();
    listing.description = draft.description.clone();
    listing.address = draft.address.clone();
    listing.property_type = draft.property_type;
    listing.listing_type = draft.listing_type;
    listing.price = draft.price;
    listing.currency = draft.currency.clone();
    listing.area = draft.area;
    listing.bedrooms = draft.bedrooms;
    listing.bathrooms = draft.bathrooms;
    listing.ward_id = ward.ward_id;
    listing.ward_name = ward.ward_name.clone();
    listing.district_id = ward.district_id;
    listing.district_name = ward.district_name.clone();
    listing.province_id = ward.province_id;
    listing.province_name = ward.province_name.clone();
    listing.location = draft.location;
    listing.amenity_ids = draft.amenity_ids.clone();
    listing.primary_image_url = draft.image_urls.first().cloned();
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn query(&self, plan: &FetchPlan) -> Result<ListingPage, StoreError> {
        let listings = self.listings.read().await;
        let mut matched: Vec<&Listing> = listings
            .values()
            .filter(|listing| plan.matches(listing))
            .collect();
        matched.sort_by(|a, b| plan.sort.compare(a, b));
        let total_count = matched.len() as u64;
        let offset = usize::try_from(plan.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(plan.limit).unwrap_or(usize::MAX);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(ListingPage { items, total_count })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings.get(&id).filter(|listing| !listing.is_deleted).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<ListingPage, StoreError> {
        let listings = self.listings.read().await;
        let mut owned: Vec<&Listing> = listings
            .values()
            .filter(|listing| listing.owner_id == owner_id && !listing.is_deleted)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total_count = owned.len() as u64;
        let items = owned
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(ListingPage { items, total_count })
    }
}

#[async_trait]
impl ListingWriter for InMemoryListingStore {
    async fn create(
        &self,
        owner_id: &str,
        draft: &ValidatedDraft,
        now: DateTime<Utc>,
    ) -> Result<Listing, StoreError> {
        let mut listings = self.listings.write().await;
        let ward = known_ward(&listings, draft.ward_id)?.clone();
        let mut listing = Listing {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            status: ListingStatus::Active,
            is_featured: false,
            view_count: 0,
            created_at: now,
            updated_at: now,
            end_date: Some(now + Duration::days(LISTING_LIFETIME_DAYS)),
            is_deleted: false,
            deleted_at: None,
            ..ward.clone()
        };
        apply_draft(&mut listing, draft, &ward);
        listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn update(&self, id: Uuid, draft: &ValidatedDraft) -> Result<Option<Listing>, StoreError> {
        let mut listings = self.listings.write().await;
        if !listings.get(&id).is_some_and(|listing| !listing.is_deleted) {
            return Ok(None);
        }
        let ward = known_ward(&listings, draft.ward_id)?.clone();
        let Some(listing) = listings.get_mut(&id) else {
            return Ok(None);
        };
        apply_draft(listing, draft, &ward);
        listing.updated_at = Utc::now();
        Ok(Some(listing.clone()))
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut listings = self.listings.write().await;
        let Some(listing) = listings.get_mut(&id).filter(|listing| !listing.is_deleted) else {
            return Ok(false);
        };
        listing.view_count = listing.view_count.saturating_add(1);
        Ok(true)
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<bool, StoreError> {
        let mut listings = self.listings.write().await;
        let Some(listing) = listings.get_mut(&id).filter(|listing| !listing.is_deleted) else {
            return Ok(false);
        };
        listing.status = status;
        listing.updated_at = Utc::now();
        Ok(true)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut listings = self.listings.write().await;
        let Some(listing) = listings.get_mut(&id).filter(|listing| !listing.is_deleted) else {
            return Ok(false);
        };
        let now = Utc::now();
        listing.is_deleted = true;
        listing.deleted_at = Some(now);
        listing.updated_at = now;
        Ok(true)
    }

    async fn expire_due(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let mut listings = self.listings.write().await;
        let mut expired = Vec::new();
        for listing in listings.values_mut() {
            let due = listing.end_date.is_some_and(|end| end < now);
            if due && listing.status == ListingStatus::Active && !listing.is_deleted {
                listing.status = ListingStatus::Expired;
                listing.updated_at = now;
                expired.push(listing.id);
            }
        }
        expired.sort_unstable();
        Ok(expired)
    }
}
