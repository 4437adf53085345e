use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::http::routes::listings::SearchResponse;
use crate::http::routes::ErrorBody;
use crate::state::AppState;
use realty_core::domain::draft::ListingDraft;
use realty_core::domain::filter::DEFAULT_PAGE_SIZE;
use realty_core::domain::listing::Listing;
use realty_core::error::CoreError;
use realty_infra::search::SearchError;
use realty_infra::store::StoreError;

pub const OWNER_HEADER: &str = "x-owner-id";

/// Acting owner, taken from the header set by the authenticating gateway in
/// front of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for OwnerId {
    type Rejection = OwnerListingsError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| OwnerId(value.to_string()))
            .ok_or(OwnerListingsError::MissingOwner)
    }
}

#[derive(Debug, Error)]
pub enum OwnerListingsError {
    #[error("owner identity required")]
    MissingOwner,
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    InvalidListing(#[from] CoreError),
    #[error("unknown ward {0}")]
    UnknownWard(Uuid),
    #[error("listing belongs to another owner")]
    Forbidden,
    #[error("listing not found")]
    NotFound,
    #[error("listing store unavailable: {0}")]
    Store(StoreError),
}

impl From<StoreError> for OwnerListingsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownWard(ward) => Self::UnknownWard(ward),
            other => Self::Store(other),
        }
    }
}

impl From<SearchError> for OwnerListingsError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidFilter(err) => Self::InvalidListing(err),
            SearchError::StoreUnavailable(err) => err.into(),
        }
    }
}

impl From<JsonRejection> for OwnerListingsError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for OwnerListingsError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for OwnerListingsError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            OwnerListingsError::MissingOwner => StatusCode::UNAUTHORIZED,
            OwnerListingsError::BadRequest(_)
            | OwnerListingsError::InvalidListing(_)
            | OwnerListingsError::UnknownWard(_) => StatusCode::BAD_REQUEST,
            OwnerListingsError::Forbidden => StatusCode::FORBIDDEN,
            OwnerListingsError::NotFound => StatusCode::NOT_FOUND,
            OwnerListingsError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OwnerPageParams {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

pub async fn create_listing(
    State(state): State<AppState>,
    owner: OwnerId,
    body: Result<Json<ListingDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Listing>), OwnerListingsError> {
    let Json(draft) = body?;
    let draft = draft.validate()?;
    let listing = state.writer.create(&owner.0, &draft, Utc::now()).await?;
    info!(id = %listing.id, owner = %owner.0, "listing created");
    state.listings.on_listing_created(listing.id).await;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn update_listing(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<Uuid>,
    body: Result<Json<ListingDraft>, JsonRejection>,
) -> Result<Json<Listing>, OwnerListingsError> {
    let Json(draft) = body?;
    let draft = draft.validate()?;
    let current = state
        .listings
        .get_listing(id)
        .await?
        .ok_or(OwnerListingsError::NotFound)?;
    if current.owner_id != owner.0 {
        return Err(OwnerListingsError::Forbidden);
    }
    let updated = state
        .writer
        .update(id, &draft)
        .await?
        .ok_or(OwnerListingsError::NotFound)?;
    info!(%id, owner = %owner.0, "listing updated");
    state.listings.on_listing_updated(id).await;
    Ok(Json(updated))
}

pub async fn my_listings(
    State(state): State<AppState>,
    owner: OwnerId,
    params: Result<Query<OwnerPageParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, OwnerListingsError> {
    let Query(params) = params?;
    let page = state
        .listings
        .owner_listings(
            &owner.0,
            params.page_number.unwrap_or(1),
            params.page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
        )
        .await?;
    Ok(Json(page.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use realty_core::domain::filter::SearchFilter;
    use realty_core::domain::listing::{ListingStatus, ListingType, PropertyType};
    use realty_infra::store::ListingStore;

    use super::*;
    use crate::state::testing::{listing, state_with};

    fn owner(name: &str) -> OwnerId {
        OwnerId(name.to_string())
    }

    fn draft(title: &str) -> ListingDraft {
        ListingDraft {
            title: title.to_string(),
            description: String::new(),
            address: "88 Dong Khoi".to_string(),
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Sale,
            price: 4_200_000_000,
            currency: "VND".to_string(),
            area: 70.0,
            bedrooms: Some(2),
            bathrooms: Some(2),
            ward_id: Uuid::from_u128(0x10),
            latitude: None,
            longitude: None,
            amenity_ids: Vec::new(),
            image_urls: Vec::new(),
        }
    }

    #[tokio::test]
    async fn owner_header_is_required() {
        let (mut parts, ()) = Request::builder()
            .uri("/v1/me/listings")
            .header(OWNER_HEADER, "  agent-7 ")
            .body(())
            .unwrap()
            .into_parts();
        let found = OwnerId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, owner("agent-7"));

        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        let err = OwnerId::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn created_listing_appears_in_cached_search() {
        let (state, _) = state_with([listing(1)], None);
        let before = state.listings.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(before.total_count, 1);

        let (status, Json(created)) = create_listing(
            State(state.clone()),
            owner("agent-9"),
            Ok(Json(draft("Riverside two-bed"))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.status, ListingStatus::Active);
        assert_eq!(created.district_name, "District 1");

        let after = state.listings.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(after.total_count, 2);
        assert!(after.items.iter().any(|item| item.id == created.id));
    }

    #[tokio::test]
    async fn invalid_drafts_and_unknown_wards_are_bad_requests() {
        let (state, _) = state_with([listing(1)], None);
        let err = create_listing(State(state.clone()), owner("agent-9"), Ok(Json(draft("  "))))
            .await
            .unwrap_err();
        assert!(matches!(err, OwnerListingsError::InvalidListing(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let mut elsewhere = draft("Far away");
        elsewhere.ward_id = Uuid::from_u128(0x99);
        let err = create_listing(State(state), owner("agent-9"), Ok(Json(elsewhere)))
            .await
            .unwrap_err();
        assert!(matches!(err, OwnerListingsError::UnknownWard(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_the_owner_may_update_and_search_sees_the_change() {
        let (state, store) = state_with([listing(1)], None);
        let id = Uuid::from_u128(1);
        state.listings.search(&SearchFilter::default()).await.unwrap();

        let err = update_listing(
            State(state.clone()),
            owner("intruder"),
            Path(id),
            Ok(Json(draft("Hijacked"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OwnerListingsError::Forbidden));
        assert_eq!(store.get_by_id(id).await.unwrap().unwrap().title, "Townhouse 1");

        let Json(updated) = update_listing(
            State(state.clone()),
            owner("agent-7"),
            Path(id),
            Ok(Json(draft("Renovated townhouse"))),
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Renovated townhouse");

        let after = state.listings.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(after.items[0].title, "Renovated townhouse");

        let err = update_listing(
            State(state),
            owner("agent-7"),
            Path(Uuid::from_u128(42)),
            Ok(Json(draft("Ghost"))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OwnerListingsError::NotFound));
    }

    #[tokio::test]
    async fn my_listings_show_every_status_of_the_caller_only() {
        let mut paused = listing(2);
        paused.status = ListingStatus::Suspended;
        let mut foreign = listing(3);
        foreign.owner_id = "agent-8".to_string();
        let (state, _) = state_with([listing(1), paused, foreign], None);

        let Json(page) = my_listings(
            State(state),
            owner("agent-7"),
            Ok(Query(OwnerPageParams::default())),
        )
        .await
        .unwrap();
        assert_eq!(page.total_count, 2);
        let ids: Vec<_> = page.items.iter().map(|item| item.id.as_u128()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(page.items[0].status, ListingStatus::Suspended);
    }
}
