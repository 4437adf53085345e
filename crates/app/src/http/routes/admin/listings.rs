use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::http::routes::ErrorBody;
use crate::state::AppState;
use realty_core::domain::listing::ListingStatus;
use realty_core::error::CoreError;
use realty_infra::store::StoreError;

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusChanged {
    pub id: Uuid,
    pub status: ListingStatus,
}

#[derive(Debug, Error)]
pub enum AdminListingsError {
    #[error("invalid status: {0}")]
    InvalidStatus(#[from] CoreError),
    #[error("listing not found")]
    NotFound,
    #[error("listing store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AdminListingsError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AdminListingsError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            AdminListingsError::NotFound => StatusCode::NOT_FOUND,
            AdminListingsError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Writes run to completion before the cache hook, so they are not put under
/// the request deadline.
pub async fn patch_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> Result<Json<StatusChanged>, AdminListingsError> {
    let status: ListingStatus = change.status.parse()?;
    if !state.writer.set_status(id, status).await? {
        return Err(AdminListingsError::NotFound);
    }
    info!(%id, %status, "listing status set by admin");
    state.listings.on_status_changed(id, status).await;
    Ok(Json(StatusChanged { id, status }))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AdminListingsError> {
    if !state.writer.soft_delete(id).await? {
        return Err(AdminListingsError::NotFound);
    }
    info!(%id, "listing soft-deleted by admin");
    state.listings.on_listing_deleted(id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use realty_core::domain::filter::SearchFilter;

    use super::*;
    use crate::state::testing::{listing, state_with};

    #[tokio::test]
    async fn status_change_drops_listing_from_cached_search() {
        let (state, _) = state_with([listing(1), listing(2)], None);
        let before = state.listings.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(before.total_count, 2);

        let Json(changed) = patch_status(
            State(state.clone()),
            Path(Uuid::from_u128(1)),
            Json(StatusChange {
                status: "sold".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(changed.status, ListingStatus::Sold);

        let after = state.listings.search(&SearchFilter::default()).await.unwrap();
        assert_eq!(after.total_count, 1);
        assert_eq!(after.items[0].id, Uuid::from_u128(2));
    }

    #[tokio::test]
    async fn unknown_status_is_rejected() {
        let (state, _) = state_with([listing(1)], None);
        let err = patch_status(
            State(state),
            Path(Uuid::from_u128(1)),
            Json(StatusChange {
                status: "archived".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AdminListingsError::InvalidStatus(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_is_not_repeatable() {
        let (state, store) = state_with([listing(1)], None);
        let id = Uuid::from_u128(1);
        let status = delete_listing(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(store.len().await, 1);
        assert!(state.listings.get_listing(id).await.unwrap().is_none());

        let err = delete_listing(State(state), Path(id)).await.unwrap_err();
        assert!(matches!(err, AdminListingsError::NotFound));
    }
}
