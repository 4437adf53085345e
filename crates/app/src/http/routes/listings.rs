use std::future::Future;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::http::routes::ErrorBody;
use crate::state::AppState;
use realty_core::domain::filter::{SearchFilter, SortBy};
use realty_core::domain::listing::{Listing, ListingSummary};
use realty_core::domain::page::PaginatedResult;
use realty_core::error::CoreError;
use realty_infra::search::SearchError;

const DEFAULT_FEATURED_COUNT: u32 = 10;

/// Query string for `/v1/listings/search`. Enum-valued fields stay textual
/// so bad values surface as filter errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub listing_type: Option<String>,
    pub property_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub ward_id: Option<Uuid>,
    pub district_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub amenity_ids: Option<String>,
    pub is_featured: Option<bool>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_descending: Option<bool>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

impl SearchParams {
    pub fn into_filter(self) -> Result<SearchFilter, CoreError> {
        let defaults = SearchFilter::default();
        Ok(SearchFilter {
            keyword: self.keyword,
            listing_type: self.listing_type.as_deref().map(str::parse).transpose()?,
            property_type: self.property_type.as_deref().map(str::parse).transpose()?,
            min_price: self.min_price,
            max_price: self.max_price,
            min_area: self.min_area,
            max_area: self.max_area,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            ward_id: self.ward_id,
            district_id: self.district_id,
            province_id: self.province_id,
            amenity_ids: parse_id_list(self.amenity_ids.as_deref())?,
            is_featured: self.is_featured,
            latitude: self.latitude,
            longitude: self.longitude,
            radius_km: self.radius_km,
            sort_by: self
                .sort_by
                .as_deref()
                .map(str::parse::<SortBy>)
                .transpose()?
                .unwrap_or(defaults.sort_by),
            sort_descending: self.sort_descending.unwrap_or(defaults.sort_descending),
            page_number: self.page_number.unwrap_or(defaults.page_number),
            page_size: self.page_size.unwrap_or(defaults.page_size),
        })
    }
}

fn parse_id_list(raw: Option<&str>) -> Result<Vec<Uuid>, CoreError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part).map_err(|_| CoreError::InvalidEnum("amenity id", part.to_string()))
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<ListingSummary>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl From<PaginatedResult<ListingSummary>> for SearchResponse {
    fn from(page: PaginatedResult<ListingSummary>) -> Self {
        let total_pages = page.total_pages();
        let has_previous_page = page.has_previous_page();
        let has_next_page = page.has_next_page();
        Self {
            items: page.items,
            page_number: page.page_number,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages,
            has_previous_page,
            has_next_page,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeaturedParams {
    pub count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct FeaturedResponse {
    pub items: Vec<ListingSummary>,
}

#[derive(Debug, Error)]
pub enum ListingsApiError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("invalid query string: {0}")]
    BadQuery(String),
    #[error("listing not found")]
    NotFound,
    #[error("request timed out")]
    Timeout,
}

impl From<QueryRejection> for ListingsApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadQuery(rejection.body_text())
    }
}

impl From<CoreError> for ListingsApiError {
    fn from(err: CoreError) -> Self {
        Self::Search(SearchError::InvalidFilter(err))
    }
}

impl IntoResponse for ListingsApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ListingsApiError::Search(SearchError::InvalidFilter(_))
            | ListingsApiError::BadQuery(_) => StatusCode::BAD_REQUEST,
            ListingsApiError::Search(SearchError::StoreUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ListingsApiError::NotFound => StatusCode::NOT_FOUND,
            ListingsApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Runs `work` under the configured request timeout. Expiry drops the
/// future, cancelling any store or cache call still in flight.
async fn within_deadline<T, F>(state: &AppState, work: F) -> Result<T, ListingsApiError>
where
    F: Future<Output = Result<T, SearchError>>,
{
    match tokio::time::timeout(state.config.request_timeout, work).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ListingsApiError::Timeout),
    }
}

/// Malformed query strings come back as JSON 400s like every other filter
/// error, not axum's plain-text rejection.
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ListingsApiError> {
    let Query(params) = params?;
    let filter = params.into_filter()?;
    debug!(?filter, "listing search");
    let page = within_deadline(&state, state.listings.search(&filter)).await?;
    Ok(Json(page.into()))
}

pub async fn featured(
    State(state): State<AppState>,
    params: Result<Query<FeaturedParams>, QueryRejection>,
) -> Result<Json<FeaturedResponse>, ListingsApiError> {
    let Query(params) = params?;
    let count = params.count.unwrap_or(DEFAULT_FEATURED_COUNT);
    let items = within_deadline(&state, state.listings.get_featured(count)).await?;
    Ok(Json(FeaturedResponse { items }))
}

/// Each successful read bumps the view count. A failed bump is logged and
/// does not fail the read; search caches are left alone.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Listing>, ListingsApiError> {
    let listing = within_deadline(&state, state.listings.get_listing(id))
        .await?
        .ok_or(ListingsApiError::NotFound)?;
    if let Err(err) = state.writer.increment_view_count(id).await {
        warn!(error = %err, %id, "view count not recorded");
    }
    Ok(Json(listing))
}
