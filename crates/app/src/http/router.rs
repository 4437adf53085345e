use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::http::middleware::{admin_auth, search_query_limit};
use crate::http::routes::owner_listings::OWNER_HEADER;
use crate::http::routes::{admin, health, listings, owner_listings};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = build_cors(&state.config.cors_allow_origins);
    let admin_routes = Router::new()
        .route(
            "/v1/admin/listings/{id}/status",
            patch(admin::listings::patch_status),
        )
        .route(
            "/v1/admin/listings/{id}",
            delete(admin::listings::delete_listing),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth::require_admin,
        ));
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route(
            "/v1/listings/search",
            get(listings::search)
                .layer(middleware::from_fn(search_query_limit::enforce_search_query_length)),
        )
        .route("/v1/listings/featured", get(listings::featured))
        .route("/v1/listings", post(owner_listings::create_listing))
        .route(
            "/v1/listings/{id}",
            get(listings::detail).put(owner_listings::update_listing),
        )
        .route("/v1/me/listings", get(owner_listings::my_listings))
        .merge(admin_routes)
        .with_state(state);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router
}

fn build_cors(allowed: &[String]) -> Option<CorsLayer> {
    let allow_any = allowed.iter().any(|origin| is_wildcard_origin(origin));
    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter(|origin| !is_wildcard_origin(origin))
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin ignored");
                None
            }
        })
        .collect();
    if !should_enable_cors(allow_any, &origins) {
        return None;
    }

    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]);
    if allow_any {
        Some(cors.allow_origin(Any).allow_headers(Any))
    } else {
        Some(
            cors.allow_origin(AllowOrigin::list(origins))
                .allow_headers([
                    CONTENT_TYPE,
                    AUTHORIZATION,
                    HeaderName::from_static(OWNER_HEADER),
                ]),
        )
    }
}

fn is_wildcard_origin(origin: &str) -> bool {
    origin.trim() == "*"
}

fn should_enable_cors(allow_any: bool, origins: &[HeaderValue]) -> bool {
    allow_any || !origins.is_empty()
}
