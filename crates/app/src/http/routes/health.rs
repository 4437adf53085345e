use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;
use realty_infra::cache::CacheBackend;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub modules: HealthModules,
}

#[derive(Debug, Serialize)]
pub struct HealthModules {
    pub database: DatabaseStatus,
    pub cache: CacheStatus,
    pub admin: AdminStatus,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub configured: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub backend: &'static str,
    pub reachable: bool,
    /// Only known for the in-process cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
    pub search_ttl_secs: u64,
    pub featured_ttl_secs: u64,
}

const HEALTH_KEY: &str = "health_check";

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub configured: bool,
}

/// Cache trouble marks the service degraded; search still works without it.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let policy = state.listings.policy();
    let reachable = match state.cache.backend().exists(HEALTH_KEY).await {
        Ok(_) => true,
        Err(err) => {
            warn!(error = %err, cache = state.cache.kind(), "cache health check failed");
            false
        }
    };
    let entries = match state.cache.local() {
        Some(cache) => Some(cache.len().await),
        None => None,
    };
    Json(HealthResponse {
        status: if reachable { "ok" } else { "degraded" },
        modules: HealthModules {
            database: DatabaseStatus {
                configured: state.db.is_some(),
            },
            cache: CacheStatus {
                backend: state.cache.kind(),
                reachable,
                entries,
                search_ttl_secs: policy.search_ttl.as_secs(),
                featured_ttl_secs: policy.featured_ttl.as_secs(),
            },
            admin: AdminStatus {
                configured: state.config.admin_token.is_some(),
            },
        },
    })
}
