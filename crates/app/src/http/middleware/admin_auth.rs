use axum::body::Body;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::warn;

use crate::http::routes::ErrorBody;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("admin auth not configured")]
    MissingConfig,
    #[error("admin token required")]
    MissingToken,
    #[error("admin token invalid")]
    InvalidToken,
}

pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AdminAuthError> {
    let expected = state
        .config
        .admin_token
        .as_deref()
        .ok_or(AdminAuthError::MissingConfig)?;
    let presented = extract_bearer_token(&request).ok_or(AdminAuthError::MissingToken)?;
    if !tokens_match(expected, presented) {
        warn!(path = %request.uri().path(), "rejected admin request with bad token");
        return Err(AdminAuthError::InvalidToken);
    }
    Ok(next.run(request).await)
}

fn extract_bearer_token<B>(request: &Request<B>) -> Option<&str> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let value = header.trim().strip_prefix("Bearer ")?.trim();
    (!value.is_empty()).then_some(value)
}

/// Compares without short-circuiting on the first differing byte.
fn tokens_match(expected: &str, presented: &str) -> bool {
    let (expected, presented) = (expected.as_bytes(), presented.as_bytes());
    if expected.len() != presented.len() {
        return false;
    }
    expected
        .iter()
        .zip(presented)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AdminAuthError::MissingConfig => StatusCode::SERVICE_UNAVAILABLE,
            AdminAuthError::MissingToken | AdminAuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
