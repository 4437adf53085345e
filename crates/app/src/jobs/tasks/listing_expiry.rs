use chrono::Utc;
use tracing::debug;

use crate::jobs::JobError;
use crate::state::AppState;

/// Expires active listings past their end date, then drops cached pages so
/// they stop appearing in search.
pub async fn run(state: &AppState) -> Result<usize, JobError> {
    let expired = state.writer.expire_due(Utc::now()).await?;
    debug!(count = expired.len(), "expiry sweep finished");
    state.listings.on_listings_expired(&expired).await;
    Ok(expired.len())
}
