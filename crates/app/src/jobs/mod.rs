pub mod scheduler;
pub mod tasks;

use thiserror::Error;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("listing store error: {0}")]
    Store(#[from] realty_infra::store::StoreError),
}

pub async fn start(state: AppState) -> Result<(), JobError> {
    let expiry_state = state.clone();
    let expiry_job = scheduler::run_interval(
        "listing_expiry",
        state.config.expiry_interval,
        move || {
            let state = expiry_state.clone();
            async move {
                let expired = tasks::listing_expiry::run(&state).await?;
                if expired > 0 {
                    info!(expired, "listing expiry sweep complete");
                }
                Ok::<(), JobError>(())
            }
        },
    );

    if state.db.is_none() {
        warn!("db not configured; expiry sweep runs against the in-memory store");
    }

    let Some(local_cache) = state.cache.local().cloned() else {
        info!(cache = state.cache.kind(), "cache expires keys itself; purge job not started");
        return expiry_job.await;
    };
    let purge_job = scheduler::run_interval(
        "cache_purge",
        state.config.cache_purge_interval,
        move || {
            let cache = local_cache.clone();
            async move {
                tasks::cache_purge::run(&cache).await;
                Ok(())
            }
        },
    );
    tokio::try_join!(expiry_job, purge_job)?;
    Ok(())
}
