use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::warn;

use crate::jobs::JobError;

const FAILURE_BACKOFF: Duration = Duration::from_secs(30);

/// Runs `job` every `period`, starting immediately. A failed run is logged
/// and followed by a short backoff; the loop itself never ends.
pub async fn run_interval<F, Fut>(
    name: &'static str,
    period: Duration,
    mut job: F,
) -> Result<(), JobError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), JobError>>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(err) = job().await {
            warn!(error = %err, job = name, "job execution failed");
            sleep(FAILURE_BACKOFF.min(period)).await;
        }
    }
}
