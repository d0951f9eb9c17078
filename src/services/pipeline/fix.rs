use std::time::Duration;

use sqlx::PgPool;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::error::AppError;
use crate::infra::postgres::job_repo;

/// Periodically rescues jobs stuck in PROCESSING (leased but never
/// updated). `tokio::time::interval` already provides the non-drifting,
/// non-overlapping tick semantics the fixed schedule needs: each tick
/// waits for the next multiple of `fix_delay`, and a slow iteration
/// delays the next tick rather than firing twice back to back.
pub async fn run(
    pool: PgPool,
    fix_delay: Duration,
    fix_proc_timeout: Duration,
    cancel: CancellationToken,
) -> Result<(), AppError> {
    let mut ticker = tokio::time::interval(fix_delay);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {
                tracing::debug!("fix stage cancelled");
                return Ok(());
            }
        }

        match job_repo::rescue_stuck(&pool, fix_proc_timeout).await {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "rescued stuck jobs"),
            Err(e) => tracing::error!(error = %e, "fix processing failed"),
        }
    }
}
