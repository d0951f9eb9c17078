use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use crate::domain::error::AppError;
use crate::domain::job::Job;
use crate::infra::postgres::job_repo;

/// Leases due jobs and forwards them to the Handle stage. Busy-loops while
/// jobs are available; backs off to `poll_delay` (or an earlier explicit
/// `trigger`) once the queue runs dry. Exits and closes `output` on the
/// first cancellation seen, at any point in the loop — a prior variant of
/// this stage only broke its inner distribution loop on cancellation,
/// leaving the outer loop spinning.
pub async fn run(
    pool: PgPool,
    buffer_size: usize,
    poll_delay: Duration,
    output: mpsc::Sender<Job>,
    trigger: Arc<Notify>,
    cancel: CancellationToken,
) -> Result<(), AppError> {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        match job_repo::lease_due(&pool, buffer_size as i64).await {
            Ok(jobs) => {
                tracing::debug!(job_count = jobs.len(), "jobs fetched");
                for job in jobs {
                    tokio::select! {
                        res = output.send(job) => {
                            if res.is_err() {
                                tracing::debug!("handle channel closed");
                                return Ok(());
                            }
                        }
                        _ = cancel.cancelled() => {
                            tracing::debug!("cancelled while distributing jobs");
                            return Ok(());
                        }
                    }
                }
            }
            Err(AppError::NotFound(_)) => {
                tracing::debug!("no jobs fetched");
                if !back_off(poll_delay, &trigger, &cancel).await {
                    return Ok(());
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch jobs");
                if !back_off(poll_delay, &trigger, &cancel).await {
                    return Ok(());
                }
            }
        }
    }

    tracing::debug!("jobs poll shutdown");
    Ok(())
}

/// Waits for `poll_delay`, an explicit trigger, or cancellation. Returns
/// `false` on cancellation so the caller can exit immediately.
async fn back_off(poll_delay: Duration, trigger: &Notify, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(poll_delay) => true,
        _ = trigger.notified() => true,
        _ = cancel.cancelled() => false,
    }
}
