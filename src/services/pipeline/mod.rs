pub mod fix;
pub mod handle;
pub mod poll;

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::domain::error::AppError;
use crate::services::job_service::JobService;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub buffer_size: usize,
    pub handler_count: usize,
    pub poll_delay: Duration,
    pub fix_delay: Duration,
    pub fix_proc_timeout: Duration,
    pub shutdown_timeout: Duration,
}

/// Terminal state of the pipeline's supervised task group, mirroring the
/// original's `notify chan error`.
#[derive(Debug, Clone)]
enum Outcome {
    Cancelled,
    Failed(String),
}

/// Supervises the Poll/Handle/Fix stages as a structured-concurrency
/// group. Rust analogue of `errgroup.WithContext` built on
/// `tokio::task::JoinSet` + `tokio_util::sync::CancellationToken`.
pub struct Pipeline {
    cancel: CancellationToken,
    trigger: Arc<Notify>,
    outcome: watch::Receiver<Option<Outcome>>,
    shutdown_timeout: Duration,
}

impl Pipeline {
    pub fn start(
        pool: PgPool,
        job_service: JobService,
        trigger: Arc<Notify>,
        config: PipelineConfig,
    ) -> Arc<Pipeline> {
        let cancel = CancellationToken::new();
        let (jobs_tx, jobs_rx) = mpsc::channel(config.buffer_size);
        let (outcome_tx, outcome_rx) = watch::channel(None);

        let mut stages = JoinSet::new();
        stages.spawn(fix::run(
            pool.clone(),
            config.fix_delay,
            config.fix_proc_timeout,
            cancel.clone(),
        ));
        stages.spawn(poll::run(
            pool,
            config.buffer_size,
            config.poll_delay,
            jobs_tx,
            trigger.clone(),
            cancel.clone(),
        ));
        stages.spawn(handle::run(
            job_service,
            config.handler_count,
            jobs_rx,
            cancel.clone(),
        ));

        let supervisor_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut outcome = Outcome::Cancelled;
            while let Some(joined) = stages.join_next().await {
                // Any stage returning at all — error or not — means the
                // group is no longer healthy: the three stages only return
                // on cancellation or a fatal error, never on their own.
                // Cancel the siblings immediately so the host's `Notify()`
                // fires promptly instead of waiting for them to loop
                // forever.
                supervisor_cancel.cancel();
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => outcome = Outcome::Failed(e.to_string()),
                    Err(join_err) => outcome = Outcome::Failed(join_err.to_string()),
                }
            }
            let _ = outcome_tx.send(Some(outcome));
        });

        Arc::new(Pipeline {
            cancel,
            trigger,
            outcome: outcome_rx,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Wakes the Poll stage, coalescing multiple calls into one wakeup.
    /// Must be invoked strictly after the transaction that created the
    /// job has committed.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Cancels all stages, waits for the group to exit or
    /// `shutdown_timeout` to elapse, and translates a cancellation-caused
    /// exit into success.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.cancel.cancel();

        let mut outcome = self.outcome.clone();
        let wait = async {
            while outcome.borrow().is_none() {
                if outcome.changed().await.is_err() {
                    break;
                }
            }
        };

        match tokio::time::timeout(self.shutdown_timeout, wait).await {
            Err(_) => Err(AppError::internal("pipeline shutdown timed out")),
            Ok(()) => match outcome.borrow().clone() {
                Some(Outcome::Failed(msg)) => Err(AppError::internal(msg)),
                Some(Outcome::Cancelled) | None => Ok(()),
            },
        }
    }
}
