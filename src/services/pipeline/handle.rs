use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::domain::error::AppError;
use crate::domain::job::Job;
use crate::services::job_service::JobService;

/// Spawns `handler_count` workers draining a shared mpsc receiver. Each
/// worker runs a job through `JobService::handle` behind a shared
/// reader-writer pause gate: the common case takes a read lock, a
/// rate-limited worker takes a write lock for the duration of its sleep,
/// which blocks every other worker's next read attempt — one sleep of
/// `retry_after` coalesces any number of concurrent 429s. 1:1 translation
/// of the original's `sync.RWMutex` + `TryLock`.
pub async fn run(
    job_service: JobService,
    handler_count: usize,
    input: mpsc::Receiver<Job>,
    cancel: CancellationToken,
) -> Result<(), AppError> {
    let input = Arc::new(Mutex::new(input));
    let pause = Arc::new(RwLock::new(()));

    let mut workers = JoinSet::new();
    for id in 0..handler_count {
        let input = input.clone();
        let pause = pause.clone();
        let cancel = cancel.clone();
        let job_service = job_service.clone();
        workers.spawn(async move { worker(id, job_service, input, pause, cancel).await });
    }

    while let Some(joined) = workers.join_next().await {
        joined.map_err(|e| AppError::internal(e.to_string()))??;
    }
    Ok(())
}

async fn worker(
    id: usize,
    job_service: JobService,
    input: Arc<Mutex<mpsc::Receiver<Job>>>,
    pause: Arc<RwLock<()>>,
    cancel: CancellationToken,
) -> Result<(), AppError> {
    loop {
        let job = {
            let mut rx = input.lock().await;
            tokio::select! {
                job = rx.recv() => job,
                _ = cancel.cancelled() => {
                    tracing::debug!(worker_id = id, "cancelled");
                    return Ok(());
                }
            }
        };

        let Some(job) = job else {
            tracing::debug!(worker_id = id, "input channel closed");
            return Ok(());
        };

        retry(&job_service, job, &pause, &cancel).await?;
    }
}

async fn retry(
    job_service: &JobService,
    mut job: Job,
    pause: &RwLock<()>,
    cancel: &CancellationToken,
) -> Result<(), AppError> {
    loop {
        if cancel.is_cancelled() {
            return Ok(());
        }

        let result = {
            let _guard = pause.read().await;
            job_service.handle(&mut job).await
        };

        match result {
            Ok(()) => return Ok(()),
            Err(AppError::Transient(retry_after)) => {
                if !wait_or_pause(pause, retry_after, cancel).await {
                    return Ok(());
                }
            }
            Err(e) => {
                job_service.fail(&mut job, &e).await?;
                return Ok(());
            }
        }
    }
}

/// The leader (whoever wins `try_write`) sleeps for `retry_after`; every
/// other worker's `try_write` fails immediately and they fall through to
/// re-attempt `handle`, which blocks on `read()` until the leader's sleep
/// ends. Returns `false` only on cancellation.
async fn wait_or_pause(pause: &RwLock<()>, retry_after: Duration, cancel: &CancellationToken) -> bool {
    let Ok(_guard) = pause.try_write() else {
        tracing::debug!("pause lock already acquired by another worker");
        return true;
    };

    tokio::select! {
        _ = tokio::time::sleep(retry_after) => true,
        _ = cancel.cancelled() => false,
    }
}
