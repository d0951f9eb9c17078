use std::time::Duration;

use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::id::{JobId, OrderId};
use crate::domain::job::{Job, JobStatus, JobType};

fn job_type_str(t: JobType) -> &'static str {
    match t {
        JobType::PollAccrual => "POLL_ACCRUAL",
    }
}

fn job_type_from_str(s: &str) -> Result<JobType, AppError> {
    match s {
        "POLL_ACCRUAL" => Ok(JobType::PollAccrual),
        other => Err(AppError::internal(format!("unknown job type: {other}"))),
    }
}

fn status_str(s: JobStatus) -> &'static str {
    match s {
        JobStatus::New => "NEW",
        JobStatus::Processing => "PROCESSING",
        JobStatus::Processed => "PROCESSED",
        JobStatus::Failed => "FAILED",
    }
}

fn status_from_str(s: &str) -> Result<JobStatus, AppError> {
    match s {
        "NEW" => Ok(JobStatus::New),
        "PROCESSING" => Ok(JobStatus::Processing),
        "PROCESSED" => Ok(JobStatus::Processed),
        "FAILED" => Ok(JobStatus::Failed),
        other => Err(AppError::internal(format!("unknown job status: {other}"))),
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: uuid::Uuid,
    job_type: String,
    status: String,
    entity_id: uuid::Uuid,
    attempt: i32,
    last_error: Option<String>,
    next_attempt_at: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl JobRow {
    fn into_job(self) -> Result<Job, AppError> {
        Ok(Job {
            id: JobId::from_uuid(self.id),
            job_type: job_type_from_str(&self.job_type)?,
            status: status_from_str(&self.status)?,
            entity_id: OrderId::from_uuid(self.entity_id),
            attempt: self.attempt.max(0) as u32,
            last_error: self.last_error,
            next_attempt_at: self.next_attempt_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Inserts a job in NEW status with `next_attempt_at = now`. Must run
/// inside the caller's transaction so it commits atomically with the
/// order it polls.
pub async fn enqueue(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    job: &Job,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO jobs (id, job_type, status, entity_id, attempt, last_error, next_attempt_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(job.id.as_uuid())
    .bind(job_type_str(job.job_type))
    .bind(status_str(job.status))
    .bind(job.entity_id.as_uuid())
    .bind(job.attempt as i32)
    .bind(&job.last_error)
    .bind(job.next_attempt_at)
    .bind(job.created_at)
    .bind(job.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Atomically leases up to `limit` due jobs: selects candidates ordered by
/// `next_attempt_at`, skipping rows locked by other workers, and marks
/// them PROCESSING with `next_attempt_at = NULL` in the same statement.
/// This is the single dequeue primitive — race-free across processes.
pub async fn lease_due(pool: &PgPool, limit: i64) -> Result<Vec<Job>, AppError> {
    let rows: Vec<JobRow> = sqlx::query_as(
        r#"
        UPDATE jobs
        SET status = 'PROCESSING', next_attempt_at = NULL, updated_at = now()
        WHERE id IN (
            SELECT id FROM jobs
            WHERE next_attempt_at IS NOT NULL AND next_attempt_at <= now()
            ORDER BY next_attempt_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, job_type, status, entity_id, attempt, last_error, next_attempt_at, created_at, updated_at
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Err(AppError::not_found("no due jobs"));
    }

    rows.into_iter().map(JobRow::into_job).collect()
}

/// Updates a job by id: bumps `attempt` by one, sets status and
/// `next_attempt_at`, coalesce-preserves `last_error` when the incoming
/// value is `None`. Returns `NotFound` if the id is absent.
pub async fn update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    job: &Job,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET attempt = $2,
            status = $3,
            next_attempt_at = $4,
            last_error = COALESCE($5, last_error),
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(job.id.as_uuid())
    .bind(job.attempt as i32)
    .bind(status_str(job.status))
    .bind(job.next_attempt_at)
    .bind(&job.last_error)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("job {} not found", job.id)));
    }
    Ok(())
}

/// Resets jobs stuck in PROCESSING (leased but never updated, e.g. the
/// owning worker crashed) back to due. Idempotent; may affect zero rows.
pub async fn rescue_stuck(pool: &PgPool, timeout: Duration) -> Result<u64, AppError> {
    let timeout_secs = timeout.as_secs() as f64;
    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET next_attempt_at = now(), attempt = attempt + 1, updated_at = now()
        WHERE status = 'PROCESSING'
          AND next_attempt_at IS NULL
          AND now() - updated_at > make_interval(secs => $1)
        "#,
    )
    .bind(timeout_secs)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
