use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::job::Job;
use crate::domain::money::Amount;
use crate::domain::order::OrderStatus;
use crate::infra::accrual_client::AccrualClient;
use crate::infra::postgres::{balance_repo, job_repo, order_repo};

/// The pipeline's use-case dependency (spec.md §4.3.5): `handle` runs the
/// load/call/apply flow, `fail` marks a job terminally failed. Grounded
/// in the original's `usecase.JobUseCase`, restructured around explicit
/// transactions per the teacher's `pool.begin()` idiom rather than an
/// ambient-transaction manager.
#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
    accrual: Arc<AccrualClient>,
}

impl JobService {
    pub fn new(pool: PgPool, accrual: Arc<AccrualClient>) -> Self {
        Self { pool, accrual }
    }

    pub async fn handle(&self, job: &mut Job) -> Result<(), AppError> {
        let mut order = match order_repo::find_by_id(&self.pool, job.entity_id).await? {
            Some(order) => order,
            None => {
                job.mark_failed("order not found");
                return self.persist(job).await;
            }
        };

        if order.status.is_final() {
            job.mark_failed("order already in a final status");
            return self.persist(job).await;
        }

        // The HTTP call has no transaction open around it — a crash or
        // cancellation here simply leaves the job PROCESSING with
        // next_attempt_at already cleared by the lease; Fix recovers it.
        let outcome = self.accrual.get(&order.number).await?;

        let amount = outcome.accrual.map(Amount::new).transpose()?;
        order.apply_accrual(outcome.status, amount)?;

        let mut tx = self.pool.begin().await?;
        order_repo::update(&mut tx, &order).await?;

        match outcome.status {
            OrderStatus::Processed => {
                let mut balance = balance_repo::get_for_update(&mut tx, order.user_id).await?;
                balance.apply_order(&order)?;
                balance_repo::update(&mut tx, &balance).await?;
                job.mark_processed();
            }
            OrderStatus::Invalid => {
                job.mark_processed();
            }
            _ => {
                job.reschedule();
            }
        }
        job_repo::update(&mut tx, job).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn fail(&self, job: &mut Job, err: &AppError) -> Result<(), AppError> {
        job.mark_failed(err.to_string());
        self.persist(job).await
    }

    async fn persist(&self, job: &Job) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        job_repo::update(&mut tx, job).await?;
        tx.commit().await?;
        Ok(())
    }
}
