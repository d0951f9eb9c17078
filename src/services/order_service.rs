use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Notify;

use crate::domain::error::AppError;
use crate::domain::id::UserId;
use crate::domain::job::{Job, JobType};
use crate::domain::order::{Order, OrderKind, OrderNumber};
use crate::infra::checksum::validate_luhn;
use crate::infra::postgres::{job_repo, order_repo};

/// Result of `OrderService::create`, distinguishing the idempotent
/// already-owned-by-caller case (success) from a freshly accepted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Accepted,
    AlreadyOwnedByCaller,
}

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    trigger: Arc<Notify>,
}

impl OrderService {
    pub fn new(pool: PgPool, trigger: Arc<Notify>) -> Self {
        Self { pool, trigger }
    }

    /// Exactly spec.md §4.4: validate checksum, dedup by number, insert
    /// order + enqueue job in one transaction, trigger the pipeline
    /// strictly after commit.
    pub async fn create(&self, user_id: UserId, number: String) -> Result<CreateOutcome, AppError> {
        if !validate_luhn(&number) {
            return Err(AppError::invalid("order number fails checksum validation"));
        }
        let number = OrderNumber::new(number)?;

        if let Some(existing) = order_repo::find_by_number(&self.pool, &number).await? {
            return if existing.user_id == user_id {
                Ok(CreateOutcome::AlreadyOwnedByCaller)
            } else {
                Err(AppError::conflict("order number already uploaded by another user"))
            };
        }

        let order = Order::new_income(number, user_id);
        let job = Job::new(order.id, JobType::PollAccrual);

        let mut tx = self.pool.begin().await?;
        order_repo::create(&mut tx, &order).await?;
        job_repo::enqueue(&mut tx, &job).await?;
        tx.commit().await?;

        self.trigger.notify_one();
        Ok(CreateOutcome::Accepted)
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, AppError> {
        order_repo::list_for_user(&self.pool, user_id, OrderKind::Income).await
    }
}
