use sqlx::PgPool;

use crate::domain::balance::Balance;
use crate::domain::error::AppError;
use crate::domain::id::UserId;
use crate::domain::money::Amount;
use crate::domain::order::{Order, OrderKind, OrderNumber};
use crate::infra::checksum::validate_luhn;
use crate::infra::postgres::{balance_repo, order_repo};

#[derive(Clone)]
pub struct BalanceService {
    pool: PgPool,
}

impl BalanceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: UserId) -> Result<Balance, AppError> {
        balance_repo::get(&self.pool, user_id).await
    }

    /// Exactly spec.md §4.5: build an OUTCOME order, load and debit the
    /// balance, insert the order, update the balance, all in one
    /// transaction. No job is enqueued; withdrawals are terminal on
    /// creation.
    pub async fn withdraw(&self, user_id: UserId, number: String, sum: Amount) -> Result<(), AppError> {
        if !validate_luhn(&number) {
            return Err(AppError::invalid("order number fails checksum validation"));
        }
        let number = OrderNumber::new(number)?;

        if order_repo::find_by_number(&self.pool, &number).await?.is_some() {
            return Err(AppError::conflict("order number already used"));
        }

        let order = Order::new_outcome(number, sum, user_id)?;

        let mut tx = self.pool.begin().await?;
        let mut balance = balance_repo::get_for_update(&mut tx, user_id).await?;
        balance.apply_order(&order)?;
        order_repo::create(&mut tx, &order).await?;
        balance_repo::update(&mut tx, &balance).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_withdrawals(&self, user_id: UserId) -> Result<Vec<Order>, AppError> {
        order_repo::list_for_user(&self.pool, user_id, OrderKind::Outcome).await
    }
}
