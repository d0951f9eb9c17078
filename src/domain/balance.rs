use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::AppError;
use super::id::UserId;
use super::money::Amount;
use super::order::{Order, OrderKind, OrderStatus};

/// One balance row per user, created alongside the user in the same
/// transaction. Mutated only by accrual completion (credit) or withdrawal
/// (debit).
#[derive(Debug, Clone, Serialize)]
pub struct Balance {
    pub user_id: UserId,
    pub current: Amount,
    pub withdrawn: Amount,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    pub fn zeroed(user_id: UserId) -> Self {
        Self {
            user_id,
            current: Amount::zero(),
            withdrawn: Amount::zero(),
            updated_at: Utc::now(),
        }
    }

    /// Applies a terminal order to this balance. Mirrors the original
    /// `entity.Balance.Update`: validates ownership and finality, then
    /// routes to credit (INCOME) or debit (OUTCOME).
    pub fn apply_order(&mut self, order: &Order) -> Result<(), AppError> {
        if order.user_id != self.user_id {
            return Err(AppError::invalid("order does not belong to this balance's user"));
        }
        if order.status != OrderStatus::Processed {
            return Err(AppError::invalid("order is not in a processed state"));
        }
        match order.kind {
            OrderKind::Income => self.credit(order.amount),
            OrderKind::Outcome => self.debit(order.amount)?,
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn credit(&mut self, amount: Amount) {
        self.current = self.current + amount;
    }

    fn debit(&mut self, amount: Amount) -> Result<(), AppError> {
        let remaining = self
            .current
            .checked_sub(amount)
            .ok_or_else(|| AppError::insufficient_funds("balance too low for this withdrawal"))?;
        self.current = remaining;
        self.withdrawn = self.withdrawn + amount;
        Ok(())
    }
}
