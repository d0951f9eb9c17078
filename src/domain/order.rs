use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use super::id::{OrderId, UserId};
use super::money::Amount;

/// Order number as submitted by a caller. Validated for non-emptiness only;
/// checksum validation is a separate collaborator (`infra::checksum`)
/// invoked by the use-case layer, not baked into the entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn new(number: impl Into<String>) -> Result<Self, AppError> {
        let number = number.into();
        if number.trim().is_empty() {
            return Err(AppError::invalid("order number must not be empty"));
        }
        Ok(Self(number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderKind {
    Income,
    Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    /// `INVALID` and `PROCESSED` are terminal — no further update is valid.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub number: OrderNumber,
    pub kind: OrderKind,
    pub status: OrderStatus,
    pub amount: Amount,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// An INCOME order starts in NEW with zero amount; the accrual pipeline
    /// fills in the amount once the upstream finalises it.
    pub fn new_income(number: OrderNumber, user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            number,
            kind: OrderKind::Income,
            status: OrderStatus::New,
            amount: Amount::zero(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// An OUTCOME order (withdrawal) is created directly in PROCESSED with
    /// the requested amount, which must be strictly positive.
    pub fn new_outcome(number: OrderNumber, amount: Amount, user_id: UserId) -> Result<Self, AppError> {
        if amount.is_zero() {
            return Err(AppError::invalid("withdrawal amount must be greater than zero"));
        }
        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            number,
            kind: OrderKind::Outcome,
            status: OrderStatus::Processed,
            amount,
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an accrual result fetched from the upstream. Mirrors the
    /// original `entity.Order.Update`: rejects updates to a final order,
    /// only sets `amount` when the incoming status is PROCESSED.
    pub fn apply_accrual(&mut self, status: OrderStatus, amount: Option<Amount>) -> Result<(), AppError> {
        if self.status.is_final() {
            return Err(AppError::invalid("order is already in a final status"));
        }
        if status == OrderStatus::Processed {
            self.amount = amount.unwrap_or(self.amount);
        }
        self.status = status;
        self.updated_at = Utc::now();
        Ok(())
    }
}
