use std::time::Duration;

use thiserror::Error;

/// Tagged application error. Each variant maps to one HTTP status class at
/// the transport edge, or to one pipeline reaction (`Transient`).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid: {0}")]
    Invalid(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Retryable; carries the upstream-suggested delay. Must never escape
    /// the pipeline to the HTTP layer.
    #[error("transient, retry after {0:?}")]
    Transient(Duration),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Bad/missing credentials or bearer token. Kept distinct from
    /// `Invalid` since the HTTP edge maps it to 401 rather than 400/422.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A withdrawal would overdraw the balance. Kept distinct from
    /// `Invalid` since the HTTP edge maps it to 402 rather than 422.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("internal: {0}")]
    Internal(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::InsufficientFunds(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn transient(after: Duration) -> Self {
        Self::Transient(after)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Transient(d) => Some(*d),
            _ => None,
        }
    }
}
