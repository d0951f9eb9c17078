use axum::extract::State;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::AppError;
use crate::domain::id::UserId;
use crate::domain::money::Amount;
use crate::transport::http::errors::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BalanceView {
    #[serde(with = "rust_decimal::serde::str")]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub withdrawn: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Decimal,
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn get(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<BalanceView>, ApiError> {
    let balance = state.balance_service.get(user_id).await?;
    Ok(Json(BalanceView {
        current: balance.current.as_decimal(),
        withdrawn: balance.withdrawn.as_decimal(),
    }))
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(req): Json<WithdrawRequest>,
) -> Result<(), ApiError> {
    let sum = Amount::new(req.sum).map_err(|_| AppError::invalid("withdrawal amount must be positive"))?;
    state.balance_service.withdraw(user_id, req.order, sum).await?;
    Ok(())
}
