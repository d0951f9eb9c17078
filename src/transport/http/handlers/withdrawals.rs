use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::id::UserId;
use crate::transport::http::errors::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WithdrawalView {
    pub order: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, ApiError> {
    let withdrawals = state.balance_service.list_withdrawals(user_id).await?;
    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let views: Vec<WithdrawalView> = withdrawals
        .into_iter()
        .map(|o| WithdrawalView {
            order: o.number.as_str().to_string(),
            sum: o.amount.as_decimal(),
            processed_at: o.created_at,
        })
        .collect();

    Ok(Json(views).into_response())
}
