use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::id::UserId;
use crate::services::order_service::CreateOutcome;
use crate::transport::http::errors::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub number: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<rust_decimal::Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

fn status_str(s: crate::domain::order::OrderStatus) -> &'static str {
    match s {
        crate::domain::order::OrderStatus::New => "NEW",
        crate::domain::order::OrderStatus::Processing => "PROCESSING",
        crate::domain::order::OrderStatus::Invalid => "INVALID",
        crate::domain::order::OrderStatus::Processed => "PROCESSED",
    }
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    body: String,
) -> Result<Response, ApiError> {
    match state.order_service.create(user_id, body).await? {
        CreateOutcome::Accepted => Ok(StatusCode::ACCEPTED.into_response()),
        CreateOutcome::AlreadyOwnedByCaller => Ok(StatusCode::OK.into_response()),
    }
}

#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, ApiError> {
    let orders = state.order_service.list_for_user(user_id).await?;
    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let views: Vec<OrderView> = orders
        .into_iter()
        .map(|o| OrderView {
            number: o.number.as_str().to_string(),
            status: status_str(o.status),
            accrual: if o.status == crate::domain::order::OrderStatus::Processed {
                Some(o.amount.as_decimal())
            } else {
                None
            },
            uploaded_at: o.created_at,
        })
        .collect();

    Ok(Json(views).into_response())
}
