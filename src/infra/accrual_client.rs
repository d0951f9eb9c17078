use std::time::Duration;

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::error::AppError;
use crate::domain::order::{OrderNumber, OrderStatus};

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
enum RemoteStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

#[derive(Debug, Deserialize)]
struct AccrualResponse {
    status: RemoteStatus,
    accrual: Option<Decimal>,
}

/// Outcome of polling the upstream accrual service for one order.
#[derive(Debug, Clone, Copy)]
pub struct AccrualOutcome {
    pub status: OrderStatus,
    pub accrual: Option<Decimal>,
}

/// `reqwest`-backed client for the upstream accrual service. 204 means the
/// order is unknown upstream and is surfaced as `AppError::NotFound`
/// (terminal for the job, not a reason to keep polling); 429 is surfaced
/// as `AppError::Transient`, which must never escape the pipeline to the
/// HTTP edge; anything else but 200 maps to `AppError::Internal`.
pub struct AccrualClient {
    http: Client,
    base_url: String,
}

impl AccrualClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn get(&self, number: &OrderNumber) -> Result<AccrualOutcome, AppError> {
        let url = format!("{}/api/orders/{}", self.base_url, number.as_str());
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("accrual request failed: {e}")))?;

        match response.status() {
            StatusCode::OK => {
                let body: AccrualResponse = response
                    .json()
                    .await
                    .map_err(|e| AppError::internal(format!("accrual response decode failed: {e}")))?;
                let status = match body.status {
                    RemoteStatus::Registered | RemoteStatus::Processing => OrderStatus::Processing,
                    RemoteStatus::Invalid => OrderStatus::Invalid,
                    RemoteStatus::Processed => OrderStatus::Processed,
                };
                Ok(AccrualOutcome {
                    status,
                    accrual: body.accrual,
                })
            }
            StatusCode::NO_CONTENT => {
                Err(AppError::not_found(format!("order {} not registered upstream", number.as_str())))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_RETRY_AFTER);
                Err(AppError::transient(retry_after))
            }
            other => Err(AppError::internal(format!("accrual service returned {other}"))),
        }
    }
}
