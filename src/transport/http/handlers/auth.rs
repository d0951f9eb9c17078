use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::balance::Balance;
use crate::domain::error::AppError;
use crate::domain::user::{Creds, User};
use crate::infra::postgres::{balance_repo, user_repo};
use crate::transport::http::errors::ApiError;
use crate::AppState;

fn bearer_response(token: String) -> Result<Response, ApiError> {
    let mut response = ().into_response();
    let value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| AppError::internal(format!("invalid token header: {e}")))?;
    response.headers_mut().insert(AUTHORIZATION, value);
    Ok(response)
}

/// Malformed credentials (empty login/password) are a request-shape problem,
/// not a business-rule violation — 400, not the 422 `ApiError` gives
/// `AppError::Invalid` elsewhere.
fn bad_credentials() -> Response {
    StatusCode::BAD_REQUEST.into_response()
}

#[tracing::instrument(skip_all, fields(login = %creds.login))]
pub async fn register(
    State(state): State<AppState>,
    Json(creds): Json<Creds>,
) -> Result<Response, ApiError> {
    if !creds.valid() {
        return Ok(bad_credentials());
    }

    let pass_hash = state.pass_hasher.hash(&creds.password)?;
    let user = User::new(creds.login, pass_hash);
    let balance = Balance::zeroed(user.id);

    let mut tx = state.pool.begin().await?;
    user_repo::create(&mut tx, &user).await?;
    balance_repo::create(&mut tx, &balance).await?;
    tx.commit().await?;

    let token = state.jwt.create(user.id)?;
    bearer_response(token)
}

#[tracing::instrument(skip_all, fields(login = %creds.login))]
pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Creds>,
) -> Result<Response, ApiError> {
    if !creds.valid() {
        return Ok(bad_credentials());
    }

    let user = user_repo::find_by_login(&state.pool, &creds.login)
        .await?
        .ok_or_else(|| AppError::unauthorized("invalid login or password"))?;

    if !state.pass_hasher.verify(&creds.password, &user.pass_hash) {
        return Err(AppError::unauthorized("invalid login or password").into());
    }

    let token = state.jwt.create(user.id)?;
    bearer_response(token)
}
