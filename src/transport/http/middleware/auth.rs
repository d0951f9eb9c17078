use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::error::AppError;
use crate::domain::id::UserId;
use crate::transport::http::errors::ApiError;
use crate::AppState;

/// Extracts `Authorization: Bearer <token>`, verifies it, and injects the
/// caller's `UserId` as a request extension. Grounded in the original's
/// `middlewares.Auth`, translated to axum's extension-based idiom.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;

    let user_id: UserId = state.jwt.verify(token)?;
    request.extensions_mut().insert(user_id);
    Ok(next.run(request).await)
}
