pub mod errors;
pub mod handlers;
pub mod middleware;

use std::time::Duration;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let authed = Router::new()
        .route(
            "/api/user/orders",
            post(handlers::orders::create).get(handlers::orders::list),
        )
        .route(
            "/api/user/balance",
            get(handlers::balance::get),
        )
        .route("/api/user/balance/withdraw", post(handlers::balance::withdraw))
        .route("/api/user/withdrawals", get(handlers::withdrawals::list))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth::require_auth));

    let public = Router::new()
        .route("/api/user/register", post(handlers::auth::register))
        .route("/api/user/login", post(handlers::auth::login));

    Router::new()
        .merge(public)
        .merge(authed)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
