pub mod config;
pub mod domain;
pub mod infra;
pub mod services;
pub mod transport;

use std::sync::Arc;

use sqlx::PgPool;

use crate::infra::accrual_client::AccrualClient;
use crate::infra::auth::hash::PassHasher;
use crate::infra::auth::jwt::Tokener;
use crate::services::balance_service::BalanceService;
use crate::services::job_service::JobService;
use crate::services::order_service::OrderService;
use crate::services::pipeline::{Pipeline, PipelineConfig};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt: Tokener,
    pub pass_hasher: PassHasher,
    pub order_service: OrderService,
    pub balance_service: BalanceService,
}

/// Wires up the services and starts the pipeline. `AppState` is cheap to
/// clone (every field is itself an `Arc`/`PgPool`/handle), matching the
/// teacher's `AppState` shape.
pub fn wire(
    pool: PgPool,
    config: &config::AppConfig,
) -> (AppState, Arc<Pipeline>) {
    let trigger = Arc::new(tokio::sync::Notify::new());
    let accrual = Arc::new(AccrualClient::new(config.accrual_base_url.clone()));
    let jwt = Tokener::new(&config.jwt_secret, config.jwt_expires);
    let pass_hasher = PassHasher::new();

    let order_service = OrderService::new(pool.clone(), trigger.clone());
    let balance_service = BalanceService::new(pool.clone());
    let job_service = JobService::new(pool.clone(), accrual);

    let pipeline = Pipeline::start(pool.clone(), job_service, trigger, pipeline_config(config));

    let state = AppState {
        pool,
        jwt,
        pass_hasher,
        order_service,
        balance_service,
    };
    (state, pipeline)
}

fn pipeline_config(config: &config::AppConfig) -> PipelineConfig {
    config.pipeline.clone()
}
