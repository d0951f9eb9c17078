use std::time::Duration;

use crate::domain::error::AppError;
use crate::services::pipeline::PipelineConfig;

fn env_var(key: &str) -> Result<String, AppError> {
    std::env::var(key).map_err(|_| AppError::internal(format!("missing env var {key}")))
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_duration_secs(key: &str, default_secs: u64) -> Result<Duration, AppError> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| AppError::internal(format!("invalid {key}: {e}"))),
        Err(_) => Ok(Duration::from_secs(default_secs)),
    }
}

fn env_usize_or(key: &str, default: usize) -> Result<usize, AppError> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<usize>()
            .map_err(|e| AppError::internal(format!("invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Process configuration, read entirely from the environment per
/// spec.md §6.3. Loaded once at startup via `AppConfig::from_env`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_address: String,
    pub server_shutdown_timeout: Duration,
    pub accrual_base_url: String,
    pub jwt_secret: String,
    pub jwt_expires: Duration,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: env_var("DATABASE_URL")?,
            server_address: env_var_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            server_shutdown_timeout: env_duration_secs("SERVER_SHUTDOWN_TIMEOUT_SECS", 5)?,
            accrual_base_url: env_var("ACCRUAL_SYSTEM_ADDRESS")?,
            jwt_secret: env_var("JWT_SECRET")?,
            jwt_expires: env_duration_secs("JWT_EXPIRES_SECS", 24 * 3600)?,
            pipeline: PipelineConfig {
                buffer_size: env_usize_or("PIPELINE_BUFFER_SIZE", 64)?,
                handler_count: env_usize_or("PIPELINE_HANDLER_COUNT", 4)?,
                poll_delay: env_duration_secs("PIPELINE_POLL_DELAY_SECS", 1)?,
                fix_delay: env_duration_secs("PIPELINE_FIX_DELAY_SECS", 30)?,
                fix_proc_timeout: env_duration_secs("PIPELINE_FIX_PROC_TIMEOUT_SECS", 60)?,
                shutdown_timeout: env_duration_secs("PIPELINE_SHUTDOWN_TIMEOUT_SECS", 5)?,
            },
        })
    }
}
