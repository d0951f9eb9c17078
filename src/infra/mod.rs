pub mod accrual_client;
pub mod auth;
pub mod checksum;
pub mod postgres;
