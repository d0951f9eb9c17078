mod common;

use common::*;
use gophermart::domain::job::{Job, JobStatus, JobType};
use gophermart::domain::order::OrderStatus;
use gophermart::infra::accrual_client::AccrualClient;
use gophermart::infra::postgres::{job_repo, order_repo};
use gophermart::services::job_service::JobService;
use std::sync::Arc;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn service_against(server: &MockServer, pool: sqlx::PgPool) -> JobService {
    JobService::new(pool, Arc::new(AccrualClient::new(server.uri())))
}

async fn enqueue_job(pool: &sqlx::PgPool, order_id: gophermart::domain::id::OrderId) -> Job {
    let job = Job::new(order_id, JobType::PollAccrual);
    let mut tx = pool.begin().await.unwrap();
    job_repo::enqueue(&mut tx, &job).await.unwrap();
    tx.commit().await.unwrap();
    job
}

#[tokio::test]
async fn handle_credits_balance_on_processed_accrual() {
    let pool = setup_pool("gophermart_test_job_pipeline").await;
    let user = make_user(&pool, "job_processed_user").await;
    let order = make_income_order(&pool, user.id, "79927398713").await;
    let mut job = enqueue_job(&pool, order.id).await;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/orders/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "order": order.number.as_str(),
            "status": "PROCESSED",
            "accrual": 500.5,
        })))
        .mount(&server)
        .await;

    let svc = service_against(&server, pool.clone()).await;
    svc.handle(&mut job).await.unwrap();

    assert_eq!(job.status, JobStatus::Processed);

    let updated = order_repo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(updated.status, OrderStatus::Processed);

    let balance = gophermart::infra::postgres::balance_repo::get(&pool, user.id).await.unwrap();
    assert_eq!(balance.current.as_decimal(), rust_decimal::Decimal::new(50050, 2));
}

#[tokio::test]
async fn handle_marks_invalid_without_touching_balance() {
    let pool = setup_pool("gophermart_test_job_pipeline").await;
    let user = make_user(&pool, "job_invalid_user").await;
    let order = make_income_order(&pool, user.id, "12345678903").await;
    let mut job = enqueue_job(&pool, order.id).await;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/orders/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "order": order.number.as_str(),
            "status": "INVALID",
        })))
        .mount(&server)
        .await;

    let svc = service_against(&server, pool.clone()).await;
    svc.handle(&mut job).await.unwrap();

    assert_eq!(job.status, JobStatus::Processed);
    let updated = order_repo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(updated.status, OrderStatus::Invalid);

    let balance = gophermart::infra::postgres::balance_repo::get(&pool, user.id).await.unwrap();
    assert!(balance.current.is_zero());
}

#[tokio::test]
async fn handle_reschedules_on_processing_status() {
    let pool = setup_pool("gophermart_test_job_pipeline").await;
    let user = make_user(&pool, "job_processing_user").await;
    let order = make_income_order(&pool, user.id, "49927398716").await;
    let mut job = enqueue_job(&pool, order.id).await;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/orders/.*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "order": order.number.as_str(),
            "status": "PROCESSING",
        })))
        .mount(&server)
        .await;

    let svc = service_against(&server, pool.clone()).await;
    svc.handle(&mut job).await.unwrap();

    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.attempt, 1);
    assert!(job.next_attempt_at.is_some());
}

#[tokio::test]
async fn handle_fails_job_when_accrual_returns_no_content() {
    let pool = setup_pool("gophermart_test_job_pipeline").await;
    let user = make_user(&pool, "job_nocontent_user").await;
    let order = make_income_order(&pool, user.id, "68361600999").await;
    let mut job = enqueue_job(&pool, order.id).await;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/orders/.*"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let svc = service_against(&server, pool.clone()).await;
    let err = svc.handle(&mut job).await.unwrap_err();
    assert!(matches!(err, gophermart::domain::error::AppError::NotFound(_)));
}

#[tokio::test]
async fn handle_surfaces_rate_limit_as_transient() {
    let pool = setup_pool("gophermart_test_job_pipeline").await;
    let user = make_user(&pool, "job_ratelimit_user").await;
    let order = make_income_order(&pool, user.id, "53957391278").await;
    let mut job = enqueue_job(&pool, order.id).await;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/orders/.*"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
        .mount(&server)
        .await;

    let svc = service_against(&server, pool.clone()).await;
    let err = svc.handle(&mut job).await.unwrap_err();
    assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(3)));
    // a transient error leaves the job record untouched; the handle-stage
    // worker is responsible for retrying, not job_service itself.
    assert_eq!(job.status, JobStatus::New);
}

#[tokio::test]
async fn handle_fails_job_when_order_is_missing() {
    let pool = setup_pool("gophermart_test_job_pipeline").await;
    let missing_order_id = gophermart::domain::id::OrderId::new();
    let mut job = enqueue_job(&pool, missing_order_id).await;

    let server = MockServer::start().await;
    let svc = service_against(&server, pool.clone()).await;
    svc.handle(&mut job).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.last_error.as_deref().unwrap().contains("not found"));
}

#[tokio::test]
async fn fail_persists_the_error_and_marks_job_failed() {
    let pool = setup_pool("gophermart_test_job_pipeline").await;
    let user = make_user(&pool, "job_fail_user").await;
    let order = make_income_order(&pool, user.id, "79927398713").await;
    let mut job = enqueue_job(&pool, order.id).await;

    let server = MockServer::start().await;
    let svc = service_against(&server, pool.clone()).await;

    let err = gophermart::domain::error::AppError::internal("upstream exploded");
    svc.fail(&mut job, &err).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    let row = get_job_for_order(&pool, order.id.as_uuid()).await.unwrap();
    assert_eq!(row.status, "FAILED");
}
