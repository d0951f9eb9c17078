mod common;

use common::*;
use gophermart::domain::job::{Job, JobType};
use gophermart::domain::money::Amount;
use gophermart::infra::postgres::job_repo;
use gophermart::services::balance_service::BalanceService;
use gophermart::services::order_service::{CreateOutcome, OrderService};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Notify;

// ── concurrent_lease_due_never_double_delivers ─────────────────────────────
// Two "pipeline instances" leasing concurrently against 20 due jobs with
// FOR UPDATE SKIP LOCKED must never hand the same job to both.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lease_due_never_double_delivers() {
    let pool = setup_pool("gophermart_test_concurrency").await;
    let user = make_user(&pool, "concurrency_lease_user").await;

    let mut ids = Vec::new();
    for i in 0..20 {
        let order = make_income_order(&pool, user.id, &format!("leaseorder{i}")).await;
        let job = Job::new(order.id, JobType::PollAccrual);
        let mut tx = pool.begin().await.unwrap();
        job_repo::enqueue(&mut tx, &job).await.unwrap();
        tx.commit().await.unwrap();
        ids.push(job.id);
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            match job_repo::lease_due(&pool, 3).await {
                Ok(jobs) => jobs.into_iter().map(|j| j.id).collect::<Vec<_>>(),
                Err(_) => Vec::new(),
            }
        }));
    }

    let mut leased = Vec::new();
    for h in handles {
        leased.extend(h.await.unwrap());
    }

    let unique: std::collections::HashSet<_> = leased.iter().collect();
    assert_eq!(leased.len(), unique.len(), "no job leased twice");
    assert!(leased.len() <= ids.len());
}

// ── concurrent_order_creation_same_number ──────────────────────────────────
// N callers race to create an order with the same number. Exactly one
// caller per distinct user can succeed; same-user retries are idempotent.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_order_creation_same_number_by_different_users() {
    let pool = setup_pool("gophermart_test_concurrency").await;
    const NUMBER: &str = "79927398713";

    let mut handles = Vec::new();
    for i in 0..5 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let user = make_user(&pool, &format!("concurrency_order_user_{i}")).await;
            let svc = OrderService::new(pool, Arc::new(Notify::new()));
            svc.create(user.id, NUMBER.into()).await
        }));
    }

    let mut accepted = 0;
    let mut conflicts = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(CreateOutcome::Accepted) => accepted += 1,
            Err(e) if e.to_string().contains("conflict") || e.to_string().contains("already uploaded") => {
                conflicts += 1
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    assert_eq!(accepted, 1, "exactly one caller wins the order number");
    assert_eq!(conflicts, 4);
    assert_eq!(count_orders(&pool, NUMBER).await, 1);
}

// ── concurrent_withdrawals_never_overdraw ──────────────────────────────────
// A balance with 100.00 faces 10 concurrent withdrawals of 20.00 each. The
// FOR UPDATE row lock on balances must serialize them: exactly 5 succeed.

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let pool = setup_pool("gophermart_test_concurrency").await;
    let user = make_user(&pool, "concurrency_withdraw_user").await;

    {
        let mut tx = pool.begin().await.unwrap();
        let mut balance = gophermart::infra::postgres::balance_repo::get_for_update(&mut tx, user.id)
            .await
            .unwrap();
        balance.current = Amount::new(Decimal::new(10000, 2)).unwrap();
        gophermart::infra::postgres::balance_repo::update(&mut tx, &balance).await.unwrap();
        tx.commit().await.unwrap();
    }

    const NUMBERS: [&str; 10] = [
        "10000000009",
        "10000000017",
        "10000000025",
        "10000000033",
        "10000000041",
        "10000000058",
        "10000000066",
        "10000000074",
        "10000000082",
        "10000000090",
    ];

    let mut handles = Vec::new();
    for number in NUMBERS {
        let pool = pool.clone();
        let user_id = user.id;
        let number = number.to_string();
        handles.push(tokio::spawn(async move {
            let svc = BalanceService::new(pool);
            svc.withdraw(user_id, number, Amount::new(Decimal::new(2000, 2)).unwrap()).await
        }));
    }

    let mut ok = 0;
    let mut failed = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(()) => ok += 1,
            Err(_) => failed += 1,
        }
    }

    assert_eq!(ok, 5, "exactly 5 of 10 withdrawals succeed against a 100.00 balance");
    assert_eq!(failed, 5);

    let balance = gophermart::infra::postgres::balance_repo::get(&pool, user.id).await.unwrap();
    assert!(balance.current.is_zero());
}
