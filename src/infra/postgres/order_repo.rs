use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::id::{OrderId, UserId};
use crate::domain::money::Amount;
use crate::domain::order::{Order, OrderKind, OrderNumber, OrderStatus};

fn kind_str(k: OrderKind) -> &'static str {
    match k {
        OrderKind::Income => "INCOME",
        OrderKind::Outcome => "OUTCOME",
    }
}

fn kind_from_str(s: &str) -> Result<OrderKind, AppError> {
    match s {
        "INCOME" => Ok(OrderKind::Income),
        "OUTCOME" => Ok(OrderKind::Outcome),
        other => Err(AppError::internal(format!("unknown order kind: {other}"))),
    }
}

fn status_str(s: OrderStatus) -> &'static str {
    match s {
        OrderStatus::New => "NEW",
        OrderStatus::Processing => "PROCESSING",
        OrderStatus::Invalid => "INVALID",
        OrderStatus::Processed => "PROCESSED",
    }
}

fn status_from_str(s: &str) -> Result<OrderStatus, AppError> {
    match s {
        "NEW" => Ok(OrderStatus::New),
        "PROCESSING" => Ok(OrderStatus::Processing),
        "INVALID" => Ok(OrderStatus::Invalid),
        "PROCESSED" => Ok(OrderStatus::Processed),
        other => Err(AppError::internal(format!("unknown order status: {other}"))),
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: uuid::Uuid,
    number: String,
    kind: String,
    status: String,
    amount: Decimal,
    user_id: uuid::Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, AppError> {
        Ok(Order {
            id: OrderId::from_uuid(row.id),
            number: OrderNumber::new(row.number)?,
            kind: kind_from_str(&row.kind)?,
            status: status_from_str(&row.status)?,
            amount: Amount::new(row.amount)?,
            user_id: UserId::from_uuid(row.user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts an order. The `orders_number_key` unique constraint enforces
/// global order-number uniqueness across all users; a conflict here
/// distinguishes "already uploaded by you" from "uploaded by someone
/// else" at the service layer by comparing `user_id` after the fact.
pub async fn create(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, number, kind, status, amount, user_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(order.id.as_uuid())
    .bind(order.number.as_str())
    .bind(kind_str(order.kind))
    .bind(status_str(order.status))
    .bind(order.amount.as_decimal())
    .bind(order.user_id.as_uuid())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: OrderId) -> Result<Option<Order>, AppError> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"SELECT id, number, kind, status, amount, user_id, created_at, updated_at FROM orders WHERE id = $1"#,
    )
    .bind(id.as_uuid())
    .fetch_optional(pool)
    .await?;
    row.map(Order::try_from).transpose()
}

pub async fn find_by_number(pool: &PgPool, number: &OrderNumber) -> Result<Option<Order>, AppError> {
    let row: Option<OrderRow> = sqlx::query_as(
        r#"SELECT id, number, kind, status, amount, user_id, created_at, updated_at FROM orders WHERE number = $1"#,
    )
    .bind(number.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(Order::try_from).transpose()
}

pub async fn list_for_user(pool: &PgPool, user_id: UserId, kind: OrderKind) -> Result<Vec<Order>, AppError> {
    let rows: Vec<OrderRow> = sqlx::query_as(
        r#"
        SELECT id, number, kind, status, amount, user_id, created_at, updated_at
        FROM orders
        WHERE user_id = $1 AND kind = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(kind_str(kind))
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}

/// Persists an order mutated by the accrual pipeline. Must run within the
/// same transaction that also enqueues/updates its job and, when
/// terminal, credits the balance.
pub async fn update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = $2, amount = $3, updated_at = $4
        WHERE id = $1
        "#,
    )
    .bind(order.id.as_uuid())
    .bind(status_str(order.status))
    .bind(order.amount.as_decimal())
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("order {} not found", order.id)));
    }
    Ok(())
}
