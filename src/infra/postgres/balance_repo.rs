use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::balance::Balance;
use crate::domain::error::AppError;
use crate::domain::id::UserId;
use crate::domain::money::Amount;

#[derive(sqlx::FromRow)]
struct BalanceRow {
    user_id: uuid::Uuid,
    current: Decimal,
    withdrawn: Decimal,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<BalanceRow> for Balance {
    type Error = AppError;

    fn try_from(row: BalanceRow) -> Result<Self, AppError> {
        Ok(Balance {
            user_id: UserId::from_uuid(row.user_id),
            current: Amount::new(row.current)?,
            withdrawn: Amount::new(row.withdrawn)?,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts a zeroed balance row for a newly created user. Must run in the
/// same transaction as `user_repo::create`.
pub async fn create(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    balance: &Balance,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO balances (user_id, current, withdrawn, updated_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(balance.user_id.as_uuid())
    .bind(balance.current.as_decimal())
    .bind(balance.withdrawn.as_decimal())
    .bind(balance.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Locks and fetches the balance row for update within the caller's
/// transaction. The row lock serialises concurrent withdraw/credit
/// attempts for the same user.
pub async fn get_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: UserId,
) -> Result<Balance, AppError> {
    let row: BalanceRow = sqlx::query_as(
        r#"SELECT user_id, current, withdrawn, updated_at FROM balances WHERE user_id = $1 FOR UPDATE"#,
    )
    .bind(user_id.as_uuid())
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found(format!("balance for user {user_id} not found")))?;
    row.try_into()
}

pub async fn get(pool: &PgPool, user_id: UserId) -> Result<Balance, AppError> {
    let row: BalanceRow = sqlx::query_as(
        r#"SELECT user_id, current, withdrawn, updated_at FROM balances WHERE user_id = $1"#,
    )
    .bind(user_id.as_uuid())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found(format!("balance for user {user_id} not found")))?;
    row.try_into()
}

/// Persists the mutated balance. Must be called with the same transaction
/// that held `get_for_update`'s row lock.
pub async fn update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    balance: &Balance,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE balances
        SET current = $2, withdrawn = $3, updated_at = $4
        WHERE user_id = $1
        "#,
    )
    .bind(balance.user_id.as_uuid())
    .bind(balance.current.as_decimal())
    .bind(balance.withdrawn.as_decimal())
    .bind(balance.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
