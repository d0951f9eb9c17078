use sqlx::PgPool;

use crate::domain::error::AppError;
use crate::domain::id::UserId;
use crate::domain::user::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: uuid::Uuid,
    login: String,
    pass_hash: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            login: row.login,
            pass_hash: row.pass_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Inserts a user and its zeroed balance row in the same transaction.
/// Returns `Conflict` if the login is already taken.
pub async fn create(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user: &User,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (id, login, pass_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (login) DO NOTHING
        "#,
    )
    .bind(user.id.as_uuid())
    .bind(&user.login)
    .bind(&user.pass_hash)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::conflict(format!("login {} already taken", user.login)));
    }
    Ok(())
}

pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, AppError> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"SELECT id, login, pass_hash, created_at, updated_at FROM users WHERE login = $1"#,
    )
    .bind(login)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(User::from))
}

pub async fn find_by_id(pool: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"SELECT id, login, pass_hash, created_at, updated_at FROM users WHERE id = $1"#,
    )
    .bind(id.as_uuid())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(User::from))
}
