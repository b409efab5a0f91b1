use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Email comparisons are case-insensitive, username comparisons are
/// case-sensitive. Every query in this module follows that convention.
pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    username: &str,
    email: &str,
    password_hash: &str,
    is_active: bool,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash, is_active)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(is_active)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Look up a user by username or email in a single query.
///
/// If a username string equals a different user's email string both rows
/// match; which one wins is unspecified. Username and email are each unique
/// on their own, so the overlap cannot be ruled out at the schema level.
pub async fn find_by_identity(pool: &PgPool, identity: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE username = $1 OR lower(email) = lower($1) LIMIT 1",
    )
    .bind(identity)
    .fetch_optional(pool)
    .await
}

pub async fn find_active_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE lower(email) = lower($1) AND is_active = true",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_valid_reset_token(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users
         WHERE reset_token_hash = $1 AND is_active = true AND reset_expiration >= now()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Store a new reset token hash, overwriting any unconsumed one. At most one
/// live token per user. Refuses inactive accounts; returns whether a row was
/// written.
pub async fn set_reset_token(
    pool: &PgPool,
    id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET reset_token_hash = $2, reset_expiration = $3
         WHERE id = $1 AND is_active = true",
    )
    .bind(id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Atomically redeem a reset token: replace the password hash and clear the
/// token in one conditional UPDATE. Of two racing requests carrying the same
/// token, the statement matches for exactly one; the loser sees `None`.
pub async fn consume_reset_token(
    pool: &PgPool,
    token_hash: &str,
    new_password_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users
         SET password_hash = $2, reset_token_hash = NULL, reset_expiration = NULL
         WHERE reset_token_hash = $1 AND is_active = true AND reset_expiration >= now()
         RETURNING *",
    )
    .bind(token_hash)
    .bind(new_password_hash)
    .fetch_optional(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
        .bind(id)
        .bind(is_active)
        .execute(pool)
        .await?;
    Ok(())
}
