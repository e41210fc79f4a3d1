use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::{types::UserId, utils::jwt::RefreshToken};

#[derive(Debug, FromRow)]
/// Represents a stored refresh token in the database.
pub struct StoredRefreshToken {
    pub id: String,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Inserts a new refresh token into the database.
pub async fn insert_refresh_token(pool: &PgPool, token: &RefreshToken) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(&token.id)
    .bind(token.user_id)
    .bind(&token.token_hash)
    .bind(token.expires_at)
    .execute(pool)
    .await
    .map(|_| ())
}

/// Deletes a specific refresh token by its ID.
pub async fn delete_refresh_token_by_id(pool: &PgPool, token_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
        .bind(token_id)
        .execute(pool)
        .await
        .map(|_| ())
}

/// Deletes all refresh tokens for a specific user.
pub async fn delete_refresh_tokens_for_user(
    db: impl PgExecutor<'_>,
    user_id: UserId,
) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await
        .map(|result| result.rows_affected())
}

/// Fetches a valid (non-expired) refresh token by its ID.
pub async fn fetch_valid_refresh_token(
    pool: &PgPool,
    token_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<StoredRefreshToken>, sqlx::Error> {
    sqlx::query_as::<_, StoredRefreshToken>(
        "SELECT id, user_id, token_hash, expires_at FROM refresh_tokens \
         WHERE id = $1 AND expires_at > $2",
    )
    .bind(token_id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Removes expired refresh tokens. Returns the number of rows deleted.
pub async fn cleanup_expired_refresh_tokens(pool: &PgPool) -> Result<u64, sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= NOW()")
        .execute(pool)
        .await
        .map(|result| result.rows_affected())
}
