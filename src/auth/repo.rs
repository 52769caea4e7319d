use crate::auth::repo_types::{RefreshToken, User};
use sqlx::PgPool;
use time::OffsetDateTime;

const USER_COLUMNS: &str = "id, email, username, password_hash, is_admin, is_verified, \
     password_reset_token, password_reset_expires, created_at";

impl User {
    /// Find a user by email (case-insensitive: emails are stored lowercase).
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a user with an already-hashed password. Email and username are
    /// normalized to lowercase; accounts are verified immediately.
    pub async fn create(
        db: &PgPool,
        email: &str,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, username, password_hash, is_admin, is_verified)
             VALUES ($1, $2, $3, $4, TRUE)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email.trim().to_lowercase())
        .bind(username.trim().to_lowercase())
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Store a pending password-reset token with its expiry.
    pub async fn set_reset_token(
        db: &PgPool,
        user_id: i64,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET password_reset_token = $2, password_reset_expires = $3
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Consume a live reset token: write the new hash, clear the reset fields
    /// and drop every refresh token of the owner, all in one transaction.
    ///
    /// The token match and the field clear are a single UPDATE, so of two
    /// racing completions exactly one sees the row; the other gets `None`.
    pub async fn reset_password_with_token(
        db: &PgPool,
        token: &str,
        new_password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET password_hash = $2, password_reset_token = NULL, password_reset_expires = NULL
             WHERE password_reset_token = $1 AND password_reset_expires > now()
             RETURNING {USER_COLUMNS}"
        ))
        .bind(token)
        .bind(new_password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(user) = &user {
            RefreshToken::revoke_all_for_user(&mut *tx, user.id).await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    /// Delete unverified accounts matching an email; returns the row count.
    pub async fn delete_unverified_by_email(db: &PgPool, email: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "DELETE FROM users WHERE email = $1 AND is_verified = FALSE",
        )
        .bind(email.trim().to_lowercase())
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}

impl RefreshToken {
    pub async fn create(
        db: &PgPool,
        token: &str,
        user_id: i64,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<RefreshToken> {
        let row = sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (token, user_id, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, token, user_id, expires_at, created_at",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn find(db: &PgPool, token: &str) -> anyhow::Result<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, token, user_id, expires_at, created_at
             FROM refresh_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Revoke one token. Deleting a token that no longer exists is a no-op.
    pub async fn revoke(db: &PgPool, token: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Revoke every token a user owns. Idempotent. Takes any executor so it
    /// can run inside the password-change transaction.
    pub async fn revoke_all_for_user<'e, E>(executor: E, user_id: i64) -> anyhow::Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
