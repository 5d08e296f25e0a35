//! Password reset token storage.
//!
//! Only SHA-256 hashes of tokens are stored; the raw token exists in the
//! emailed link alone.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use storekeep_core::UserId;

use super::RepositoryError;

/// Repository for password reset tokens.
pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new token hash for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO password_reset_token (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Whether an unused, unexpired token with this hash belongs to the user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_valid(
        &self,
        user_id: UserId,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let valid: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM password_reset_token
                WHERE user_id = $1 AND token_hash = $2
                  AND used_at IS NULL AND expires_at > $3
            )
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(now)
        .fetch_one(self.pool)
        .await?;
        Ok(valid)
    }

    /// Spend a token and set the new password hash in one transaction.
    ///
    /// Every other outstanding token for the user is spent too.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the token is unknown, used or expired.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn consume(
        &self,
        user_id: UserId,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            r"
            UPDATE password_reset_token
            SET used_at = $3
            WHERE user_id = $1 AND token_hash = $2
              AND used_at IS NULL AND expires_at > $3
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("UPDATE app_user SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE password_reset_token SET used_at = $2 WHERE user_id = $1 AND used_at IS NULL",
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
