//! Push subscription repository.
//!
//! Bookkeeping only; delivery transport lives elsewhere.

use sqlx::PgPool;

use courierhub_core::UserId;

use super::RepositoryError;

/// Repository for push subscription operations.
pub struct PushSubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PushSubscriptionRepository<'a> {
    /// Create a new push subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a subscription for a user. Idempotent: re-subscribing with the
    /// same endpoint payload is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn subscribe(
        &self,
        user_id: UserId,
        subscription: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO push_subscription (user_id, subscription) VALUES ($1, $2) \
             ON CONFLICT (subscription) DO NOTHING",
        )
        .bind(user_id.as_i32())
        .bind(subscription)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a subscription by its payload.
    ///
    /// Returns `true` if a subscription was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unsubscribe(&self, subscription: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM push_subscription WHERE subscription = $1")
            .bind(subscription)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
