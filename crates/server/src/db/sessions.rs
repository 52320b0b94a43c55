//! Session registry repository.
//!
//! Saved accounts live in their own association table ordered by rank
//! (lowest rank = most recent). Prepending is a single conditional insert,
//! so concurrent logins on one sid never clobber each other's saved list.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use courierhub_core::UserId;

use super::RepositoryError;
use crate::models::SessionRecord;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    sid: String,
    current_user_id: Option<i32>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        Self {
            sid: row.sid,
            current_user_id: row.current_user_id.map(UserId::new),
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SESSION_COLUMNS: &str =
    "sid, current_user_id, user_agent, ip_address, created_at, updated_at";

/// Repository for session registry operations.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a registry row by sid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, RepositoryError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM session_registry WHERE sid = $1");
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(sid)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Record a login: upsert the registry row and set the active user.
    ///
    /// `user_agent` and `ip_address` are captured on first insert only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_login(
        &self,
        sid: &str,
        user_id: UserId,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO session_registry (sid, current_user_id, user_agent, ip_address) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (sid) DO UPDATE \
             SET current_user_id = EXCLUDED.current_user_id, updated_at = NOW()",
        )
        .bind(sid)
        .bind(user_id.as_i32())
        .bind(user_agent)
        .bind(ip_address)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set (or clear) the active user on a session.
    ///
    /// A missing registry row is a no-op: there is nothing to clear.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_current_user(
        &self,
        sid: &str,
        user_id: Option<UserId>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE session_registry SET current_user_id = $1, updated_at = NOW() WHERE sid = $2",
        )
        .bind(user_id.map(|id| id.as_i32()))
        .bind(sid)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Clear the active user on a session only if it matches `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_current_if(
        &self,
        sid: &str,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE session_registry SET current_user_id = NULL, updated_at = NOW() \
             WHERE sid = $1 AND current_user_id = $2",
        )
        .bind(sid)
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Prepend a user to the session's saved accounts if not already saved.
    ///
    /// New entries take `min(rank) - 1`, so the saved list reads
    /// most-recent-first when ordered by rank ascending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save_account(&self, sid: &str, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO saved_account (session_sid, user_id, rank) \
             SELECT $1, $2, \
                    COALESCE((SELECT MIN(rank) FROM saved_account WHERE session_sid = $1), 1) - 1 \
             ON CONFLICT (session_sid, user_id) DO NOTHING",
        )
        .bind(sid)
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Whether a user is saved on this session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_saved(&self, sid: &str, user_id: UserId) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM saved_account WHERE session_sid = $1 AND user_id = $2)",
        )
        .bind(sid)
        .bind(user_id.as_i32())
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// List saved user IDs for a session, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn saved_user_ids(&self, sid: &str) -> Result<Vec<UserId>, RepositoryError> {
        let ids: Vec<(i32,)> = sqlx::query_as(
            "SELECT user_id FROM saved_account WHERE session_sid = $1 ORDER BY rank ASC",
        )
        .bind(sid)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| UserId::new(id)).collect())
    }

    /// Remove a user from the session's saved accounts.
    ///
    /// Returns `true` if an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_saved(&self, sid: &str, user_id: UserId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM saved_account WHERE session_sid = $1 AND user_id = $2")
                .bind(sid)
                .bind(user_id.as_i32())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Disconnect a user from every session except `except_sid`.
    ///
    /// Clears `current_user_id` where the user is active and strips them
    /// from all other sessions' saved lists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    pub async fn revoke_for_user_except(
        &self,
        user_id: UserId,
        except_sid: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE session_registry SET current_user_id = NULL, updated_at = NOW() \
             WHERE current_user_id = $1 AND sid <> $2",
        )
        .bind(user_id.as_i32())
        .bind(except_sid)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM saved_account WHERE user_id = $1 AND session_sid <> $2")
            .bind(user_id.as_i32())
            .bind(except_sid)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// List all sessions where the user is active or saved, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sessions_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SessionRecord>, RepositoryError> {
        let sql = "SELECT DISTINCT s.sid, s.current_user_id, s.user_agent, s.ip_address, \
                          s.created_at, s.updated_at \
                   FROM session_registry s \
                   LEFT JOIN saved_account sa ON sa.session_sid = s.sid \
                   WHERE s.current_user_id = $1 OR sa.user_id = $1 \
                   ORDER BY s.updated_at DESC";
        let rows = sqlx::query_as::<_, SessionRow>(sql)
            .bind(user_id.as_i32())
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
