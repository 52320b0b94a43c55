//! Auth token repository.
//!
//! Rows only anchor uniqueness and single-use consumption; the expiry and
//! payload live inside the signed JWT string itself.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use courierhub_core::TokenId;

use super::RepositoryError;
use crate::models::{AuthToken, TokenType};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: i32,
    token: String,
    identifier: String,
    token_type: TokenType,
    created_at: DateTime<Utc>,
}

impl From<TokenRow> for AuthToken {
    fn from(row: TokenRow) -> Self {
        Self {
            id: TokenId::new(row.id),
            token: row.token,
            identifier: row.identifier,
            token_type: row.token_type,
            created_at: row.created_at,
        }
    }
}

const TOKEN_COLUMNS: &str = "id, token, identifier, token_type, created_at";

/// Repository for auth token operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a token, superseding any live token for the same
    /// (identifier, `token_type`) pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    pub async fn insert_superseding(
        &self,
        token: &str,
        identifier: &str,
        token_type: TokenType,
    ) -> Result<AuthToken, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM auth_token WHERE identifier = $1 AND token_type = $2")
            .bind(identifier)
            .bind(token_type)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO auth_token (token, identifier, token_type) \
             VALUES ($1, $2, $3) \
             RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(token)
            .bind(identifier)
            .bind(token_type)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Get a token row by the exact signed token string.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<AuthToken>, RepositoryError> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM auth_token WHERE token = $1");
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(token)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get the live token for an (identifier, `token_type`) pair.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for(
        &self,
        identifier: &str,
        token_type: TokenType,
    ) -> Result<Option<AuthToken>, RepositoryError> {
        let sql =
            format!("SELECT {TOKEN_COLUMNS} FROM auth_token WHERE identifier = $1 AND token_type = $2");
        let row = sqlx::query_as::<_, TokenRow>(&sql)
            .bind(identifier)
            .bind(token_type)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Consume (delete) a token. Single-use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the token was already consumed.
    pub async fn consume(&self, id: TokenId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_token WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
