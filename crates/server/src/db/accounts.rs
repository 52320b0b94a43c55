//! OAuth linked-account repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use courierhub_core::{AccountId, UserId};

use super::RepositoryError;
use crate::models::{LinkedAccount, Provider};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i32,
    provider: String,
    provider_account_id: String,
    user_id: i32,
    access_token: String,
    expires_in: Option<i32>,
    scope: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for LinkedAccount {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let provider = row.provider.parse::<Provider>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid provider in database: {e}"))
        })?;

        Ok(Self {
            id: AccountId::new(row.id),
            provider,
            provider_account_id: row.provider_account_id,
            user_id: UserId::new(row.user_id),
            access_token: row.access_token,
            expires_in: row.expires_in,
            scope: row.scope,
            created_at: row.created_at,
        })
    }
}

const ACCOUNT_COLUMNS: &str = "id, provider, provider_account_id, user_id, access_token, \
                               expires_in, scope, created_at";

/// Parameters for creating an OAuth link.
#[derive(Debug)]
pub struct NewLink {
    pub provider: Provider,
    pub provider_account_id: String,
    pub user_id: UserId,
    pub access_token: String,
    pub expires_in: Option<i32>,
    pub scope: Option<String>,
}

/// Repository for OAuth linked-account operations.
pub struct AccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a link by the provider's account identifier.
    ///
    /// `provider_account_id` is globally unique, so this also answers
    /// "is this identity linked to anyone?".
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_provider_account_id(
        &self,
        provider_account_id: &str,
    ) -> Result<Option<LinkedAccount>, RepositoryError> {
        let sql =
            format!("SELECT {ACCOUNT_COLUMNS} FROM linked_account WHERE provider_account_id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(provider_account_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Find a user's link for a given provider.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        provider: Provider,
    ) -> Result<Option<LinkedAccount>, RepositoryError> {
        let sql =
            format!("SELECT {ACCOUNT_COLUMNS} FROM linked_account WHERE user_id = $1 AND provider = $2");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(user_id.as_i32())
            .bind(provider.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all links for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LinkedAccount>, RepositoryError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM linked_account WHERE user_id = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(user_id.as_i32())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create a new OAuth link.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the provider identity is
    /// already linked, or the user already has a link for this provider.
    pub async fn create(&self, link: NewLink) -> Result<LinkedAccount, RepositoryError> {
        let sql = format!(
            "INSERT INTO linked_account \
                 (provider, provider_account_id, user_id, access_token, expires_in, scope) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(link.provider.as_str())
            .bind(&link.provider_account_id)
            .bind(link.user_id.as_i32())
            .bind(&link.access_token)
            .bind(link.expires_in)
            .bind(link.scope.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "provider identity already linked"))?;

        row.try_into()
    }

    /// Delete a user's link for a provider.
    ///
    /// Returns `true` if a link was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_user(
        &self,
        user_id: UserId,
        provider: Provider,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM linked_account WHERE user_id = $1 AND provider = $2")
            .bind(user_id.as_i32())
            .bind(provider.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
