//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use courierhub_core::{Email, UserId, UserRole, Username, VendorId};

use super::RepositoryError;
use crate::models::User;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    username: Option<String>,
    email: String,
    password_hash: Option<String>,
    role: UserRole,
    vendor_id: i32,
    picture: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let username = row
            .username
            .as_deref()
            .map(Username::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
            })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            username,
            email,
            password_hash: row.password_hash,
            role: row.role,
            vendor_id: VendorId::new(row.vendor_id),
            picture: row.picture,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, username, email, password_hash, role, \
                            vendor_id, picture, created_at, updated_at";

/// Parameters for creating a new user.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub username: Option<Username>,
    pub email: Email,
    /// `None` when the account is created via invitation (setup pending).
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub vendor_id: VendorId,
    pub picture: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by login, which matches username OR email.
    ///
    /// The login is expected pre-normalized (lowercase), which the `Username`
    /// and `Email` parse paths guarantee.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_login(&self, login: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user WHERE username = $1 OR email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(login)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO app_user (name, username, email, password_hash, role, vendor_id, picture) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.name)
            .bind(new_user.username.as_ref().map(Username::as_str))
            .bind(new_user.email.as_str())
            .bind(new_user.password_hash.as_deref())
            .bind(new_user.role)
            .bind(new_user.vendor_id.as_i32())
            .bind(new_user.picture.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "email or username already taken"))?;

        row.try_into()
    }

    /// Update a user's profile fields (name, email, username).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or username is taken
    /// by another user.
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
        username: Option<&Username>,
    ) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE app_user \
             SET name = $1, email = $2, username = $3, updated_at = NOW() \
             WHERE id = $4 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(name)
            .bind(email.as_str())
            .bind(username.map(Username::as_str))
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "email or username already taken"))?;

        row.map_or(Err(RepositoryError::NotFound), TryInto::try_into)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE app_user SET password_hash = $1, updated_at = NOW() WHERE id = $2")
                .bind(password_hash)
                .bind(id.as_i32())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Replace the password hash for the user with the given email.
    ///
    /// Used by reset completion and invitation setup, where only the
    /// identifier from the verified token is known.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that email.
    pub async fn set_password_hash_by_email(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE app_user SET password_hash = $1, updated_at = NOW() WHERE email = $2",
        )
        .bind(password_hash)
        .bind(email.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// List all users belonging to any of the given vendors.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_vendors(
        &self,
        vendor_ids: &[VendorId],
    ) -> Result<Vec<User>, RepositoryError> {
        let ids: Vec<i32> = vendor_ids.iter().map(|id| id.as_i32()).collect();
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE vendor_id = ANY($1) ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&ids)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
