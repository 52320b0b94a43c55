//! Database operations for the CourierHub `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `app_user` - Accounts with credential auth and roles
//! - `vendor` - Vendor forest (`main_vendor_id` self-reference)
//! - `session_registry` - Browser-bound session rows keyed by sid
//! - `saved_account` - Multi-account list per session, ranked
//! - `auth_token` - Signed reset/invitation tokens
//! - `linked_account` - OAuth identity links
//! - `package` - Delivery packages scoped to vendors
//! - `push_subscription` - Push notification endpoints
//! - `tower_sessions` - Cookie session storage (tower-sessions)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p courierhub-cli -- migrate
//! ```

pub mod accounts;
pub mod packages;
pub mod push_subscriptions;
pub mod sessions;
pub mod tokens;
pub mod users;
pub mod vendors;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::AccountRepository;
pub use packages::PackageRepository;
pub use push_subscriptions::PushSubscriptionRepository;
pub use sessions::SessionRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;
pub use vendors::VendorRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into a `Conflict`.
    pub(crate) fn from_unique(e: sqlx::Error, conflict_msg: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_msg.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
