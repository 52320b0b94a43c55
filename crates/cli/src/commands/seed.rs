//! Seed command: creates the root vendor and its developer account.
//!
//! Every other vendor hangs off the root vendor, and every user belongs to
//! a vendor, so a fresh database needs both rows before the server is
//! usable.
//!
//! # Environment Variables
//!
//! - `COURIERHUB_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use courierhub_core::{Email, UserRole};
use courierhub_server::db::create_pool;
use courierhub_server::services::auth::{AuthError, hash_password};
use courierhub_server::services::email::generate_password;
use courierhub_server::services::vendors::normalize_vendor_name;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Vendor already exists.
    #[error("Vendor already exists with name: {0}")]
    VendorExists(String),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hash(#[from] AuthError),
}

/// Create the root vendor and a developer user.
pub async fn run(
    vendor_name: &str,
    vendor_email: &str,
    vendor_address: &str,
    email: &str,
    name: &str,
    password: Option<&str>,
) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let vendor_email = Email::parse(vendor_email)
        .map_err(|_| SeedError::InvalidEmail(vendor_email.to_owned()))?;
    let email = Email::parse(email).map_err(|_| SeedError::InvalidEmail(email.to_owned()))?;
    let vendor_name = normalize_vendor_name(vendor_name);

    let database_url =
        super::database_url().ok_or(SeedError::MissingEnvVar("COURIERHUB_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    let existing_vendor: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM vendor WHERE vendor_name = $1")
            .bind(&vendor_name)
            .fetch_optional(&pool)
            .await?;
    if existing_vendor.is_some() {
        return Err(SeedError::VendorExists(vendor_name));
    }

    let existing_user: Option<(i32,)> = sqlx::query_as("SELECT id FROM app_user WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;
    if existing_user.is_some() {
        return Err(SeedError::UserExists(email.as_str().to_owned()));
    }

    let generated = password.is_none();
    let password = password.map_or_else(generate_password, str::to_owned);
    let password_hash = hash_password(&password)?;

    let mut tx = pool.begin().await?;

    let (vendor_id,): (i32,) = sqlx::query_as(
        "INSERT INTO vendor (vendor_name, vendor_address, vendor_email, main_vendor_id) \
         VALUES ($1, $2, $3, NULL) RETURNING id",
    )
    .bind(&vendor_name)
    .bind(vendor_address)
    .bind(vendor_email.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let (user_id,): (i32,) = sqlx::query_as(
        "INSERT INTO app_user (name, email, password_hash, role, vendor_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(name)
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(UserRole::Developer)
    .bind(vendor_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Seed complete!");
    tracing::info!("  Vendor: {} (ID: {})", vendor_name, vendor_id);
    tracing::info!("  Developer: {} (ID: {})", email.as_str(), user_id);
    if generated {
        tracing::info!("  Generated password: {}", password);
        tracing::warn!("Store this password now; it is not recoverable.");
    }

    Ok(())
}
