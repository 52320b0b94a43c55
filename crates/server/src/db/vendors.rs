//! Vendor repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use courierhub_core::{Email, VendorId};

use super::RepositoryError;
use crate::models::Vendor;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct VendorRow {
    id: i32,
    vendor_name: String,
    vendor_address: String,
    vendor_email: String,
    main_vendor_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VendorRow> for Vendor {
    type Error = RepositoryError;

    fn try_from(row: VendorRow) -> Result<Self, Self::Error> {
        let vendor_email = Email::parse(&row.vendor_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid vendor email in database: {e}"))
        })?;

        Ok(Self {
            id: VendorId::new(row.id),
            vendor_name: row.vendor_name,
            vendor_address: row.vendor_address,
            vendor_email,
            main_vendor_id: row.main_vendor_id.map(VendorId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const VENDOR_COLUMNS: &str =
    "id, vendor_name, vendor_address, vendor_email, main_vendor_id, created_at, updated_at";

/// Repository for vendor database operations.
pub struct VendorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VendorRepository<'a> {
    /// Create a new vendor repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a vendor by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendor WHERE id = $1");
        let row = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a vendor by its name (stored UPPERCASE).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, vendor_name: &str) -> Result<Option<Vendor>, RepositoryError> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendor WHERE vendor_name = $1");
        let row = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(vendor_name)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new vendor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name or email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        vendor_name: &str,
        vendor_address: &str,
        vendor_email: &Email,
        main_vendor_id: Option<VendorId>,
    ) -> Result<Vendor, RepositoryError> {
        let sql = format!(
            "INSERT INTO vendor (vendor_name, vendor_address, vendor_email, main_vendor_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {VENDOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(vendor_name)
            .bind(vendor_address)
            .bind(vendor_email.as_str())
            .bind(main_vendor_id.map(|id| id.as_i32()))
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "vendor name or email already taken"))?;

        row.try_into()
    }

    /// Update a vendor's address and contact email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    /// Returns `RepositoryError::NotFound` if the vendor doesn't exist.
    pub async fn update(
        &self,
        id: VendorId,
        vendor_address: &str,
        vendor_email: &Email,
    ) -> Result<Vendor, RepositoryError> {
        let sql = format!(
            "UPDATE vendor \
             SET vendor_address = $1, vendor_email = $2, updated_at = NOW() \
             WHERE id = $3 \
             RETURNING {VENDOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(vendor_address)
            .bind(vendor_email.as_str())
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "vendor email already taken"))?;

        row.map_or(Err(RepositoryError::NotFound), TryInto::try_into)
    }

    /// List direct children of a vendor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn children_of(&self, id: VendorId) -> Result<Vec<VendorId>, RepositoryError> {
        let ids: Vec<(i32,)> = sqlx::query_as("SELECT id FROM vendor WHERE main_vendor_id = $1")
            .bind(id.as_i32())
            .fetch_all(self.pool)
            .await?;

        Ok(ids.into_iter().map(|(id,)| VendorId::new(id)).collect())
    }

    /// List vendors by ID set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(|id| id.as_i32()).collect();
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendor WHERE id = ANY($1) ORDER BY id");
        let rows = sqlx::query_as::<_, VendorRow>(&sql)
            .bind(&raw)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
