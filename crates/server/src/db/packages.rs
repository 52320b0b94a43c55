//! Package repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use courierhub_core::{PackageId, UserId, VendorId};

use super::RepositoryError;
use crate::models::{Package, PackageStatus};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct PackageRow {
    id: i32,
    customer_name: String,
    customer_number: String,
    customer_address: String,
    cod: Decimal,
    delivery_charge: Decimal,
    remarks: Option<String>,
    status: String,
    vendor_id: i32,
    status_updated_by: Option<i32>,
    payment_method: Option<String>,
    payment_verified_by: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PackageRow> for Package {
    type Error = RepositoryError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<PackageStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid package status in database: {e}"))
        })?;

        Ok(Self {
            id: PackageId::new(row.id),
            customer_name: row.customer_name,
            customer_number: row.customer_number,
            customer_address: row.customer_address,
            cod: row.cod,
            delivery_charge: row.delivery_charge,
            remarks: row.remarks,
            status,
            vendor_id: VendorId::new(row.vendor_id),
            status_updated_by: row.status_updated_by.map(UserId::new),
            payment_method: row.payment_method,
            payment_verified_by: row.payment_verified_by.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PACKAGE_COLUMNS: &str = "id, customer_name, customer_number, customer_address, cod, \
                               delivery_charge, remarks, status, vendor_id, status_updated_by, \
                               payment_method, payment_verified_by, created_at, updated_at";

/// Parameters for creating a package.
#[derive(Debug)]
pub struct NewPackage {
    pub customer_name: String,
    pub customer_number: String,
    pub customer_address: String,
    pub cod: Decimal,
    pub delivery_charge: Decimal,
    pub remarks: Option<String>,
    pub vendor_id: VendorId,
    pub payment_method: Option<String>,
    pub payment_verified_by: Option<UserId>,
}

/// Repository for package operations.
pub struct PackageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PackageRepository<'a> {
    /// Create a new package repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a package by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: PackageId) -> Result<Option<Package>, RepositoryError> {
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM package WHERE id = $1");
        let row = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a package (status starts PENDING).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new_package: NewPackage) -> Result<Package, RepositoryError> {
        let sql = format!(
            "INSERT INTO package \
                 (customer_name, customer_number, customer_address, cod, delivery_charge, \
                  remarks, vendor_id, payment_method, payment_verified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PACKAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(&new_package.customer_name)
            .bind(&new_package.customer_number)
            .bind(&new_package.customer_address)
            .bind(new_package.cod)
            .bind(new_package.delivery_charge)
            .bind(new_package.remarks.as_deref())
            .bind(new_package.vendor_id.as_i32())
            .bind(new_package.payment_method.as_deref())
            .bind(new_package.payment_verified_by.map(|id| id.as_i32()))
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// List packages for any of the given vendors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_vendors(
        &self,
        vendor_ids: &[VendorId],
    ) -> Result<Vec<Package>, RepositoryError> {
        let ids: Vec<i32> = vendor_ids.iter().map(|id| id.as_i32()).collect();
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM package WHERE vendor_id = ANY($1) ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, PackageRow>(&sql)
            .bind(&ids)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
