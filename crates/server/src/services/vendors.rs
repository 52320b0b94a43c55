//! Vendor forest: creation, updates, and the reachable-set walk that scopes
//! what a vendor's users may see.

use std::collections::{HashSet, VecDeque};

use sqlx::PgPool;
use thiserror::Error;

use courierhub_core::{Email, VendorId};

use crate::db::{RepositoryError, VendorRepository};
use crate::models::Vendor;

/// Errors that can occur in the vendor service.
#[derive(Debug, Error)]
pub enum VendorError {
    /// Vendor not found.
    #[error("vendor not found")]
    NotFound,

    /// Name or email already taken.
    #[error("{0}")]
    Conflict(String),

    /// A vendor cannot be its own parent.
    #[error("a vendor cannot be its own parent")]
    SelfParent,

    /// Named parent vendor doesn't exist.
    #[error("parent vendor not found")]
    ParentNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Vendor service.
pub struct VendorService<'a> {
    vendors: VendorRepository<'a>,
}

impl<'a> VendorService<'a> {
    /// Create a new vendor service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            vendors: VendorRepository::new(pool),
        }
    }

    /// Get a vendor by ID.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::NotFound` if the vendor doesn't exist.
    pub async fn get(&self, id: VendorId) -> Result<Vendor, VendorError> {
        self.vendors
            .get_by_id(id)
            .await?
            .ok_or(VendorError::NotFound)
    }

    /// Get a vendor by its name (normalized UPPERCASE before lookup).
    ///
    /// # Errors
    ///
    /// Returns `VendorError::NotFound` if no vendor has that name.
    pub async fn get_by_name(&self, vendor_name: &str) -> Result<Vendor, VendorError> {
        let name = normalize_vendor_name(vendor_name);
        self.vendors
            .get_by_name(&name)
            .await?
            .ok_or(VendorError::NotFound)
    }

    /// Create a vendor, optionally under a parent.
    ///
    /// The name is normalized UPPERCASE. Names are unique, so a parent
    /// carrying the new vendor's name is the create-time shape of a
    /// self-parent; it is reported as `SelfParent` ahead of the insert
    /// instead of surfacing as a unique-name `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::Conflict` if the name or email is taken,
    /// `VendorError::SelfParent` if the parent has the new vendor's name,
    /// `VendorError::ParentNotFound` if the parent doesn't exist.
    pub async fn create(
        &self,
        vendor_name: &str,
        vendor_address: &str,
        vendor_email: &Email,
        main_vendor_id: Option<VendorId>,
    ) -> Result<Vendor, VendorError> {
        let name = normalize_vendor_name(vendor_name);

        if let Some(parent_id) = main_vendor_id {
            let parent = self
                .vendors
                .get_by_id(parent_id)
                .await?
                .ok_or(VendorError::ParentNotFound)?;
            if parent.vendor_name == name {
                return Err(VendorError::SelfParent);
            }
        }

        self.vendors
            .create(&name, vendor_address, vendor_email, main_vendor_id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(msg) => VendorError::Conflict(msg),
                other => VendorError::Repository(other),
            })
    }

    /// Update a vendor's address and contact email.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::NotFound` if the vendor doesn't exist,
    /// `VendorError::Conflict` if the email is taken.
    pub async fn update(
        &self,
        id: VendorId,
        vendor_address: &str,
        vendor_email: &Email,
    ) -> Result<Vendor, VendorError> {
        self.vendors
            .update(id, vendor_address, vendor_email)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => VendorError::NotFound,
                RepositoryError::Conflict(msg) => VendorError::Conflict(msg),
                other => VendorError::Repository(other),
            })
    }

    /// Compute the set of vendors reachable from `root` by following child
    /// edges, root included. Breadth-first with a visited set, so a
    /// corrupted parent pointer cycling back never loops the walk.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::Repository` if a query fails.
    pub async fn reachable_vendor_ids(&self, root: VendorId) -> Result<Vec<VendorId>, VendorError> {
        let mut visited: HashSet<VendorId> = HashSet::new();
        let mut order: Vec<VendorId> = Vec::new();
        let mut queue: VecDeque<VendorId> = VecDeque::new();

        visited.insert(root);
        order.push(root);
        queue.push_back(root);

        while let Some(current) = queue.pop_front() {
            for child in self.vendors.children_of(current).await? {
                if visited.insert(child) {
                    order.push(child);
                    queue.push_back(child);
                }
            }
        }

        Ok(order)
    }

    /// List the full vendor records reachable from `root`.
    ///
    /// # Errors
    ///
    /// Returns `VendorError::Repository` if a query fails.
    pub async fn reachable_vendors(&self, root: VendorId) -> Result<Vec<Vendor>, VendorError> {
        let ids = self.reachable_vendor_ids(root).await?;
        Ok(self.vendors.list_by_ids(&ids).await?)
    }
}

/// Normalize a vendor name for storage and lookup.
#[must_use]
pub fn normalize_vendor_name(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_name_normalized_uppercase() {
        assert_eq!(normalize_vendor_name("  Acme Logistics "), "ACME LOGISTICS");
        assert_eq!(normalize_vendor_name("ACME"), "ACME");
    }
}
