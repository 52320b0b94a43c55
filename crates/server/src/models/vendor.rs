//! Vendor types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierhub_core::{Email, VendorId};

/// A vendor (business) in the vendor forest.
///
/// `main_vendor_id` points at the parent vendor; `None` marks a root.
/// Vendor names are stored UPPERCASE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    /// Vendor's database ID.
    pub id: VendorId,
    /// Business name (unique, UPPERCASE).
    pub vendor_name: String,
    /// Business address.
    pub vendor_address: String,
    /// Contact email (unique, lowercase).
    pub vendor_email: Email,
    /// Parent vendor, `None` for roots.
    pub main_vendor_id: Option<VendorId>,
    /// When the vendor was created.
    pub created_at: DateTime<Utc>,
    /// When the vendor was last updated.
    pub updated_at: DateTime<Utc>,
}
