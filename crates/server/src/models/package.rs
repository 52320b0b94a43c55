//! Delivery package types.

use chrono::{DateTime, Utc};
use core::fmt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use courierhub_core::{PackageId, UserId, VendorId};

/// Payment method recorded when COD is zero at creation.
pub const PAYMENT_DIRECTLY_TO_VENDOR: &str = "DIRECTLY_TO_VENDOR";

/// Delivery status of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
    #[default]
    Pending,
    InTransit,
    Delivered,
    Returned,
    Cancelled,
}

impl PackageStatus {
    /// The wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Returned => "RETURNED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackageStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_TRANSIT" => Ok(Self::InTransit),
            "DELIVERED" => Ok(Self::Delivered),
            "RETURNED" => Ok(Self::Returned),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognized package status.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown package status: {0}")]
pub struct UnknownStatus(pub String);

/// A delivery package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Package's database ID.
    pub id: PackageId,
    /// Recipient name (UPPERCASE).
    pub customer_name: String,
    /// Recipient phone number.
    pub customer_number: String,
    /// Delivery address.
    pub customer_address: String,
    /// Cash on delivery amount.
    pub cod: Decimal,
    /// Delivery charge.
    pub delivery_charge: Decimal,
    /// Free-form remarks.
    pub remarks: Option<String>,
    /// Delivery status.
    pub status: PackageStatus,
    /// Vendor the package belongs to.
    pub vendor_id: VendorId,
    /// User who last changed the status.
    pub status_updated_by: Option<UserId>,
    /// Payment method, auto-filled when COD is zero.
    pub payment_method: Option<String>,
    /// User who verified the payment.
    pub payment_verified_by: Option<UserId>,
    /// When the package was created.
    pub created_at: DateTime<Utc>,
    /// When the package was last updated.
    pub updated_at: DateTime<Utc>,
}
