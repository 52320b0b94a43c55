//! Package route handlers, scoped to the caller's reachable vendors.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;

use courierhub_core::VendorId;

use crate::db::PackageRepository;
use crate::db::packages::NewPackage;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{PAYMENT_DIRECTLY_TO_VENDOR, Package};
use crate::services::VendorService;
use crate::services::rate_limit::{MUTATION_MAX, MUTATION_WINDOW};
use crate::state::AppState;

/// List packages across the caller's reachable vendors, newest first.
///
/// # Route
///
/// `GET /api/packages`
pub async fn list(State(state): State<AppState>, auth: RequireUser) -> Result<Json<Vec<Package>>> {
    let reachable = VendorService::new(state.pool())
        .reachable_vendor_ids(auth.user.vendor_id)
        .await?;

    let packages = PackageRepository::new(state.pool())
        .list_for_vendors(&reachable)
        .await?;

    Ok(Json(packages))
}

/// Package creation body.
#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    pub customer_name: String,
    pub customer_number: String,
    pub customer_address: String,
    pub cod: Decimal,
    pub delivery_charge: Decimal,
    pub remarks: Option<String>,
    /// Defaults to the caller's vendor.
    pub vendor_id: Option<VendorId>,
}

/// Create a package.
///
/// A zero-COD package is treated as paid directly to the vendor: payment
/// method and verifier are auto-filled and the delivery charge is zeroed.
///
/// # Route
///
/// `POST /api/packages`
pub async fn create(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(body): Json<CreatePackageRequest>,
) -> Result<Json<Package>> {
    state.rate_limiter().check_and_increment(
        &format!("mutate:{}", auth.sid),
        MUTATION_MAX,
        MUTATION_WINDOW,
    )?;

    let vendor_id = body.vendor_id.unwrap_or(auth.user.vendor_id);

    let reachable = VendorService::new(state.pool())
        .reachable_vendor_ids(auth.user.vendor_id)
        .await?;
    if !reachable.contains(&vendor_id) {
        return Err(AppError::Forbidden("vendor out of scope".to_owned()));
    }

    let prepaid = body.cod == Decimal::ZERO;
    let new_package = NewPackage {
        customer_name: body.customer_name.trim().to_uppercase(),
        customer_number: body.customer_number,
        customer_address: body.customer_address,
        cod: body.cod,
        delivery_charge: if prepaid {
            Decimal::ZERO
        } else {
            body.delivery_charge
        },
        remarks: body.remarks,
        vendor_id,
        payment_method: prepaid.then(|| PAYMENT_DIRECTLY_TO_VENDOR.to_owned()),
        payment_verified_by: prepaid.then_some(auth.user.id),
    };

    let package = PackageRepository::new(state.pool()).create(new_package).await?;

    tracing::info!(package_id = %package.id, vendor_id = %vendor_id, "Package created");

    Ok(Json(package))
}
