//! Vendor management route handlers.
//!
//! All reads are scoped to the caller's reachable set: a vendor's users see
//! their own vendor and everything beneath it, never siblings or ancestors.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use courierhub_core::{Email, UserRole, Username, VendorId};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Vendor;
use crate::services::email::generate_password;
use crate::services::rate_limit::{MUTATION_MAX, MUTATION_WINDOW};
use crate::services::{AuthService, VendorService};
use crate::state::AppState;

use super::require_role;

/// List every vendor reachable from the caller's vendor.
///
/// # Route
///
/// `GET /api/vendors`
pub async fn list(State(state): State<AppState>, auth: RequireUser) -> Result<Json<Vec<Vendor>>> {
    require_role(&auth, &[UserRole::Superuser, UserRole::Adminuser])?;

    let vendors = VendorService::new(state.pool())
        .reachable_vendors(auth.user.vendor_id)
        .await?;

    Ok(Json(vendors))
}

/// Vendor creation body.
#[derive(Debug, Deserialize)]
pub struct CreateVendorRequest {
    pub vendor_name: String,
    pub vendor_address: String,
    pub vendor_email: String,
    /// Parent vendor; defaults to the caller's own vendor.
    pub main_vendor_id: Option<VendorId>,
}

/// Create a sub-vendor plus its admin account, and mail the vendor its
/// issued credentials.
///
/// # Route
///
/// `POST /api/vendors`
pub async fn create(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(body): Json<CreateVendorRequest>,
) -> Result<Json<Vendor>> {
    require_role(&auth, &[UserRole::Superuser, UserRole::Adminuser])?;
    state.rate_limiter().check_and_increment(
        &format!("mutate:{}", auth.sid),
        MUTATION_MAX,
        MUTATION_WINDOW,
    )?;

    let vendor_email =
        Email::parse(&body.vendor_email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let parent = body.main_vendor_id.unwrap_or(auth.user.vendor_id);

    // The parent must itself be reachable by the caller.
    let vendor_service = VendorService::new(state.pool());
    let reachable = vendor_service
        .reachable_vendor_ids(auth.user.vendor_id)
        .await?;
    if !reachable.contains(&parent) {
        return Err(AppError::Forbidden("parent vendor out of scope".to_owned()));
    }

    let vendor = vendor_service
        .create(
            &body.vendor_name,
            &body.vendor_address,
            &vendor_email,
            Some(parent),
        )
        .await?;

    let password = generate_password();
    let username = username_from_vendor_name(&vendor.vendor_name);

    let admin = AuthService::new(state.pool())
        .create_user(
            &vendor.vendor_name,
            vendor.vendor_email.clone(),
            username,
            &password,
            UserRole::Adminuser,
            vendor.id,
        )
        .await?;

    let login_name = admin
        .username
        .as_ref()
        .map_or_else(|| admin.email.as_str().to_owned(), ToString::to_string);

    state
        .email()
        .send_vendor_welcome(
            vendor.vendor_email.as_str(),
            &vendor.vendor_name,
            &login_name,
            &password,
        )
        .await?;

    tracing::info!(vendor_id = %vendor.id, admin_id = %admin.id, "Vendor created");

    Ok(Json(vendor))
}

/// Get one vendor, if it is in the caller's reachable set.
///
/// # Route
///
/// `GET /api/vendors/{id}`
pub async fn get(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<VendorId>,
) -> Result<Json<Vendor>> {
    let vendor_service = VendorService::new(state.pool());
    let reachable = vendor_service
        .reachable_vendor_ids(auth.user.vendor_id)
        .await?;

    // Out-of-scope vendors look like they don't exist.
    if !reachable.contains(&id) {
        return Err(AppError::NotFound(format!("vendor {id}")));
    }

    let vendor = vendor_service.get(id).await?;
    Ok(Json(vendor))
}

/// Vendor update body.
#[derive(Debug, Deserialize)]
pub struct UpdateVendorRequest {
    pub vendor_address: String,
    pub vendor_email: String,
}

/// Update a vendor's address and contact email. Restricted to the caller's
/// own vendor.
///
/// # Route
///
/// `PUT /api/vendors/{id}`
pub async fn update(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<VendorId>,
    Json(body): Json<UpdateVendorRequest>,
) -> Result<Json<Vendor>> {
    require_role(&auth, &[UserRole::Superuser, UserRole::Adminuser])?;
    state.rate_limiter().check_and_increment(
        &format!("mutate:{}", auth.sid),
        MUTATION_MAX,
        MUTATION_WINDOW,
    )?;

    if id != auth.user.vendor_id {
        return Err(AppError::Forbidden(
            "can only update your own vendor".to_owned(),
        ));
    }

    let vendor_email =
        Email::parse(&body.vendor_email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let vendor = VendorService::new(state.pool())
        .update(id, &body.vendor_address, &vendor_email)
        .await?;

    Ok(Json(vendor))
}

/// Derive a username from a vendor name, if one can be formed.
///
/// Unparseable results fall back to `None`; the account then logs in by
/// email.
fn username_from_vendor_name(vendor_name: &str) -> Option<Username> {
    let candidate: String = vendor_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '.' })
        .collect();
    let mut candidate = candidate.trim_matches('.').to_owned();
    while candidate.contains("..") {
        candidate = candidate.replace("..", ".");
    }

    Username::parse(&candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_derived_from_vendor_name() {
        let username = username_from_vendor_name("Acme Logistics").expect("parseable");
        assert_eq!(username.as_str(), "acme.logistics");
    }

    #[test]
    fn test_separator_runs_collapse_to_one_dot() {
        let username = username_from_vendor_name("Acme - Logistics").expect("parseable");
        assert_eq!(username.as_str(), "acme.logistics");

        let username = username_from_vendor_name("A...B").expect("parseable");
        assert_eq!(username.as_str(), "a.b");
    }

    #[test]
    fn test_unusable_vendor_name_yields_none() {
        assert!(username_from_vendor_name("株式会社").is_none());
        assert!(username_from_vendor_name("a").is_none());
    }
}
