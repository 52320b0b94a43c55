//! User management route handlers.
//!
//! Creation supports three flows: direct (the admin supplies the password),
//! issued (a 12-char password is generated and emailed), and invitation (a
//! signed setup token is emailed; no password exists until setup completes).

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use courierhub_core::{Email, UserId, UserRole, Username, VendorId};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::PublicUser;
use crate::services::email::generate_password;
use crate::services::rate_limit::{MUTATION_MAX, MUTATION_WINDOW};
use crate::services::{AuthService, TokenService, VendorService};
use crate::state::AppState;

use super::require_role;

/// List users across the caller's reachable vendors.
///
/// # Route
///
/// `GET /api/users`
pub async fn list(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<Vec<PublicUser>>> {
    require_role(&auth, &[UserRole::Superuser, UserRole::Adminuser])?;

    let reachable = VendorService::new(state.pool())
        .reachable_vendor_ids(auth.user.vendor_id)
        .await?;

    let users = crate::db::UserRepository::new(state.pool())
        .list_by_vendors(&reachable)
        .await?;

    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/// User creation body.
///
/// With `invite` set, `password` is ignored and an invitation is emailed.
/// Without it, a missing `password` means one is generated and emailed.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: UserRole,
    /// Defaults to the caller's vendor.
    pub vendor_id: Option<VendorId>,
    #[serde(default)]
    pub invite: bool,
}

/// Create or invite a user under a reachable vendor.
///
/// # Route
///
/// `POST /api/users`
pub async fn create(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<PublicUser>> {
    require_role(&auth, &[UserRole::Superuser, UserRole::Adminuser])?;
    state.rate_limiter().check_and_increment(
        &format!("mutate:{}", auth.sid),
        MUTATION_MAX,
        MUTATION_WINDOW,
    )?;

    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let username = body
        .username
        .as_deref()
        .map(Username::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let vendor_id = body.vendor_id.unwrap_or(auth.user.vendor_id);

    let vendor_service = VendorService::new(state.pool());
    let reachable = vendor_service
        .reachable_vendor_ids(auth.user.vendor_id)
        .await?;
    if !reachable.contains(&vendor_id) {
        return Err(AppError::Forbidden("vendor out of scope".to_owned()));
    }

    if body.invite {
        let vendor = vendor_service.get(vendor_id).await?;
        let config = state.config();

        let token = TokenService::new(
            state.pool(),
            &config.reset_token_secret,
            &config.invite_token_secret,
        )
        .issue_invite(&body.name, &email, body.role, &vendor.vendor_name)
        .await?;

        state
            .email()
            .send_invitation(email.as_str(), &body.name, &vendor.vendor_name, &token.token)
            .await?;

        // Pending row: no password hash or username until setup completes.
        let pending = crate::db::users::NewUser {
            name: body.name.clone(),
            username: None,
            email,
            password_hash: None,
            role: body.role,
            vendor_id,
            picture: None,
        };
        let user = crate::db::UserRepository::new(state.pool())
            .create(pending)
            .await
            .map_err(|e| match e {
                crate::db::RepositoryError::Conflict(msg) => AppError::Conflict(msg),
                other => AppError::Database(other),
            })?;

        tracing::info!(user_id = %user.id, "User invited");

        return Ok(Json(PublicUser::from(user)));
    }

    let (password, issued) = match body.password {
        Some(p) => (p, false),
        None => (generate_password(), true),
    };

    let user = AuthService::new(state.pool())
        .create_user(&body.name, email, username, &password, body.role, vendor_id)
        .await?;

    if issued {
        let login_name = user
            .username
            .as_ref()
            .map_or_else(|| user.email.as_str().to_owned(), ToString::to_string);

        state
            .email()
            .send_user_credentials(user.email.as_str(), &user.name, &login_name, &password)
            .await?;
    }

    tracing::info!(user_id = %user.id, issued_password = issued, "User created");

    Ok(Json(PublicUser::from(user)))
}

/// Get one user, if they belong to a reachable vendor.
///
/// # Route
///
/// `GET /api/users/{id}`
pub async fn get(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<UserId>,
) -> Result<Json<PublicUser>> {
    let user = AuthService::new(state.pool()).get_user(id).await?;

    let reachable = VendorService::new(state.pool())
        .reachable_vendor_ids(auth.user.vendor_id)
        .await?;
    // Out-of-scope users look like they don't exist.
    if !reachable.contains(&user.vendor_id) {
        return Err(AppError::NotFound(format!("user {id}")));
    }

    Ok(Json(PublicUser::from(user)))
}
