//! Login, logout, saved-account, and invitation-setup route handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use courierhub_core::{Email, UserId, UserRole, Username};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{ClientMeta, Sid};
use crate::models::PublicUser;
use crate::services::rate_limit::{LOGIN_MAX, LOGIN_WINDOW, MUTATION_MAX, MUTATION_WINDOW};
use crate::services::{AuthService, SessionService, TokenService};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    pub password: String,
    /// Save this account on the device for quick switching.
    #[serde(default)]
    pub remember: bool,
}

/// Login with username or email plus password.
///
/// # Route
///
/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Sid(sid): Sid,
    meta: ClientMeta,
    Json(body): Json<LoginRequest>,
) -> Result<Json<PublicUser>> {
    state
        .rate_limiter()
        .check_and_increment(&format!("login:{sid}"), LOGIN_MAX, LOGIN_WINDOW)?;

    let user = AuthService::new(state.pool())
        .authenticate(&body.login, &body.password)
        .await?;

    SessionService::new(state.pool())
        .login(
            &sid,
            user.id,
            body.remember,
            meta.user_agent.as_deref(),
            meta.ip_address.as_deref(),
        )
        .await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, remember = body.remember, "User logged in");

    Ok(Json(PublicUser::from(user)))
}

/// Clear the active user on this session.
///
/// Saved accounts are left in place; the device still remembers them.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(State(state): State<AppState>, Sid(sid): Sid) -> Result<StatusCode> {
    SessionService::new(state.pool()).logout(&sid).await?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}

/// List the accounts saved on this device, most recent first.
///
/// # Route
///
/// `GET /auth/saved-accounts`
pub async fn saved_accounts(
    State(state): State<AppState>,
    Sid(sid): Sid,
) -> Result<Json<Vec<PublicUser>>> {
    let accounts = SessionService::new(state.pool()).saved_accounts(&sid).await?;
    Ok(Json(accounts))
}

/// Account-switch request body.
#[derive(Debug, Deserialize)]
pub struct SwitchAccountRequest {
    pub user_id: UserId,
}

/// Switch the active user to an account saved on this device.
///
/// # Route
///
/// `POST /auth/switch-account`
pub async fn switch_account(
    State(state): State<AppState>,
    Sid(sid): Sid,
    Json(body): Json<SwitchAccountRequest>,
) -> Result<Json<PublicUser>> {
    let sessions = SessionService::new(state.pool());
    sessions.switch_account(&sid, body.user_id).await?;

    let user = sessions
        .resolve_current_user(&sid)
        .await?
        .ok_or_else(|| AppError::Unauthorized("no active user after switch".to_owned()))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(user))
}

/// Remove an account from this device's saved list.
///
/// Does not log the account out if it is currently active.
///
/// # Route
///
/// `POST /auth/saved-accounts/remove`
pub async fn remove_saved_account(
    State(state): State<AppState>,
    Sid(sid): Sid,
    Json(body): Json<SwitchAccountRequest>,
) -> Result<StatusCode> {
    SessionService::new(state.pool())
        .remove_saved_account(&sid, body.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Invitation token in the query string.
#[derive(Debug, Deserialize)]
pub struct InviteTokenQuery {
    pub token: String,
}

/// Prefill data decoded from a valid invitation.
#[derive(Debug, Serialize)]
pub struct InvitePrefill {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub vendor_name: String,
}

/// Decode an invitation token for the setup form.
///
/// # Route
///
/// `GET /auth/register?token=...`
pub async fn register_prefill(
    State(state): State<AppState>,
    Query(query): Query<InviteTokenQuery>,
) -> Result<Json<InvitePrefill>> {
    let config = state.config();
    let tokens = TokenService::new(
        state.pool(),
        &config.reset_token_secret,
        &config.invite_token_secret,
    );

    let (_, claims) = tokens.verify_invite(&query.token).await?;

    Ok(Json(InvitePrefill {
        name: claims.name,
        email: claims.sub,
        role: claims.role,
        vendor_name: claims.vendor_name,
    }))
}

/// Invited-account setup body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Complete invited account setup: the invitee picks a username and
/// password for the pending account the invitation created.
///
/// The account is logged in on this device afterwards.
///
/// # Route
///
/// `POST /auth/register?token=...`
pub async fn register_complete(
    State(state): State<AppState>,
    Sid(sid): Sid,
    meta: ClientMeta,
    Query(query): Query<InviteTokenQuery>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<PublicUser>> {
    state
        .rate_limiter()
        .check_and_increment(&format!("register:{sid}"), MUTATION_MAX, MUTATION_WINDOW)?;

    let config = state.config();
    let tokens = TokenService::new(
        state.pool(),
        &config.reset_token_secret,
        &config.invite_token_secret,
    );

    let (token_id, claims) = tokens.verify_invite(&query.token).await?;

    let email = Email::parse(&claims.sub).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let username =
        Username::parse(&body.username).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let auth = AuthService::new(state.pool());
    let pending = auth
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("invited account no longer exists".to_owned()))?;

    auth.set_password_by_email(&email, &body.password).await?;
    let user = auth
        .update_profile(pending.id, &pending.name, &email, Some(&username))
        .await?;

    tokens.consume(token_id).await?;

    SessionService::new(state.pool())
        .login(
            &sid,
            user.id,
            false,
            meta.user_agent.as_deref(),
            meta.ip_address.as_deref(),
        )
        .await?;

    tracing::info!(user_id = %user.id, "Invited account setup completed");

    Ok(Json(PublicUser::from(user)))
}
