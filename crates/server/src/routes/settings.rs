//! Profile, password, device, and connected-account settings handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierhub_core::{Email, Username};

use crate::db::AccountRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Provider, PublicUser, SessionView};
use crate::services::rate_limit::{MUTATION_MAX, MUTATION_WINDOW};
use crate::services::{AuthService, SessionService};
use crate::state::AppState;

/// Return the active user.
///
/// # Route
///
/// `GET /api/me`
pub async fn me(auth: RequireUser) -> Json<PublicUser> {
    Json(auth.user)
}

/// List the user's devices: every session where they are active or saved.
///
/// # Route
///
/// `GET /api/settings/sessions`
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<Vec<SessionView>>> {
    let sessions = SessionService::new(state.pool())
        .list_sessions_for_user(auth.user.id, &auth.sid)
        .await?;

    Ok(Json(sessions))
}

/// Revoke-session body.
#[derive(Debug, Deserialize)]
pub struct RevokeSessionRequest {
    pub sid: String,
}

/// Revoke one device: log this user out there and forget the account on it.
///
/// # Route
///
/// `POST /api/settings/sessions/revoke`
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(body): Json<RevokeSessionRequest>,
) -> Result<StatusCode> {
    SessionService::new(state.pool())
        .revoke_session(&body.sid, auth.user.id)
        .await?;

    tracing::info!(user_id = %auth.user.id, "Session revoked");

    Ok(StatusCode::NO_CONTENT)
}

/// Revoke every session except the caller's.
///
/// # Route
///
/// `POST /api/settings/sessions/revoke-others`
pub async fn revoke_other_sessions(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<StatusCode> {
    SessionService::new(state.pool())
        .revoke_all_other_sessions(auth.user.id, &auth.sid)
        .await?;

    tracing::info!(user_id = %auth.user.id, "All other sessions revoked");

    Ok(StatusCode::NO_CONTENT)
}

/// A linked provider as shown in settings. Never exposes the access token.
#[derive(Debug, Serialize)]
pub struct ConnectedAccount {
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
}

/// List the user's linked providers.
///
/// # Route
///
/// `GET /api/settings/connected-accounts`
pub async fn connected_accounts(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<Vec<ConnectedAccount>>> {
    let links = AccountRepository::new(state.pool())
        .list_for_user(auth.user.id)
        .await?;

    Ok(Json(
        links
            .into_iter()
            .map(|link| ConnectedAccount {
                provider: link.provider,
                created_at: link.created_at,
            })
            .collect(),
    ))
}

/// Profile update body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
}

/// Update the active user's profile.
///
/// # Route
///
/// `PUT /api/settings/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>> {
    state.rate_limiter().check_and_increment(
        &format!("settings:{}", auth.sid),
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

    let user = AuthService::new(state.pool())
        .update_profile(auth.user.id, &body.name, &email, username.as_ref())
        .await?;

    Ok(Json(PublicUser::from(user)))
}

/// Password change body.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Change the active user's password.
///
/// # Route
///
/// `PUT /api/settings/password`
pub async fn update_password(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<StatusCode> {
    state.rate_limiter().check_and_increment(
        &format!("settings:{}", auth.sid),
        MUTATION_MAX,
        MUTATION_WINDOW,
    )?;

    if body.new_password != body.confirm_password {
        return Err(AppError::BadRequest(
            "password confirmation does not match".to_owned(),
        ));
    }

    AuthService::new(state.pool())
        .change_password(auth.user.id, &body.current_password, &body.new_password)
        .await?;

    tracing::info!(user_id = %auth.user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
