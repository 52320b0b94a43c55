//! Password-reset route handlers.
//!
//! Three-step flow: request (emails a signed link plus a 6-digit OTP),
//! optional OTP pre-check for the form, and completion. Possession can be
//! proved with either the full token or the OTP; both share one lookup and
//! one consumption.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use courierhub_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::Sid;
use crate::services::rate_limit::{RESET_REQUEST_MAX, RESET_REQUEST_WINDOW};
use crate::services::{AuthService, TokenService};
use crate::state::AppState;

/// Reset-request body.
#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

/// Request a password reset.
///
/// Always answers 204 whether or not the email is registered, so the
/// endpoint can't be used to probe for accounts. Mail is only sent when a
/// user exists.
///
/// # Route
///
/// `POST /auth/reset-password/request`
pub async fn request(
    State(state): State<AppState>,
    Sid(sid): Sid,
    Json(body): Json<ResetRequest>,
) -> Result<StatusCode> {
    state.rate_limiter().check_and_increment(
        &format!("reset:{sid}"),
        RESET_REQUEST_MAX,
        RESET_REQUEST_WINDOW,
    )?;

    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let Some(user) = AuthService::new(state.pool())
        .get_user_by_email(&email)
        .await?
    else {
        tracing::info!("Password reset requested for unknown email");
        return Ok(StatusCode::NO_CONTENT);
    };

    let config = state.config();
    let tokens = TokenService::new(
        state.pool(),
        &config.reset_token_secret,
        &config.invite_token_secret,
    );

    let (token, otp) = tokens.issue_reset(&email).await?;

    state
        .email()
        .send_password_reset(email.as_str(), &user.name, &token.token, &otp)
        .await?;

    tracing::info!(user_id = %user.id, "Password reset email sent");

    Ok(StatusCode::NO_CONTENT)
}

/// OTP verification body.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Check an OTP against the live reset token without consuming it.
///
/// Lets the form validate the code before asking for a new password.
///
/// # Route
///
/// `POST /auth/reset-password/verify-otp`
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<StatusCode> {
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let config = state.config();
    TokenService::new(
        state.pool(),
        &config.reset_token_secret,
        &config.invite_token_secret,
    )
    .verify_possession(&email, &body.otp)
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Reset completion body. `proof` is the full token string or the OTP.
#[derive(Debug, Deserialize)]
pub struct CompleteResetRequest {
    pub email: String,
    pub proof: String,
    pub new_password: String,
}

/// Complete a password reset. Consumes the token on success.
///
/// # Route
///
/// `POST /auth/reset-password/complete`
pub async fn complete(
    State(state): State<AppState>,
    Json(body): Json<CompleteResetRequest>,
) -> Result<StatusCode> {
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let config = state.config();
    let tokens = TokenService::new(
        state.pool(),
        &config.reset_token_secret,
        &config.invite_token_secret,
    );

    let token_id = tokens.verify_possession(&email, &body.proof).await?;

    AuthService::new(state.pool())
        .set_password_by_email(&email, &body.new_password)
        .await?;

    tokens.consume(token_id).await?;

    tracing::info!("Password reset completed");

    Ok(StatusCode::NO_CONTENT)
}
