//! Authentication extractors.
//!
//! `RequireUser` resolves the registry's active user for the request's sid
//! and rejects unauthenticated requests. `OptionalUser` never rejects.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::USER_AGENT, request::Parts},
    response::{IntoResponse, Response},
};

use crate::middleware::session::Sid;
use crate::models::PublicUser;
use crate::services::SessionService;
use crate::state::AppState;

/// Extractor that requires an authenticated user on this session.
pub struct RequireUser {
    pub sid: String,
    pub user: PublicUser,
}

/// Error returned when authentication is required but no user is active.
pub enum AuthRejection {
    /// No active user on this session.
    Unauthorized,
    /// Session layer missing or database failure while resolving.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn resolve_sid(parts: &mut Parts, state: &AppState) -> Result<String, AuthRejection> {
    // The Sid extractor owns the minting rule.
    let Sid(sid) = Sid::from_request_parts(parts, state)
        .await
        .map_err(|_| AuthRejection::Internal)?;

    Ok(sid)
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let sid = resolve_sid(parts, state).await?;

        let user = SessionService::new(state.pool())
            .resolve_current_user(&sid)
            .await
            .map_err(|_| AuthRejection::Internal)?
            .ok_or(AuthRejection::Unauthorized)?;

        Ok(Self { sid, user })
    }
}

/// Extractor that optionally resolves the active user.
///
/// Unlike `RequireUser`, this does not reject unauthenticated requests.
pub struct OptionalUser {
    pub sid: String,
    pub user: Option<PublicUser>,
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let sid = resolve_sid(parts, state).await?;

        let user = SessionService::new(state.pool())
            .resolve_current_user(&sid)
            .await
            .map_err(|_| AuthRejection::Internal)?;

        Ok(Self { sid, user })
    }
}

/// Client metadata captured on login for the device list.
pub struct ClientMeta {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);

        // First hop of X-Forwarded-For when behind the reverse proxy.
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_owned())
            .or_else(|| {
                parts
                    .headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(ToOwned::to_owned)
            });

        Ok(Self {
            user_agent,
            ip_address,
        })
    }
}
