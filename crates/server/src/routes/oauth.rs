//! OAuth route handlers.
//!
//! Browser-facing flow: the start endpoint stores a CSRF state and the
//! requested action in the session, then redirects to the provider's
//! consent page. The callback validates the state (one-time use), exchanges
//! the code, and either logs in an already-linked user or links the
//! provider identity to the active user. OAuth never auto-creates accounts.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::db::AccountRepository;
use crate::db::accounts::NewLink;
use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::{ClientMeta, RequireUser, Sid};
use crate::models::{Provider, session_keys};
use crate::services::SessionService;
use crate::state::AppState;

/// Start-flow query parameters.
#[derive(Debug, Deserialize)]
pub struct StartQuery {
    /// `login` (default) or `link-account`.
    pub action: Option<String>,
}

/// Callback query parameters from the provider.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn parse_provider(raw: &str) -> Result<Provider> {
    raw.parse::<Provider>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Redirect to the provider's consent page.
///
/// # Route
///
/// `GET /oauth/{provider}?action=...`
pub async fn start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<StartQuery>,
    session: Session,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;

    let action = match query.action.as_deref() {
        None | Some("login") => "login",
        Some("link-account") => "link-account",
        Some(other) => {
            return Err(AppError::BadRequest(format!("unknown oauth action: {other}")));
        }
    };

    let oauth_state = Uuid::new_v4().to_string();
    session
        .insert(session_keys::OAUTH_STATE, &oauth_state)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    session
        .insert(session_keys::OAUTH_ACTION, action)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let url = state.oauth().authorize_url(provider, &oauth_state)?;

    Ok(Redirect::to(url.as_str()).into_response())
}

/// Handle the provider callback: login or link per the saved action.
///
/// # Route
///
/// `GET /oauth/{provider}/callback`
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    session: Session,
    Sid(sid): Sid,
    meta: ClientMeta,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(provider = %provider, "OAuth error: {error} - {description}");
        return Ok(Redirect::to("/login?error=oauth_denied").into_response());
    }

    let Some(code) = query.code else {
        tracing::warn!(provider = %provider, "OAuth callback missing code");
        return Ok(Redirect::to("/login?error=missing_code").into_response());
    };

    let Some(returned_state) = query.state else {
        tracing::warn!(provider = %provider, "OAuth callback missing state");
        return Ok(Redirect::to("/login?error=missing_state").into_response());
    };

    let stored_state: Option<String> = session
        .get(session_keys::OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if stored_state.as_ref() != Some(&returned_state) {
        tracing::warn!(provider = %provider, "OAuth state mismatch");
        return Ok(Redirect::to("/login?error=invalid_state").into_response());
    }

    // One-time use: clear state and action before doing anything else.
    let _ = session.remove::<String>(session_keys::OAUTH_STATE).await;
    let action: String = session
        .remove::<String>(session_keys::OAUTH_ACTION)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| "login".to_owned());

    let token = state.oauth().exchange_code(provider, &code).await?;
    let provider_user = state
        .oauth()
        .fetch_user(provider, &token.access_token)
        .await?;

    let accounts = AccountRepository::new(state.pool());

    if action == "link-account" {
        let Some(current) = SessionService::new(state.pool())
            .resolve_current_user(&sid)
            .await?
        else {
            return Ok(Redirect::to("/login?error=link_requires_login").into_response());
        };

        if accounts
            .get_by_provider_account_id(&provider_user.id)
            .await?
            .is_some()
        {
            return Ok(Redirect::to("/settings?error=identity_already_linked").into_response());
        }
        if accounts.get_for_user(current.id, provider).await?.is_some() {
            return Ok(Redirect::to("/settings?error=provider_already_linked").into_response());
        }

        accounts
            .create(NewLink {
                provider,
                provider_account_id: provider_user.id,
                user_id: current.id,
                access_token: token.access_token,
                expires_in: token.expires_in,
                scope: token.scope,
            })
            .await?;

        tracing::info!(user_id = %current.id, provider = %provider, "Provider identity linked");

        return Ok(Redirect::to("/settings?linked=1").into_response());
    }

    // Login flow: only already-linked identities get in.
    let Some(link) = accounts
        .get_by_provider_account_id(&provider_user.id)
        .await?
    else {
        tracing::info!(provider = %provider, "OAuth login for unlinked identity");
        return Ok(Redirect::to("/login?error=no_linked_account").into_response());
    };

    SessionService::new(state.pool())
        .login(
            &sid,
            link.user_id,
            false,
            meta.user_agent.as_deref(),
            meta.ip_address.as_deref(),
        )
        .await?;

    set_sentry_user(&link.user_id, None);
    tracing::info!(user_id = %link.user_id, provider = %provider, "User logged in via provider");

    Ok(Redirect::to("/").into_response())
}

/// Remove the active user's link for a provider.
///
/// # Route
///
/// `POST /oauth/{provider}/disconnect`
pub async fn disconnect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    auth: RequireUser,
) -> Result<StatusCode> {
    let provider = parse_provider(&provider)?;

    let deleted = AccountRepository::new(state.pool())
        .delete_for_user(auth.user.id, provider)
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!(
            "no {provider} account linked"
        )));
    }

    tracing::info!(user_id = %auth.user.id, provider = %provider, "Provider identity disconnected");

    Ok(StatusCode::NO_CONTENT)
}
