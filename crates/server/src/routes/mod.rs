//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                             - Liveness check
//! GET  /health/ready                       - Readiness check (DB ping)
//!
//! # Auth
//! POST /auth/login                         - Credential login (+ remember)
//! POST /auth/logout                        - Clear active user
//! GET  /auth/saved-accounts                - Accounts saved on this device
//! POST /auth/switch-account                - Switch to a saved account
//! POST /auth/saved-accounts/remove         - Forget a saved account
//! GET  /auth/register?token=...            - Decode invitation for prefill
//! POST /auth/register?token=...            - Complete invited setup
//! POST /auth/reset-password/request        - Email reset link + OTP
//! POST /auth/reset-password/verify-otp     - Pre-check the OTP
//! POST /auth/reset-password/complete       - Set new password, consume token
//!
//! # OAuth (browser flow)
//! GET  /oauth/{provider}?action=...        - Redirect to consent page
//! GET  /oauth/{provider}/callback          - Login or link per saved action
//! POST /oauth/{provider}/disconnect        - Remove the provider link
//!
//! # Settings (requires auth)
//! GET  /api/me                             - Active user
//! GET  /api/settings/sessions              - Device list
//! POST /api/settings/sessions/revoke       - Revoke one device
//! POST /api/settings/sessions/revoke-others- Revoke all other devices
//! GET  /api/settings/connected-accounts    - Linked providers
//! PUT  /api/settings/profile               - Update name/email/username
//! PUT  /api/settings/password              - Change password
//!
//! # Management (role-gated)
//! GET|POST /api/vendors                    - List / create vendors
//! GET  /api/vendors/{id}                   - Vendor detail
//! PUT  /api/vendors/{id}                   - Update own vendor
//! GET|POST /api/users                      - List / create / invite users
//! GET  /api/users/{id}                     - User detail
//!
//! # Packages
//! GET|POST /api/packages                   - List / create packages
//!
//! # Notifications
//! POST /api/notifications/subscribe        - Store push subscription
//! POST /api/notifications/unsubscribe     - Remove push subscription
//! ```

pub mod auth;
pub mod notifications;
pub mod oauth;
pub mod packages;
pub mod password_reset;
pub mod settings;
pub mod users;
pub mod vendors;

use axum::{
    Json,
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::json;

use courierhub_core::UserRole;

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Reject unless the caller's role satisfies one of the required roles.
pub(crate) fn require_role(auth: &RequireUser, required: &[UserRole]) -> Result<(), AppError> {
    if auth.user.role.satisfies(required) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "requires one of: {required:?}"
        )))
    }
}

/// Liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check: pings the database.
async fn readiness(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => Ok(Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::error!("Readiness check failed: {e}");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/saved-accounts", get(auth::saved_accounts))
        .route("/saved-accounts/remove", post(auth::remove_saved_account))
        .route("/switch-account", post(auth::switch_account))
        .route(
            "/register",
            get(auth::register_prefill).post(auth::register_complete),
        )
        .route("/reset-password/request", post(password_reset::request))
        .route("/reset-password/verify-otp", post(password_reset::verify_otp))
        .route("/reset-password/complete", post(password_reset::complete))
}

/// Create the OAuth routes router.
pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/{provider}", get(oauth::start))
        .route("/{provider}/callback", get(oauth::callback))
        .route("/{provider}/disconnect", post(oauth::disconnect))
}

/// Create the settings routes router.
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(settings::list_sessions))
        .route("/sessions/revoke", post(settings::revoke_session))
        .route(
            "/sessions/revoke-others",
            post(settings::revoke_other_sessions),
        )
        .route("/connected-accounts", get(settings::connected_accounts))
        .route("/profile", put(settings::update_profile))
        .route("/password", put(settings::update_password))
}

/// Create the management API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(settings::me))
        .nest("/settings", settings_routes())
        .route("/vendors", get(vendors::list).post(vendors::create))
        .route("/vendors/{id}", get(vendors::get).put(vendors::update))
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", get(users::get))
        .route("/packages", get(packages::list).post(packages::create))
        .route("/notifications/subscribe", post(notifications::subscribe))
        .route(
            "/notifications/unsubscribe",
            post(notifications::unsubscribe),
        )
}

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/oauth", oauth_routes())
        .nest("/api", api_routes())
}
