//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use std::time::Duration;

use axum::{
    http::{StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{
    AuthError, EmailError, OAuthError, RateLimitExceeded, SessionError, TokenError, VendorError,
};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session registry operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Token operation failed.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Vendor operation failed.
    #[error("Vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// OAuth provider operation failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Outbound email failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflicting state (duplicate name, already linked, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited { retry_after: Duration },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RateLimitExceeded> for AppError {
    fn from(e: RateLimitExceeded) -> Self {
        Self::RateLimited {
            retry_after: e.retry_after,
        }
    }
}

impl AppError {
    /// Whether this error class should be captured to Sentry.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::OAuth(OAuthError::Http(_) | OAuthError::Upstream(_))
                | Self::Email(_)
                | Self::Token(TokenError::Signing(_) | TokenError::Repository(_))
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
                | Self::Session(SessionError::Repository(_))
                | Self::Vendor(VendorError::Repository(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OAuth(err) => match err {
                OAuthError::Http(_) | OAuthError::Upstream(_) | OAuthError::MissingField(_) => {
                    StatusCode::BAD_GATEWAY
                }
                OAuthError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Email(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::UnknownLogin | AuthError::WrongPassword | AuthError::UserNotFound => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidUsername(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Session(err) => match err {
                SessionError::NotSaved | SessionError::SavedAccountNotFound => {
                    StatusCode::BAD_REQUEST
                }
                SessionError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            // Expired and tampered tokens look identical from outside.
            Self::Token(err) => match err {
                TokenError::Expired | TokenError::Invalid | TokenError::NotFound => {
                    StatusCode::UNAUTHORIZED
                }
                TokenError::Signing(_) | TokenError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Vendor(err) => match err {
                VendorError::NotFound => StatusCode::NOT_FOUND,
                VendorError::Conflict(_) => StatusCode::CONFLICT,
                VendorError::SelfParent | VendorError::ParentNotFound => StatusCode::BAD_REQUEST,
                VendorError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::OAuth(_) | Self::Email(_) => "External service error".to_string(),
            Self::Auth(err) => match err {
                AuthError::UnknownLogin | AuthError::WrongPassword => {
                    "Invalid credentials".to_string()
                }
                AuthError::UserNotFound => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email or username already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidUsername(_) => "Invalid username".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Internal server error".to_string()
                }
            },
            Self::Session(err) => match err {
                SessionError::NotSaved | SessionError::SavedAccountNotFound => {
                    "Account is not saved on this session".to_string()
                }
                SessionError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Token(err) => match err {
                TokenError::Expired | TokenError::Invalid | TokenError::NotFound => {
                    "Invalid or expired token".to_string()
                }
                TokenError::Signing(_) | TokenError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Vendor(err) => match err {
                VendorError::Repository(_) => "Internal server error".to_string(),
                other => other.to_string(),
            },
            Self::RateLimited { .. } => "Too many requests".to_string(),
            _ => self.to_string(),
        };

        if let Self::RateLimited { retry_after } = &self {
            let retry_secs = retry_after.as_secs().max(1).to_string();
            return (status, [(RETRY_AFTER, retry_secs)], message).into_response();
        }

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("vendor-7".to_string());
        assert_eq!(err.to_string(), "Not found: vendor-7");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credential_errors_collapse_to_one_message() {
        // Responses must not reveal whether the login or the password
        // was wrong.
        let unknown = AppError::Auth(AuthError::UnknownLogin).into_response();
        let wrong = AppError::Auth(AuthError::WrongPassword).into_response();
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_and_invalid_tokens_share_status() {
        assert_eq!(
            get_status(AppError::Token(TokenError::Expired)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Token(TokenError::Invalid)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let err = AppError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("42")
        );
    }
}
