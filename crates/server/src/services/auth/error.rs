//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// `UnknownLogin` and `WrongPassword` stay distinct for logging and rate
/// accounting; the HTTP layer collapses both into one generic message so
/// responses don't reveal which identifiers exist.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] courierhub_core::EmailError),

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] courierhub_core::UsernameError),

    /// No user matches the submitted username or email.
    #[error("no account for this login")]
    UnknownLogin,

    /// The user exists but the password doesn't match, or the account
    /// has no password set.
    #[error("wrong password")]
    WrongPassword,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
