//! Auth token types (password reset and account setup).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierhub_core::TokenId;

/// The purpose a signed token serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// Emailed password-reset token (carries an OTP).
    PasswordReset,
    /// Invitation token for setting up a new account.
    AccountSetup,
}

/// A persisted signed token.
///
/// The expiry lives inside the signed JWT payload, not in this row.
/// At most one live token exists per (identifier, `token_type`) pair.
#[derive(Debug, Clone)]
pub struct AuthToken {
    /// Token's database ID.
    pub id: TokenId,
    /// The signed JWT string (unique).
    pub token: String,
    /// The email address the token was issued for.
    pub identifier: String,
    /// What the token is for.
    pub token_type: TokenType,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}
