//! Signed token issuance and verification.
//!
//! Reset and invitation tokens are HS256 JWTs with the expiry embedded in
//! the payload. The database row only anchors uniqueness (one live token
//! per identifier and purpose) and single-use consumption.

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use thiserror::Error;

use courierhub_core::{Email, TokenId, UserRole};

use crate::db::{RepositoryError, TokenRepository};
use crate::models::{AuthToken, TokenType};

/// Password-reset tokens live for 2 days.
const RESET_TTL_DAYS: i64 = 2;
/// Invitation tokens live for 7 days.
const INVITE_TTL_DAYS: i64 = 7;

/// Errors that can occur in the token service.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token signature is valid but the token has expired.
    #[error("token expired")]
    Expired,

    /// Token is malformed, tampered with, or the proof doesn't match.
    #[error("invalid token")]
    Invalid,

    /// No live token exists for the identifier.
    #[error("no token found")]
    NotFound,

    /// Signing failed.
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Claims carried by a password-reset token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    /// Email the token was issued for.
    pub sub: String,
    /// 6-digit one-time password, emailed alongside the link.
    pub otp: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Claims carried by an invitation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteClaims {
    /// Email the invited account will use.
    pub sub: String,
    /// Display name for the invited user.
    pub name: String,
    /// Role the invited user will receive.
    pub role: UserRole,
    /// Vendor the invited user will belong to.
    pub vendor_name: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Generate a 6-digit one-time password from the thread CSPRNG.
#[must_use]
pub fn generate_otp() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

fn sign<C: Serialize>(claims: &C, secret: &SecretString) -> Result<String, TokenError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(TokenError::Signing)
}

fn verify<C: serde::de::DeserializeOwned>(
    token: &str,
    secret: &SecretString,
) -> Result<C, TokenError> {
    let data = jsonwebtoken::decode::<C>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    Ok(data.claims)
}

/// Constant-time check of a proof against the full token or its OTP.
fn proof_matches(proof: &str, token: &str, otp: &str) -> bool {
    let token_match = proof.as_bytes().ct_eq(token.as_bytes());
    let otp_match = proof.as_bytes().ct_eq(otp.as_bytes());

    bool::from(token_match | otp_match)
}

/// Token service: issues, verifies, and consumes signed tokens.
pub struct TokenService<'a> {
    tokens: TokenRepository<'a>,
    reset_secret: &'a SecretString,
    invite_secret: &'a SecretString,
}

impl<'a> TokenService<'a> {
    /// Create a new token service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        reset_secret: &'a SecretString,
        invite_secret: &'a SecretString,
    ) -> Self {
        Self {
            tokens: TokenRepository::new(pool),
            reset_secret,
            invite_secret,
        }
    }

    /// Issue a password-reset token, superseding any live one.
    ///
    /// Returns the persisted token and the OTP to email.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` or `TokenError::Repository`.
    pub async fn issue_reset(&self, email: &Email) -> Result<(AuthToken, String), TokenError> {
        let otp = generate_otp();
        let claims = ResetClaims {
            sub: email.as_str().to_owned(),
            otp: otp.clone(),
            exp: (Utc::now() + ChronoDuration::days(RESET_TTL_DAYS)).timestamp(),
        };
        let signed = sign(&claims, self.reset_secret)?;

        let token = self
            .tokens
            .insert_superseding(&signed, email.as_str(), TokenType::PasswordReset)
            .await?;

        Ok((token, otp))
    }

    /// Issue an invitation token, superseding any live one.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` or `TokenError::Repository`.
    pub async fn issue_invite(
        &self,
        name: &str,
        email: &Email,
        role: UserRole,
        vendor_name: &str,
    ) -> Result<AuthToken, TokenError> {
        let claims = InviteClaims {
            sub: email.as_str().to_owned(),
            name: name.to_owned(),
            role,
            vendor_name: vendor_name.to_owned(),
            exp: (Utc::now() + ChronoDuration::days(INVITE_TTL_DAYS)).timestamp(),
        };
        let signed = sign(&claims, self.invite_secret)?;

        self.tokens
            .insert_superseding(&signed, email.as_str(), TokenType::AccountSetup)
            .await
            .map_err(Into::into)
    }

    /// Verify an invitation token: signature, expiry, and persistence.
    ///
    /// The row check means a superseded invitation fails even while its
    /// signature is still valid.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::NotFound` if the token was consumed or
    /// superseded, `Expired`/`Invalid` per the signature check.
    pub async fn verify_invite(&self, token: &str) -> Result<(TokenId, InviteClaims), TokenError> {
        let row = self
            .tokens
            .get_by_token(token)
            .await?
            .ok_or(TokenError::NotFound)?;

        let claims: InviteClaims = verify(&row.token, self.invite_secret)?;
        Ok((row.id, claims))
    }

    /// Verify possession of a live reset token by either the full token
    /// string or the embedded OTP. Both proofs share one lookup, expiry,
    /// and consumption path.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::NotFound` if no live token exists for the email,
    /// `Expired` if it has expired, `Invalid` if the proof doesn't match.
    pub async fn verify_possession(
        &self,
        email: &Email,
        proof: &str,
    ) -> Result<TokenId, TokenError> {
        let row = self
            .tokens
            .get_for(email.as_str(), TokenType::PasswordReset)
            .await?
            .ok_or(TokenError::NotFound)?;

        let claims: ResetClaims = verify(&row.token, self.reset_secret)?;

        if proof_matches(proof, &row.token, &claims.otp) {
            Ok(row.id)
        } else {
            Err(TokenError::Invalid)
        }
    }

    /// Consume a token. Single-use: a second consume fails.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::NotFound` if already consumed.
    pub async fn consume(&self, id: TokenId) -> Result<(), TokenError> {
        match self.tokens.consume(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(TokenError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("kJ8#mN2$pQ5&rT9*uW3^xZ6!aB4@cD7%")
    }

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_proof_matches_token_or_otp() {
        assert!(proof_matches("tok.en.value", "tok.en.value", "123456"));
        assert!(proof_matches("123456", "tok.en.value", "123456"));
        assert!(!proof_matches("123457", "tok.en.value", "123456"));
        assert!(!proof_matches("", "tok.en.value", "123456"));
        assert!(!proof_matches("12345", "tok.en.value", "123456"));
    }

    #[test]
    fn test_reset_claims_roundtrip() {
        let secret = secret();
        let claims = ResetClaims {
            sub: "user@example.com".to_owned(),
            otp: "123456".to_owned(),
            exp: (Utc::now() + ChronoDuration::days(2)).timestamp(),
        };

        let token = sign(&claims, &secret).expect("signing succeeds");
        let decoded: ResetClaims = verify(&token, &secret).expect("verification succeeds");
        assert_eq!(decoded.sub, "user@example.com");
        assert_eq!(decoded.otp, "123456");
    }

    #[test]
    fn test_invite_claims_roundtrip() {
        let secret = secret();
        let claims = InviteClaims {
            sub: "new@example.com".to_owned(),
            name: "New User".to_owned(),
            role: UserRole::Adminuser,
            vendor_name: "ACME LOGISTICS".to_owned(),
            exp: (Utc::now() + ChronoDuration::days(7)).timestamp(),
        };

        let token = sign(&claims, &secret).expect("signing succeeds");
        let decoded: InviteClaims = verify(&token, &secret).expect("verification succeeds");
        assert_eq!(decoded.sub, "new@example.com");
        assert_eq!(decoded.role, UserRole::Adminuser);
        assert_eq!(decoded.vendor_name, "ACME LOGISTICS");
    }

    #[test]
    fn test_expired_token_is_distinct_from_invalid() {
        let secret = secret();
        let claims = ResetClaims {
            sub: "user@example.com".to_owned(),
            otp: "654321".to_owned(),
            exp: (Utc::now() - ChronoDuration::hours(1)).timestamp(),
        };

        let token = sign(&claims, &secret).expect("signing succeeds");
        let err = verify::<ResetClaims>(&token, &secret).expect_err("expired");
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn test_tampered_token_fails_closed() {
        let secret = secret();
        let claims = ResetClaims {
            sub: "user@example.com".to_owned(),
            otp: "111111".to_owned(),
            exp: (Utc::now() + ChronoDuration::days(2)).timestamp(),
        };

        let token = sign(&claims, &secret).expect("signing succeeds");
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');

        let err = verify::<ResetClaims>(&tampered, &secret).expect_err("tampered");
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_fails_closed() {
        let secret = secret();
        let other = SecretString::from("zY9!wV6@tS3#qP0$nM7%kJ4^hG1&fD8*");
        let claims = ResetClaims {
            sub: "user@example.com".to_owned(),
            otp: "222222".to_owned(),
            exp: (Utc::now() + ChronoDuration::days(2)).timestamp(),
        };

        let token = sign(&claims, &secret).expect("signing succeeds");
        let err = verify::<ResetClaims>(&token, &other).expect_err("wrong key");
        assert!(matches!(err, TokenError::Invalid));
    }
}
