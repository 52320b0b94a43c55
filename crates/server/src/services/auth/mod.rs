//! Credential authentication and account management.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use courierhub_core::{Email, UserId, UserRole, Username, VendorId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles credential checks, password changes, and account creation.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Authenticate by username or email plus password.
    ///
    /// The login is normalized (trimmed, lowercased) before lookup so it
    /// matches how usernames and emails are stored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownLogin` if no user matches the login.
    /// Returns `AuthError::WrongPassword` if the password doesn't verify,
    /// including accounts that only ever signed in via a provider.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let login = login.trim().to_lowercase();

        let user = self
            .users
            .get_by_login(&login)
            .await?
            .ok_or(AuthError::UnknownLogin)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::WrongPassword);
        };
        verify_password(password, hash)?;

        Ok(user)
    }

    /// Change a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongPassword` if the current password doesn't
    /// verify, `AuthError::WeakPassword` if the new one fails validation.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::WrongPassword);
        };
        verify_password(current_password, hash)?;

        if new_password == current_password {
            return Err(AuthError::WeakPassword(
                "new password must differ from the current password".to_owned(),
            ));
        }
        validate_password(new_password)?;
        let new_hash = hash_password(new_password)?;
        self.users.update_password_hash(user_id, &new_hash).await?;

        Ok(())
    }

    /// Set a password for the user with the given email, without knowing the
    /// old one. Callers must have verified a reset or setup token first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user has that email,
    /// `AuthError::WeakPassword` if the password fails validation.
    pub async fn set_password_by_email(
        &self,
        email: &Email,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let hash = hash_password(new_password)?;

        match self.users.set_password_hash_by_email(email, &hash).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a user with a password.
    ///
    /// Used by direct creation (admin issues the password) and invitation
    /// completion (the invitee chose username and password).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email or username is
    /// taken, `AuthError::WeakPassword` if the password fails validation.
    pub async fn create_user(
        &self,
        name: &str,
        email: Email,
        username: Option<Username>,
        password: &str,
        role: UserRole,
        vendor_id: VendorId,
    ) -> Result<User, AuthError> {
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(NewUser {
                name: name.to_owned(),
                username,
                email,
                password_hash: Some(password_hash),
                role,
                vendor_id,
                picture: None,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Update a user's profile (name, email, username).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email or username is
    /// taken by another user.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &Email,
        username: Option<&Username>,
    ) -> Result<User, AuthError> {
        let user = self
            .users
            .update_profile(user_id, name, email, username)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_email(email).await?)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::WrongPassword)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::WrongPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").expect("hashing succeeds");
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("correct horse battery").expect("hashing succeeds");
        let err = verify_password("wrong horse", &hash).expect_err("must not verify");
        assert!(matches!(err, AuthError::WrongPassword));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").expect("hashing succeeds");
        let b = hash_password("same password").expect("hashing succeeds");
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_password_rejected() {
        let err = validate_password("short").expect_err("too short");
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[test]
    fn test_minimum_length_password_accepted() {
        assert!(validate_password("12345678").is_ok());
    }
}
