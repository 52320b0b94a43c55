//! User account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierhub_core::{Email, UserId, UserRole, Username, VendorId};

/// A user account.
///
/// `password_hash` is `None` while an invitation is pending (the account
/// exists but no credential has been set yet).
#[derive(Debug, Clone)]
pub struct User {
    /// User's database ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login username (unique, lowercase), optional.
    pub username: Option<Username>,
    /// Email address (unique, lowercase).
    pub email: Email,
    /// Argon2 password hash. `None` until account setup completes.
    pub password_hash: Option<String>,
    /// Access-control role.
    pub role: UserRole,
    /// Vendor this user belongs to.
    pub vendor_id: VendorId,
    /// Avatar URL, if any.
    pub picture: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user: everything a client may see.
///
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub username: Option<Username>,
    pub email: Email,
    pub role: UserRole,
    pub vendor_id: VendorId,
    pub picture: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
            vendor_id: user.vendor_id,
            picture: user.picture,
        }
    }
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        user.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_projection_drops_password_hash() {
        let user = User {
            id: UserId::new(1),
            name: "Alice".to_owned(),
            username: None,
            email: Email::parse("alice@example.com").expect("valid email"),
            password_hash: Some("$argon2id$v=19$...".to_owned()),
            role: UserRole::Normaluser,
            vendor_id: VendorId::new(1),
            picture: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let public = PublicUser::from(&user);
        let json = serde_json::to_string(&public).expect("serializable");
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
        assert!(json.contains("alice@example.com"));
    }
}
