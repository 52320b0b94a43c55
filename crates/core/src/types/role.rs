//! User role and access control.

use core::fmt;

use serde::{Deserialize, Serialize};

/// User role with different permission levels.
///
/// `Developer` is an operator-level role that implicitly satisfies any role
/// requirement. The remaining roles carry no implicit ordering between each
/// other; a route that wants superusers *and* admin users must list both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Platform operator. Satisfies every role requirement.
    Developer,
    /// Vendor owner. Manages the vendor tree and its staff.
    Superuser,
    /// Vendor administrator. Manages day-to-day vendor operations.
    Adminuser,
    /// Regular account with access to their own data only.
    Normaluser,
}

impl UserRole {
    /// Whether this role satisfies a role requirement.
    ///
    /// Returns `true` if the role is [`UserRole::Developer`] or appears in
    /// `required`. An empty `required` list is satisfied only by developers.
    #[must_use]
    pub fn satisfies(self, required: &[Self]) -> bool {
        self == Self::Developer || required.contains(&self)
    }

    /// The wire name of the role (`"DEVELOPER"`, `"SUPERUSER"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Developer => "DEVELOPER",
            Self::Superuser => "SUPERUSER",
            Self::Adminuser => "ADMINUSER",
            Self::Normaluser => "NORMALUSER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEVELOPER" => Ok(Self::Developer),
            "SUPERUSER" => Ok(Self::Superuser),
            "ADMINUSER" => Ok(Self::Adminuser),
            "NORMALUSER" => Ok(Self::Normaluser),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognized role name.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown user role: {0}")]
pub struct UnknownRole(pub String);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_developer_satisfies_everything() {
        assert!(UserRole::Developer.satisfies(&[UserRole::Superuser]));
        assert!(UserRole::Developer.satisfies(&[UserRole::Normaluser]));
        assert!(UserRole::Developer.satisfies(&[]));
    }

    #[test]
    fn test_membership_check_is_exact() {
        assert!(UserRole::Superuser.satisfies(&[UserRole::Superuser, UserRole::Adminuser]));
        assert!(UserRole::Adminuser.satisfies(&[UserRole::Superuser, UserRole::Adminuser]));
        assert!(!UserRole::Normaluser.satisfies(&[UserRole::Superuser, UserRole::Adminuser]));
    }

    #[test]
    fn test_no_implicit_ordering_between_non_developer_roles() {
        // Superuser does not imply Adminuser or vice versa.
        assert!(!UserRole::Superuser.satisfies(&[UserRole::Adminuser]));
        assert!(!UserRole::Adminuser.satisfies(&[UserRole::Superuser]));
    }

    #[test]
    fn test_empty_requirement_only_developers() {
        assert!(!UserRole::Superuser.satisfies(&[]));
        assert!(!UserRole::Normaluser.satisfies(&[]));
    }

    #[test]
    fn test_display_and_from_str() {
        for role in [
            UserRole::Developer,
            UserRole::Superuser,
            UserRole::Adminuser,
            UserRole::Normaluser,
        ] {
            let parsed: UserRole = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("MANAGER".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&UserRole::Normaluser).unwrap();
        assert_eq!(json, "\"NORMALUSER\"");
        let parsed: UserRole = serde_json::from_str("\"DEVELOPER\"").unwrap();
        assert_eq!(parsed, UserRole::Developer);
    }
}
