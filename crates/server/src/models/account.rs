//! OAuth linked-account types.

use chrono::{DateTime, Utc};
use core::fmt;
use serde::{Deserialize, Serialize};

use courierhub_core::{AccountId, UserId};

/// Supported OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Google,
    Facebook,
}

impl Provider {
    /// The wire name of the provider (`"github"`, `"google"`, `"facebook"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Self::Github),
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            _ => Err(UnknownProvider(s.to_owned())),
        }
    }
}

/// Error returned when parsing an unrecognized provider name.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown oauth provider: {0}")]
pub struct UnknownProvider(pub String);

/// An OAuth identity linked to a local user.
///
/// `provider_account_id` is globally unique: one provider identity can back
/// at most one local user. A user also holds at most one link per provider.
#[derive(Debug, Clone)]
pub struct LinkedAccount {
    /// Link's database ID.
    pub id: AccountId,
    /// Which provider issued the identity.
    pub provider: Provider,
    /// The provider's stable account identifier, normalized to a string.
    pub provider_account_id: String,
    /// Local user this identity is linked to.
    pub user_id: UserId,
    /// Last access token obtained during the flow.
    pub access_token: String,
    /// Token lifetime reported by the provider, seconds.
    pub expires_in: Option<i32>,
    /// Granted scope, if reported.
    pub scope: Option<String>,
    /// When the link was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_roundtrip() {
        for provider in [Provider::Github, Provider::Google, Provider::Facebook] {
            let parsed: Provider = provider.as_str().parse().expect("valid provider");
            assert_eq!(parsed, provider);
        }
        assert!("twitter".parse::<Provider>().is_err());
    }
}
