//! OAuth 2.0 bridge for GitHub, Google, and Facebook.
//!
//! Covers the three provider-facing steps of the authorization-code flow:
//! building the redirect URL, exchanging the code, and fetching the
//! normalized profile. Session state handling and account linking live in
//! the auth routes.

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::{OAuthConfig, ProviderCredentials};
use crate::models::Provider;

/// Errors that can occur talking to an OAuth provider.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Request to the provider failed.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with an error payload.
    #[error("provider rejected the request: {0}")]
    Upstream(String),

    /// Provider response is missing a field we need.
    #[error("provider response missing {0}")]
    MissingField(&'static str),

    /// Base or provider URL could not be constructed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A provider profile normalized to our shape.
///
/// `id` is always a string: GitHub reports numeric identifiers, Google and
/// Facebook report strings, and the `linked_account` table stores text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Token response from a provider's code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderToken {
    pub access_token: String,
    pub expires_in: Option<i32>,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubProfile {
    id: i64,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: String,
    email: Option<String>,
    name: Option<String>,
}

const fn authorize_endpoint(provider: Provider) -> &'static str {
    match provider {
        Provider::Github => "https://github.com/login/oauth/authorize",
        Provider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
        Provider::Facebook => "https://www.facebook.com/v19.0/dialog/oauth",
    }
}

const fn token_endpoint(provider: Provider) -> &'static str {
    match provider {
        Provider::Github => "https://github.com/login/oauth/access_token",
        Provider::Google => "https://oauth2.googleapis.com/token",
        Provider::Facebook => "https://graph.facebook.com/v19.0/oauth/access_token",
    }
}

const fn profile_endpoint(provider: Provider) -> &'static str {
    match provider {
        Provider::Github => "https://api.github.com/user",
        Provider::Google => "https://www.googleapis.com/oauth2/v2/userinfo",
        Provider::Facebook => "https://graph.facebook.com/me?fields=id,name,email",
    }
}

const fn scopes(provider: Provider) -> &'static str {
    match provider {
        Provider::Github => "read:user user:email",
        Provider::Google => "openid email profile",
        Provider::Facebook => "email public_profile",
    }
}

/// Client for the provider-facing legs of the OAuth flow.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: OAuthConfig,
    base_url: String,
}

impl OAuthClient {
    /// Create a client over the configured provider credentials.
    ///
    /// `base_url` is the public origin callbacks are registered under.
    #[must_use]
    pub fn new(config: OAuthConfig, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            base_url,
        }
    }

    fn credentials(&self, provider: Provider) -> &ProviderCredentials {
        match provider {
            Provider::Github => &self.config.github,
            Provider::Google => &self.config.google,
            Provider::Facebook => &self.config.facebook,
        }
    }

    fn redirect_uri(&self, provider: Provider) -> String {
        format!("{}/oauth/{}/callback", self.base_url, provider.as_str())
    }

    /// Build the provider authorization URL for a browser redirect.
    ///
    /// Carries only the public client id, the callback, scopes, and the
    /// caller's anti-forgery `state`. The client secret never appears here.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Url` if the provider endpoint fails to parse.
    pub fn authorize_url(&self, provider: Provider, state: &str) -> Result<Url, OAuthError> {
        let mut url = Url::parse(authorize_endpoint(provider))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.credentials(provider).client_id)
            .append_pair("redirect_uri", &self.redirect_uri(provider))
            .append_pair("response_type", "code")
            .append_pair("scope", scopes(provider))
            .append_pair("state", state);

        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Http` on transport failure or
    /// `OAuthError::Upstream` if the provider rejects the code.
    pub async fn exchange_code(
        &self,
        provider: Provider,
        code: &str,
    ) -> Result<ProviderToken, OAuthError> {
        let creds = self.credentials(provider);
        let redirect_uri = self.redirect_uri(provider);

        let params = [
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(token_endpoint(provider))
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Upstream(format!(
                "{} code exchange failed with {status}: {body}",
                provider.as_str()
            )));
        }

        let token: ProviderToken = response.json().await?;
        if token.access_token.is_empty() {
            return Err(OAuthError::MissingField("access_token"));
        }

        Ok(token)
    }

    /// Fetch the provider profile for an access token, normalized.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Http` on transport failure or
    /// `OAuthError::Upstream` if the provider rejects the token.
    pub async fn fetch_user(
        &self,
        provider: Provider,
        access_token: &str,
    ) -> Result<ProviderUser, OAuthError> {
        let response = self
            .http
            .get(profile_endpoint(provider))
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .header(ACCEPT, "application/json")
            // GitHub rejects requests without a User-Agent.
            .header(USER_AGENT, "courierhub")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(OAuthError::Upstream(format!(
                "{} profile fetch failed with {status}",
                provider.as_str()
            )));
        }

        let user = match provider {
            Provider::Github => {
                let profile: GithubProfile = response.json().await?;
                ProviderUser {
                    id: profile.id.to_string(),
                    email: profile.email,
                    name: profile.name,
                }
            }
            Provider::Google => {
                let profile: GoogleProfile = response.json().await?;
                ProviderUser {
                    id: profile.id,
                    email: profile.email,
                    name: profile.name,
                }
            }
            Provider::Facebook => {
                let profile: FacebookProfile = response.json().await?;
                ProviderUser {
                    id: profile.id,
                    email: profile.email,
                    name: profile.name,
                }
            }
        };

        if user.id.is_empty() {
            return Err(OAuthError::MissingField("id"));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client() -> OAuthClient {
        let creds = |id: &str| ProviderCredentials {
            client_id: id.to_owned(),
            client_secret: SecretString::from("s3cr3t-value-nobody-should-see"),
        };
        OAuthClient::new(
            OAuthConfig {
                github: creds("gh-client"),
                google: creds("goog-client"),
                facebook: creds("fb-client"),
            },
            "https://courier.example.com".to_owned(),
        )
    }

    #[test]
    fn test_authorize_url_carries_public_parameters() {
        let url = client()
            .authorize_url(Provider::Github, "state-abc")
            .expect("url builds");

        assert_eq!(url.host_str(), Some("github.com"));
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(query.contains(&("client_id".to_owned(), "gh-client".to_owned())));
        assert!(query.contains(&("state".to_owned(), "state-abc".to_owned())));
        assert!(query.contains(&(
            "redirect_uri".to_owned(),
            "https://courier.example.com/oauth/github/callback".to_owned()
        )));
    }

    #[test]
    fn test_authorize_url_never_leaks_client_secret() {
        let client = client();
        for provider in [Provider::Github, Provider::Google, Provider::Facebook] {
            let url = client
                .authorize_url(provider, "state-xyz")
                .expect("url builds");
            assert!(!url.as_str().contains("s3cr3t-value-nobody-should-see"));
            assert!(!url.as_str().contains("client_secret"));
        }
    }

    #[test]
    fn test_github_numeric_id_normalizes_to_string() {
        let profile: GithubProfile = serde_json::from_str(
            r#"{"id": 583231, "login": "octocat", "email": null, "name": "The Octocat"}"#,
        )
        .expect("github payload parses");

        let user = ProviderUser {
            id: profile.id.to_string(),
            email: profile.email,
            name: profile.name,
        };
        assert_eq!(user.id, "583231");
        assert_eq!(user.email, None);
        assert_eq!(user.name.as_deref(), Some("The Octocat"));
    }

    #[test]
    fn test_provider_endpoints_are_https() {
        for provider in [Provider::Github, Provider::Google, Provider::Facebook] {
            assert!(authorize_endpoint(provider).starts_with("https://"));
            assert!(token_endpoint(provider).starts_with("https://"));
            assert!(profile_endpoint(provider).starts_with("https://"));
        }
    }
}
