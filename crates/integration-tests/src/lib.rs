//! Integration tests for CourierHub.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations
//! cargo run -p courierhub-cli -- migrate
//!
//! # Seed the root vendor and developer account
//! cargo run -p courierhub-cli -- seed \
//!     --vendor-name "ROOT" --vendor-email ops@example.com \
//!     --vendor-address "HQ" -e dev@example.com -n "Dev" -p devpassword
//!
//! # Start the server, then run the ignored tests
//! cargo test -p courierhub-integration-tests -- --ignored
//! ```
//!
//! The tests talk to a running server over HTTP. They expect the seeded
//! developer account above unless `TEST_LOGIN` / `TEST_PASSWORD` say
//! otherwise.

use reqwest::Client;
use serde_json::{Value, json};

/// Base URL for the server API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("COURIERHUB_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_owned())
}

/// Login credentials for the seeded developer account.
#[must_use]
pub fn test_credentials() -> (String, String) {
    let login = std::env::var("TEST_LOGIN").unwrap_or_else(|_| "dev@example.com".to_owned());
    let password = std::env::var("TEST_PASSWORD").unwrap_or_else(|_| "devpassword".to_owned());
    (login, password)
}

/// Create a cookie-carrying HTTP client.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Log in with the given credentials and return the user payload.
///
/// # Panics
///
/// Panics if the request fails or the login is rejected.
pub async fn login(client: &Client, login: &str, password: &str) -> Value {
    let resp = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "login": login, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    assert!(
        resp.status().is_success(),
        "Login failed with status {}",
        resp.status()
    );
    resp.json().await.expect("Failed to parse login response")
}

/// Create a client already logged in as the seeded developer.
pub async fn authenticated_client() -> Client {
    let client = client();
    let (user, password) = test_credentials();
    login(&client, &user, &password).await;
    client
}
