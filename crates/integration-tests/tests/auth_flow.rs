//! Integration tests for credential login, logout, and account switching.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p courierhub-server)
//! - The seeded developer account (see crate docs)
//!
//! Run with: cargo test -p courierhub-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use courierhub_integration_tests::{authenticated_client, base_url, client, test_credentials};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to reach health endpoint");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_login_rejects_bad_credentials_generically() {
    let client = client();
    let (login, _) = test_credentials();

    // Wrong password and unknown account must be indistinguishable.
    let wrong_password = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "login": login, "password": "definitely-wrong" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_body = wrong_password.text().await.unwrap_or_default();

    let unknown = client
        .post(format!("{}/auth/login", base_url()))
        .json(&json!({ "login": "nobody@example.com", "password": "definitely-wrong" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = unknown.text().await.unwrap_or_default();

    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_login_then_me_then_logout() {
    let client = authenticated_client().await;
    let base_url = base_url();

    let me = client
        .get(format!("{base_url}/api/me"))
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(me.status(), StatusCode::OK);

    let body: Value = me.json().await.expect("Failed to parse user");
    assert!(body.get("password_hash").is_none(), "hash must never leak");

    let logout = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    // The device cookie survives logout, but there is no active user.
    let me = client
        .get(format!("{base_url}/api/me"))
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_remembered_account_survives_logout() {
    let client = client();
    let base_url = base_url();
    let (login, password) = test_credentials();

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "login": login, "password": password, "remember": true }))
        .send()
        .await
        .expect("Failed to log in");
    assert!(resp.status().is_success());
    let user: Value = resp.json().await.expect("Failed to parse user");
    let user_id = user.get("id").and_then(Value::as_i64).expect("missing id");

    let logout = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let saved = client
        .get(format!("{base_url}/auth/saved-accounts"))
        .send()
        .await
        .expect("Failed to list saved accounts");
    assert_eq!(saved.status(), StatusCode::OK);
    let accounts: Vec<Value> = saved.json().await.expect("Failed to parse accounts");
    assert!(
        accounts
            .iter()
            .any(|a| a.get("id").and_then(Value::as_i64) == Some(user_id)),
        "remembered account missing from saved list"
    );

    // Switching back needs no password.
    let switch = client
        .post(format!("{base_url}/auth/switch-account"))
        .json(&json!({ "user_id": user_id }))
        .send()
        .await
        .expect("Failed to switch account");
    assert_eq!(switch.status(), StatusCode::OK);

    let me = client
        .get(format!("{base_url}/api/me"))
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_switch_to_unsaved_account_rejected() {
    let client = authenticated_client().await;

    let resp = client
        .post(format!("{}/auth/switch-account", base_url()))
        .json(&json!({ "user_id": 99_999_999 }))
        .send()
        .await
        .expect("Failed to send switch request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_forgotten_account_cannot_switch() {
    let client = client();
    let base_url = base_url();
    let (login, password) = test_credentials();

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "login": login, "password": password, "remember": true }))
        .send()
        .await
        .expect("Failed to log in");
    let user: Value = resp.json().await.expect("Failed to parse user");
    let user_id = user.get("id").and_then(Value::as_i64).expect("missing id");

    let remove = client
        .post(format!("{base_url}/auth/saved-accounts/remove"))
        .json(&json!({ "user_id": user_id }))
        .send()
        .await
        .expect("Failed to remove saved account");
    assert_eq!(remove.status(), StatusCode::NO_CONTENT);

    client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");

    let switch = client
        .post(format!("{base_url}/auth/switch-account"))
        .json(&json!({ "user_id": user_id }))
        .send()
        .await
        .expect("Failed to send switch request");
    assert_eq!(switch.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and seeded database"]
async fn test_login_rate_limit() {
    let client = client();
    let base_url = base_url();

    // Burn through the per-device login budget.
    let mut last_status = StatusCode::OK;
    for _ in 0..10 {
        let resp = client
            .post(format!("{base_url}/auth/login"))
            .json(&json!({ "login": "nobody@example.com", "password": "x" }))
            .send()
            .await
            .expect("Failed to send login request");
        last_status = resp.status();
        if last_status == StatusCode::TOO_MANY_REQUESTS {
            assert!(
                resp.headers().contains_key(reqwest::header::RETRY_AFTER),
                "429 must carry Retry-After"
            );
            return;
        }
    }

    panic!("rate limit never triggered, last status: {last_status}");
}
