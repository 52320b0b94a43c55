//! Integration tests for the password reset flow.
//!
//! Requires a running server; see the crate docs for setup.

use reqwest::StatusCode;
use serde_json::json;

use courierhub_integration_tests::{base_url, client};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_reset_request_never_reveals_accounts() {
    let client = client();

    // Unknown address gets the same 204 as a real one.
    let resp = client
        .post(format!("{}/auth/reset-password/request", base_url()))
        .json(&json!({ "email": "nobody@example.com" }))
        .send()
        .await
        .expect("Failed to send reset request");

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_reset_complete_rejects_bogus_token() {
    let client = client();

    let resp = client
        .post(format!("{}/auth/reset-password/complete", base_url()))
        .json(&json!({
            "email": "nobody@example.com",
            "proof": "not-a-real-token",
            "new_password": "brand-new-password"
        }))
        .send()
        .await
        .expect("Failed to send reset completion");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_reset_request_rate_limit() {
    let client = client();
    let base_url = base_url();

    for _ in 0..5 {
        let resp = client
            .post(format!("{base_url}/auth/reset-password/request"))
            .json(&json!({ "email": "nobody@example.com" }))
            .send()
            .await
            .expect("Failed to send reset request");
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return;
        }
    }

    panic!("reset request rate limit never triggered");
}
