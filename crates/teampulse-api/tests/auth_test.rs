//! Password auth integration tests.
//!
//! Run with: `cargo test -p teampulse-api --test auth_test -- --ignored`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::auth::{register_test_user, TEST_PASSWORD};
use helpers::setup_test_app;
use serde_json::{json, Value};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_register_then_login() {
    let app = setup_test_app().await;
    let client = app.client();

    let user = register_test_user(client, "Alice@Example.com").await;

    let response = client
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["role"], "USER");
    assert_eq!(body["user"]["id"], user.id.to_string());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_register_duplicate_email_rejected() {
    let app = setup_test_app().await;
    let client = app.client();

    register_test_user(client, "bob@example.com").await;
    let response = client
        .post("/api/auth/register")
        .json(&json!({ "email": "BOB@example.com", "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_login_wrong_password() {
    let app = setup_test_app().await;
    let client = app.client();

    register_test_user(client, "carol@example.com").await;
    let response = client
        .post("/api/auth/login")
        .json(&json!({ "email": "carol@example.com", "password": "not-the-password" }))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_me_returns_current_user() {
    let app = setup_test_app().await;
    let client = app.client();

    let user = register_test_user(client, "dave@example.com").await;
    let response = client
        .get("/api/users/me")
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["email"], "dave@example.com");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_health_reports_database() {
    let app = setup_test_app().await;
    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["identity_provider"], "local");
    assert_eq!(body["survey_backend"], "not_configured");
}
