//! Invitation workflow integration tests.
//!
//! Run with: `cargo test -p teampulse-api --test invitations_test -- --ignored`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use axum_test::TestServer;
use helpers::auth::{register_manager, register_test_user, TestUser};
use helpers::setup_test_app;
use serde_json::{json, Value};

async fn create_team(client: &TestServer, manager: &TestUser, name: &str) -> String {
    let response = client
        .post("/api/teams")
        .add_header("Authorization", manager.bearer())
        .json(&json!({ "name": name }))
        .await;
    assert_eq!(response.status_code(), 201);
    let team: Value = response.json();
    team["id"].as_str().expect("team id").to_string()
}

async fn invite(client: &TestServer, manager: &TestUser, email: &str, team_id: &str) -> u16 {
    client
        .post("/api/invitations")
        .add_header("Authorization", manager.bearer())
        .json(&json!({ "email": email, "team_id": team_id }))
        .await
        .status_code()
        .as_u16()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_invitee_joins_team_on_sign_up() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;
    let team_id = create_team(client, &manager, "Support").await;

    assert_eq!(invite(client, &manager, "New.Hire@example.com", &team_id).await, 201);

    let hire = register_test_user(client, "new.hire@example.com").await;

    let response = client
        .get(&format!("/api/teams/{}/members", team_id))
        .add_header("Authorization", manager.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let members: Vec<Value> = response.json();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["user_id"], hire.id.to_string());

    let response = client
        .get("/api/invitations")
        .add_header("Authorization", manager.bearer())
        .await;
    let invitations: Vec<Value> = response.json();
    assert_eq!(invitations[0]["status"], "ACCEPTED");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_pending_invitation_rejected() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;
    let team_id = create_team(client, &manager, "Support").await;

    assert_eq!(invite(client, &manager, "someone@example.com", &team_id).await, 201);
    assert_eq!(invite(client, &manager, "SOMEONE@example.com", &team_id).await, 400);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_expired_pending_invitation_allows_reinvite() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;
    let team_id = create_team(client, &manager, "Support").await;

    assert_eq!(invite(client, &manager, "late@example.com", &team_id).await, 201);
    sqlx::query("UPDATE invitations SET expires_at = NOW() - INTERVAL '1 day' WHERE email = $1")
        .bind("late@example.com")
        .execute(app.pool())
        .await
        .expect("backdate invitation");

    assert_eq!(invite(client, &manager, "late@example.com", &team_id).await, 201);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_invitation_to_unknown_team_not_found() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;

    let missing = uuid::Uuid::new_v4().to_string();
    assert_eq!(invite(client, &manager, "someone@example.com", &missing).await, 404);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_revoke_pending_invitation() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;
    let team_id = create_team(client, &manager, "Support").await;

    let response = client
        .post("/api/invitations")
        .add_header("Authorization", manager.bearer())
        .json(&json!({ "email": "someone@example.com", "team_id": team_id }))
        .await;
    let invitation: Value = response.json();
    let invitation_id = invitation["id"].as_str().expect("invitation id");

    let response = client
        .post(&format!("/api/invitations/{}/revoke", invitation_id))
        .add_header("Authorization", manager.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let revoked: Value = response.json();
    assert_eq!(revoked["status"], "REVOKED");

    // a revoked invitation no longer blocks a fresh one
    assert_eq!(invite(client, &manager, "someone@example.com", &team_id).await, 201);
}
