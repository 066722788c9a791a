//! Team API integration tests.
//!
//! Run with: `cargo test -p teampulse-api --test teams_test -- --ignored`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::auth::{register_manager, register_test_user};
use helpers::setup_test_app;
use serde_json::{json, Value};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_team_lifecycle() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;

    let response = client
        .post("/api/teams")
        .add_header("Authorization", manager.bearer())
        .json(&json!({ "name": "Platform", "department": "Engineering" }))
        .await;
    assert_eq!(response.status_code(), 201);
    let team: Value = response.json();
    let team_id = team["id"].as_str().expect("team id").to_string();
    assert_eq!(team["owner_id"], manager.id.to_string());

    let response = client
        .put(&format!("/api/teams/{}", team_id))
        .add_header("Authorization", manager.bearer())
        .json(&json!({ "name": "Platform Core", "department": null }))
        .await;
    assert_eq!(response.status_code(), 200);
    let team: Value = response.json();
    assert_eq!(team["name"], "Platform Core");
    assert!(team["department"].is_null());

    let response = client
        .get("/api/teams")
        .add_header("Authorization", manager.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let teams: Vec<Value> = response.json();
    assert_eq!(teams.len(), 1);

    let response = client
        .delete(&format!("/api/teams/{}", team_id))
        .add_header("Authorization", manager.bearer())
        .await;
    assert_eq!(response.status_code(), 204);

    let response = client
        .get(&format!("/api/teams/{}", team_id))
        .add_header("Authorization", manager.bearer())
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_duplicate_team_name_rejected() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;

    for expected in [201, 400] {
        let response = client
            .post("/api/teams")
            .add_header("Authorization", manager.bearer())
            .json(&json!({ "name": "Sales" }))
            .await;
        assert_eq!(response.status_code(), expected);
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_plain_user_cannot_create_team() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "user@example.com").await;

    let response = client
        .post("/api/teams")
        .add_header("Authorization", user.bearer())
        .json(&json!({ "name": "Shadow IT" }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_analytics_counts_teams() {
    let app = setup_test_app().await;
    let client = app.client();
    let manager = register_manager(client, app.pool(), "manager@example.com").await;

    for name in ["Alpha", "Beta"] {
        let response = client
            .post("/api/teams")
            .add_header("Authorization", manager.bearer())
            .json(&json!({ "name": name }))
            .await;
        assert_eq!(response.status_code(), 201);
    }

    let response = client
        .get("/api/analytics/summary")
        .add_header("Authorization", manager.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let summary: Value = response.json();
    assert_eq!(summary["team_count"], 2);
}
