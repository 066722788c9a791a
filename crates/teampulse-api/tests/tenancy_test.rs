//! Organization isolation integration tests.
//!
//! Run with: `cargo test -p teampulse-api --test tenancy_test -- --ignored`
//! Requires Docker for testcontainers (Postgres).

mod helpers;

use helpers::auth::{move_to_new_organization, register_manager};
use helpers::setup_test_app_with;
use serde_json::{json, Value};
use teampulse_core::DEFAULT_ORGANIZATION_ID;

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_teams_are_scoped_to_organization() {
    let app = setup_test_app_with(&[("ENABLE_ORGANIZATIONS", "true")]).await;
    let client = app.client();

    let alice = register_manager(client, app.pool(), "alice@acme.test").await;
    let bob = register_manager(client, app.pool(), "bob@globex.test").await;
    let globex = move_to_new_organization(app.pool(), bob.id, "Globex").await;

    let response = client
        .post("/api/teams")
        .add_header("Authorization", alice.bearer())
        .json(&json!({ "name": "Platform" }))
        .await;
    assert_eq!(response.status_code(), 201);
    let team: Value = response.json();
    assert_eq!(team["organization_id"], DEFAULT_ORGANIZATION_ID.to_string());
    let team_id = team["id"].as_str().expect("team id").to_string();

    // bob works in his own organization and sees nothing of alice's
    let response = client
        .get("/api/teams")
        .add_header("Authorization", bob.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let teams: Vec<Value> = response.json();
    assert!(teams.is_empty());

    let response = client
        .get(&format!("/api/teams/{}", team_id))
        .add_header("Authorization", bob.bearer())
        .await;
    assert_eq!(response.status_code(), 404);

    // the same team name is free in another organization
    let response = client
        .post("/api/teams")
        .add_header("Authorization", bob.bearer())
        .add_header("X-Organization-ID", globex.to_string())
        .json(&json!({ "name": "Platform" }))
        .await;
    assert_eq!(response.status_code(), 201);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_foreign_organization_header_forbidden() {
    let app = setup_test_app_with(&[("ENABLE_ORGANIZATIONS", "true")]).await;
    let client = app.client();

    let bob = register_manager(client, app.pool(), "bob@globex.test").await;
    move_to_new_organization(app.pool(), bob.id, "Globex").await;

    let response = client
        .get("/api/teams")
        .add_header("Authorization", bob.bearer())
        .add_header("X-Organization-ID", DEFAULT_ORGANIZATION_ID.to_string())
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unknown_organization_not_found() {
    let app = setup_test_app_with(&[("ENABLE_ORGANIZATIONS", "true")]).await;
    let client = app.client();

    let alice = register_manager(client, app.pool(), "alice@acme.test").await;
    let response = client
        .get("/api/teams")
        .add_header("Authorization", alice.bearer())
        .add_header("X-Organization-ID", "org_does_not_exist")
        .await;
    assert_eq!(response.status_code(), 404);
}
