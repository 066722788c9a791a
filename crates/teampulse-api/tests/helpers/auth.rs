use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "TestPassword123!";

/// Registered password user with a bearer token for requests.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Register a password account through the API.
pub async fn register_test_user(client: &TestServer, email: &str) -> TestUser {
    let response = client
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    assert_eq!(response.status_code(), 201, "register failed: {}", response.text());

    let body: Value = response.json();
    TestUser {
        id: body["user"]["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("user id in register response"),
        email: email.to_string(),
        token: body["token"]
            .as_str()
            .expect("token in register response")
            .to_string(),
    }
}

/// Set a user's role directly. Roles are read from the database on every request, so the
/// existing token picks the change up.
pub async fn set_role(pool: &sqlx::PgPool, user_id: Uuid, role: &str) {
    sqlx::query("UPDATE users SET role = $2::user_role WHERE id = $1")
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await
        .expect("Failed to update role");
}

/// Register a user and promote them to MANAGER.
pub async fn register_manager(client: &TestServer, pool: &sqlx::PgPool, email: &str) -> TestUser {
    let user = register_test_user(client, email).await;
    set_role(pool, user.id, "MANAGER").await;
    user
}

/// Create an organization row and move the user into it.
pub async fn move_to_new_organization(pool: &sqlx::PgPool, user_id: Uuid, name: &str) -> Uuid {
    let organization_id: Uuid =
        sqlx::query_scalar("INSERT INTO organizations (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .expect("Failed to create organization");
    sqlx::query("UPDATE users SET organization_id = $2 WHERE id = $1")
        .bind(user_id)
        .bind(organization_id)
        .execute(pool)
        .await
        .expect("Failed to move user");
    organization_id
}
