use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User role for authorization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "user_role", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Manager,
    User,
}

impl UserRole {
    /// Role after applying the admin feature flag. With the flag off ADMIN behaves as MANAGER.
    pub fn effective(self, admin_enabled: bool) -> Self {
        match self {
            UserRole::Admin if !admin_enabled => UserRole::Manager,
            other => other,
        }
    }

    /// Whether the role may create and edit teams, employees, tasks and invitations.
    pub fn can_manage(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }

    pub fn is_admin(self) -> bool {
        self == UserRole::Admin
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::Manager => write!(f, "MANAGER"),
            UserRole::User => write!(f, "USER"),
        }
    }
}

/// Identity provider a user signs in with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Clerk,
    Supabase,
    Password,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Clerk => "clerk",
            AuthProvider::Supabase => "supabase",
            AuthProvider::Password => "password",
        }
    }
}

/// User row. `password_hash` is only set for legacy password accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub auth_provider: String,
    pub auth_provider_id: Option<String>,
    pub role: UserRole,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub auth_provider: String,
    pub role: UserRole,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            auth_provider: user.auth_provider,
            role: user.role,
            organization_id: user.organization_id,
            created_at: user.created_at,
        }
    }
}

/// Data needed to insert a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    pub auth_provider_id: Option<String>,
    pub role: UserRole,
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_is_demoted_when_flag_off() {
        assert_eq!(UserRole::Admin.effective(false), UserRole::Manager);
        assert_eq!(UserRole::Admin.effective(true), UserRole::Admin);
        assert_eq!(UserRole::User.effective(true), UserRole::User);
    }

    #[test]
    fn test_can_manage() {
        assert!(UserRole::Admin.can_manage());
        assert!(UserRole::Manager.can_manage());
        assert!(!UserRole::User.can_manage());
    }

    #[test]
    fn test_role_serializes_upper_case() {
        assert_eq!(
            serde_json::to_string(&UserRole::Manager).unwrap(),
            "\"MANAGER\""
        );
        let role: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            name: None,
            password_hash: Some("$argon2id$secret".to_string()),
            auth_provider: "password".to_string(),
            auth_provider_id: None,
            role: UserRole::User,
            organization_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
    }
}
