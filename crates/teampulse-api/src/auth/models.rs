use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use teampulse_core::models::{AuthProvider, User, UserRole};
use teampulse_core::{AppError, OrgContext};
use uuid::Uuid;

use crate::error::HttpAppError;

/// Claims on tokens minted by `/api/auth/login` and `/api/auth/register`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LegacyClaims {
    pub sub: Uuid,
    pub email: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
}

/// Subset of the Supabase Auth access-token claims we rely on.
#[derive(Debug, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<serde_json::Value>,
}

/// Subset of the Clerk session-token claims we rely on.
#[derive(Debug, Deserialize)]
pub struct ClerkClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Active organization of the session, when the user picked one.
    #[serde(default)]
    pub org_id: Option<String>,
}

/// Identity established from a verified bearer token, before it is mapped to a local user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub provider: AuthProvider,
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Clerk organization id claimed by the session
    pub organization: Option<String>,
}

/// Authenticated caller, inserted into request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// Role after applying the admin feature flag
    pub role: UserRole,
}

impl AuthUser {
    pub fn new(user: User, admin_enabled: bool) -> Self {
        let role = user.role.effective(admin_enabled);
        Self { user, role }
    }

    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Ownership filter for tenant queries: admins see the whole organization, everyone
    /// else only the rows they own.
    pub fn owner_filter(&self) -> Option<Uuid> {
        if self.is_admin() {
            None
        } else {
            Some(self.user.id)
        }
    }

    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.role.can_manage() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Manager or admin role required".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Authentication required".to_string())))
    }
}

/// Organization the request is scoped to, set by the organization-context middleware.
#[derive(Debug, Clone, Copy)]
pub struct CurrentOrg(pub OrgContext);

impl CurrentOrg {
    pub fn id(&self) -> Uuid {
        self.0.organization_id
    }
}

impl<S> FromRequestParts<S> for CurrentOrg
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OrgContext>()
            .copied()
            .map(CurrentOrg)
            .ok_or_else(|| {
                HttpAppError(AppError::Internal(
                    "Organization context middleware not applied".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "manager@example.com".to_string(),
            name: Some("Morgan".to_string()),
            password_hash: None,
            auth_provider: "password".to_string(),
            auth_provider_id: None,
            role,
            organization_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_demoted_when_flag_off() {
        let auth = AuthUser::new(user_with_role(UserRole::Admin), false);
        assert_eq!(auth.role, UserRole::Manager);
        assert!(!auth.is_admin());
        assert_eq!(auth.owner_filter(), Some(auth.id()));
        assert!(auth.require_manager().is_ok());
        assert!(auth.require_admin().is_err());
    }

    #[test]
    fn test_admin_sees_whole_organization() {
        let auth = AuthUser::new(user_with_role(UserRole::Admin), true);
        assert!(auth.is_admin());
        assert_eq!(auth.owner_filter(), None);
    }

    #[test]
    fn test_plain_user_cannot_manage() {
        let auth = AuthUser::new(user_with_role(UserRole::User), true);
        assert!(matches!(
            auth.require_manager(),
            Err(AppError::Forbidden(_))
        ));
    }
}
