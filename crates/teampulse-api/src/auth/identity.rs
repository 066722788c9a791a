//! Mapping verified identities to local users
//!
//! An external identity is looked up by provider id first, then by email (linking the
//! provider id to the existing account), and is provisioned as a plain USER otherwise.

use std::sync::Arc;
use teampulse_core::invitation_policy::normalize_email;
use teampulse_core::models::{AuthProvider, NewUser, User, UserRole};
use teampulse_core::{AppError, FeatureFlags};
use teampulse_db::{OrganizationRepository, UserRepository};
use teampulse_services::IdentityProvider;
use uuid::Uuid;

use crate::auth::jwt::VerifiedToken;
use crate::auth::models::VerifiedIdentity;

/// Local user for a request, and whether it was created just now
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub user: User,
    pub provisioned: bool,
}

#[derive(Clone)]
pub struct IdentityResolver {
    users: UserRepository,
    organizations: OrganizationRepository,
    identity_provider: Arc<dyn IdentityProvider>,
    flags: FeatureFlags,
}

impl IdentityResolver {
    pub fn new(
        users: UserRepository,
        organizations: OrganizationRepository,
        identity_provider: Arc<dyn IdentityProvider>,
        flags: FeatureFlags,
    ) -> Self {
        Self {
            users,
            organizations,
            identity_provider,
            flags,
        }
    }

    pub async fn resolve(&self, token: VerifiedToken) -> Result<ResolvedUser, AppError> {
        match token {
            VerifiedToken::Legacy { user_id } => {
                let user = self.users.get_by_id(user_id).await?.ok_or_else(|| {
                    AppError::Unauthorized("User for this token no longer exists".to_string())
                })?;
                Ok(ResolvedUser {
                    user,
                    provisioned: false,
                })
            }
            VerifiedToken::External(identity) => self.resolve_external(identity).await,
        }
    }

    #[tracing::instrument(skip(self, identity), fields(provider = identity.provider.as_str(), subject = %identity.subject))]
    async fn resolve_external(&self, identity: VerifiedIdentity) -> Result<ResolvedUser, AppError> {
        let provider = identity.provider.as_str();

        if let Some(user) = self
            .users
            .get_by_provider_id(provider, &identity.subject)
            .await?
        {
            return Ok(ResolvedUser {
                user,
                provisioned: false,
            });
        }

        let (email, name) = self.profile(&identity).await?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            let user = self
                .users
                .link_provider(existing.id, provider, &identity.subject)
                .await?;
            tracing::info!(user_id = %user.id, "Linked identity to existing user");
            return Ok(ResolvedUser {
                user,
                provisioned: false,
            });
        }

        let organization_id = self
            .initial_organization(identity.organization.as_deref())
            .await?;
        let user = self
            .users
            .create(NewUser {
                email,
                name,
                password_hash: None,
                auth_provider: identity.provider,
                auth_provider_id: Some(identity.subject.clone()),
                role: UserRole::User,
                organization_id: Some(organization_id),
            })
            .await?;

        tracing::info!(user_id = %user.id, organization_id = %organization_id, "Provisioned user");
        Ok(ResolvedUser {
            user,
            provisioned: true,
        })
    }

    /// Email and display name for the identity. Clerk session tokens usually carry
    /// neither, so the profile is fetched from the Clerk API.
    async fn profile(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<(String, Option<String>), AppError> {
        if let Some(email) = identity.email.as_deref() {
            return Ok((normalize_email(email), identity.name.clone()));
        }

        if identity.provider == AuthProvider::Clerk {
            let profile = self.identity_provider.get_user(&identity.subject).await?;
            return Ok((normalize_email(&profile.email), profile.name));
        }

        Err(AppError::Unauthorized(
            "Token does not carry an email address".to_string(),
        ))
    }

    /// Organization a new user joins: the one claimed by the session when multi-tenancy
    /// is on and we know it, the default organization otherwise.
    async fn initial_organization(&self, claimed: Option<&str>) -> Result<Uuid, AppError> {
        if self.flags.enable_organizations {
            if let Some(clerk_id) = claimed {
                if let Some(org) = self.organizations.get_by_clerk_id(clerk_id).await? {
                    return Ok(org.id);
                }
                tracing::warn!(clerk_organization_id = clerk_id, "Claimed organization is unknown, using default");
            }
        }
        Ok(self.flags.default_organization_id)
    }
}
