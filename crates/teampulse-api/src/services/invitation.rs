//! Invitation workflow
//!
//! Invitations live in two places: the local `invitations` table and the identity
//! provider, which sends the email and owns the sign-up flow. Issuing creates the
//! external invitation first and only then the local row, so a provider failure leaves
//! nothing behind. Revocation and expiry change the local row and then revoke the
//! provider copy best effort.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use teampulse_core::invitation_policy::{
    ensure_capacity, ensure_transition, expiry_from, is_expired, normalize_email,
};
use teampulse_core::models::{Invitation, InvitationStatus, NewInvitation, User};
use teampulse_core::AppError;
use teampulse_db::InvitationStore;
use teampulse_services::{ExternalInvitation, IdentityProvider};
use uuid::Uuid;

use crate::auth::AuthUser;

#[derive(Debug, Clone)]
pub struct InvitationSettings {
    pub max_pending_per_manager: i64,
    pub expiry_days: i64,
    /// Where the identity provider sends invitees after sign-up
    pub redirect_url: Option<String>,
}

#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn InvitationStore>,
    identity_provider: Arc<dyn IdentityProvider>,
    settings: InvitationSettings,
}

impl InvitationService {
    pub fn new(
        store: Arc<dyn InvitationStore>,
        identity_provider: Arc<dyn IdentityProvider>,
        settings: InvitationSettings,
    ) -> Self {
        Self {
            store,
            identity_provider,
            settings,
        }
    }

    /// Issue an invitation for `email` to join `team_id`. The caller has already checked
    /// the team belongs to `organization_id`.
    #[tracing::instrument(skip(self, actor, email), fields(manager_id = %actor.id()))]
    pub async fn issue(
        &self,
        actor: &AuthUser,
        organization_id: Uuid,
        team_id: Uuid,
        email: &str,
    ) -> Result<Invitation, AppError> {
        actor.require_manager()?;
        let email = normalize_email(email);
        let now = Utc::now();

        if self
            .store
            .find_pending_for_email_and_team(&email, team_id, now)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "A pending invitation already exists for this email and team".to_string(),
            ));
        }

        let pending = self.store.count_pending_for_manager(actor.id(), now).await?;
        ensure_capacity(pending, self.settings.max_pending_per_manager)?;

        let id = Uuid::new_v4();
        let clerk_organization_id = self.store.clerk_organization_id(organization_id).await?;
        let external_id = self
            .identity_provider
            .create_invitation(ExternalInvitation {
                email: email.clone(),
                redirect_url: self.settings.redirect_url.clone(),
                metadata: json!({
                    "invitation_id": id,
                    "team_id": team_id,
                    "organization_id": organization_id,
                    "manager_id": actor.id(),
                }),
                clerk_organization_id: clerk_organization_id.clone(),
            })
            .await?;

        let new_invitation = NewInvitation {
            id,
            email,
            expires_at: expiry_from(now, self.settings.expiry_days),
            team_id,
            manager_id: actor.id(),
            organization_id,
            external_id: Some(external_id.clone()),
        };

        match self.store.insert(new_invitation).await {
            Ok(invitation) => {
                tracing::info!(
                    invitation_id = %invitation.id,
                    team_id = %team_id,
                    expires_at = %invitation.expires_at,
                    "Invitation issued"
                );
                Ok(invitation)
            }
            Err(e) => {
                // the provider already sent the email; take it back
                self.revoke_external(&external_id, clerk_organization_id.as_deref())
                    .await;
                Err(e)
            }
        }
    }

    /// Invitations visible to the caller: all of the organization's for admins, the
    /// caller's own otherwise.
    pub async fn list(
        &self,
        actor: &AuthUser,
        organization_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError> {
        if actor.is_admin() {
            self.store.list_for_organization(organization_id).await
        } else {
            self.store.list_for_manager(organization_id, actor.id()).await
        }
    }

    #[tracing::instrument(skip(self, actor), fields(actor_id = %actor.id()))]
    pub async fn revoke(
        &self,
        actor: &AuthUser,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Invitation, AppError> {
        let invitation = self
            .store
            .get(id)
            .await?
            .filter(|inv| inv.organization_id == organization_id)
            .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

        if invitation.manager_id != actor.id() && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only the issuing manager or an admin can revoke this invitation".to_string(),
            ));
        }
        ensure_transition(invitation.status, InvitationStatus::Revoked)?;

        let revoked = self
            .store
            .update_status(id, InvitationStatus::Pending, InvitationStatus::Revoked)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Invitation is no longer pending".to_string())
            })?;

        if let Some(external_id) = revoked.external_id.as_deref() {
            let clerk_organization_id = self
                .store
                .clerk_organization_id(revoked.organization_id)
                .await
                .unwrap_or_default();
            self.revoke_external(external_id, clerk_organization_id.as_deref())
                .await;
        }

        tracing::info!(invitation_id = %id, "Invitation revoked");
        Ok(revoked)
    }

    /// Accept one invitation on behalf of `user`.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn accept(&self, user: &User, id: Uuid) -> Result<Invitation, AppError> {
        let invitation = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

        if normalize_email(&invitation.email) != normalize_email(&user.email) {
            return Err(AppError::Forbidden(
                "This invitation was sent to a different email address".to_string(),
            ));
        }

        if is_expired(&invitation, Utc::now()) {
            self.store
                .update_status(id, InvitationStatus::Pending, InvitationStatus::Expired)
                .await?;
            return Err(AppError::BadRequest("Invitation has expired".to_string()));
        }
        ensure_transition(invitation.status, InvitationStatus::Accepted)?;

        let accepted = self
            .store
            .mark_accepted(id, user.id)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("Invitation is no longer pending".to_string())
            })?;

        tracing::info!(invitation_id = %id, team_id = %accepted.team_id, "Invitation accepted");
        Ok(accepted)
    }

    /// Accept every pending, unexpired invitation addressed to the user's email.
    /// Overdue ones found on the way are expired.
    pub async fn accept_pending_for(&self, user: &User) -> Result<Vec<Invitation>, AppError> {
        let now = Utc::now();
        let pending = self
            .store
            .find_pending_for_email(&normalize_email(&user.email))
            .await?;

        let mut accepted = Vec::new();
        for invitation in pending {
            if is_expired(&invitation, now) {
                self.store
                    .update_status(
                        invitation.id,
                        InvitationStatus::Pending,
                        InvitationStatus::Expired,
                    )
                    .await?;
                continue;
            }
            if let Some(row) = self.store.mark_accepted(invitation.id, user.id).await? {
                accepted.push(row);
            }
        }

        if !accepted.is_empty() {
            tracing::info!(user_id = %user.id, count = accepted.len(), "Accepted pending invitations");
        }
        Ok(accepted)
    }

    /// Flip every overdue PENDING invitation to EXPIRED. Returns how many changed.
    #[tracing::instrument(skip(self))]
    pub async fn expire_sweep(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let overdue = self.store.list_expired_pending(now).await?;
        let mut expired = 0;

        for invitation in overdue {
            let Some(row) = self
                .store
                .update_status(
                    invitation.id,
                    InvitationStatus::Pending,
                    InvitationStatus::Expired,
                )
                .await?
            else {
                continue;
            };
            expired += 1;

            if let Some(external_id) = row.external_id.as_deref() {
                let clerk_organization_id = self
                    .store
                    .clerk_organization_id(row.organization_id)
                    .await
                    .unwrap_or_default();
                self.revoke_external(external_id, clerk_organization_id.as_deref())
                    .await;
            }
        }

        if expired > 0 {
            tracing::info!(expired, "Expired overdue invitations");
        }
        Ok(expired)
    }

    async fn revoke_external(&self, external_id: &str, clerk_organization_id: Option<&str>) {
        if let Err(e) = self
            .identity_provider
            .revoke_invitation(external_id, clerk_organization_id)
            .await
        {
            tracing::warn!(
                error = %e,
                external_id,
                "Failed to revoke invitation in identity provider"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_user, InMemoryInvitationStore, RecordingIdentityProvider};
    use chrono::Duration;
    use teampulse_core::models::UserRole;

    fn settings(max_pending: i64) -> InvitationSettings {
        InvitationSettings {
            max_pending_per_manager: max_pending,
            expiry_days: 7,
            redirect_url: Some("http://localhost:5173/accept-invitation".to_string()),
        }
    }

    fn service(
        store: &InMemoryInvitationStore,
        provider: &RecordingIdentityProvider,
        max_pending: i64,
    ) -> InvitationService {
        InvitationService::new(
            Arc::new(store.clone()),
            Arc::new(provider.clone()),
            settings(max_pending),
        )
    }

    fn manager() -> AuthUser {
        AuthUser::new(test_user("manager@example.com", UserRole::Manager), true)
    }

    #[tokio::test]
    async fn test_issue_mirrors_external_invitation() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let manager = manager();
        let org = Uuid::new_v4();
        let team = Uuid::new_v4();

        let invitation = svc
            .issue(&manager, org, team, "  New.Hire@Example.com ")
            .await
            .unwrap();

        assert_eq!(invitation.email, "new.hire@example.com");
        assert_eq!(invitation.status, InvitationStatus::Pending);
        assert_eq!(invitation.manager_id, manager.id());
        assert!(invitation.expires_at > Utc::now() + Duration::days(6));

        let created = provider.created();
        assert_eq!(created.len(), 1);
        assert_eq!(invitation.external_id.as_deref(), Some(created[0].0.as_str()));
        assert_eq!(created[0].1.metadata["team_id"], json!(team));
    }

    #[tokio::test]
    async fn test_plain_user_cannot_issue() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let user = AuthUser::new(test_user("user@example.com", UserRole::User), true);

        let err = svc
            .issue(&user, Uuid::new_v4(), Uuid::new_v4(), "x@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(provider.created().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_pending_rejected() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let manager = manager();
        let (org, team) = (Uuid::new_v4(), Uuid::new_v4());

        svc.issue(&manager, org, team, "dup@example.com").await.unwrap();
        let err = svc
            .issue(&manager, org, team, "DUP@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_pending_does_not_block_reinvite() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let manager = manager();
        let (org, team) = (Uuid::new_v4(), Uuid::new_v4());

        let stale = svc.issue(&manager, org, team, "late@example.com").await.unwrap();
        store.set_expires_at(stale.id, Utc::now() - Duration::days(1));

        let fresh = svc.issue(&manager, org, team, "late@example.com").await.unwrap();
        assert_ne!(fresh.id, stale.id);
        assert_eq!(fresh.status, InvitationStatus::Pending);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_ceiling_enforced_per_manager() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 2);
        let manager = manager();
        let org = Uuid::new_v4();

        for i in 0..2 {
            svc.issue(&manager, org, Uuid::new_v4(), &format!("p{}@example.com", i))
                .await
                .unwrap();
        }
        let err = svc
            .issue(&manager, org, Uuid::new_v4(), "p3@example.com")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InvitationLimitReached { pending: 2, limit: 2 }
        ));

        // another manager has their own budget
        svc.issue(&self::manager(), org, Uuid::new_v4(), "p3@example.com")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_provider_failure_stores_nothing() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::failing();
        let svc = service(&store, &provider, 10);

        let err = svc
            .issue(&manager(), Uuid::new_v4(), Uuid::new_v4(), "x@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalService { .. }));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_revoke_by_issuer_and_admin_only() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let issuer = manager();
        let org = Uuid::new_v4();
        let invitation = svc
            .issue(&issuer, org, Uuid::new_v4(), "x@example.com")
            .await
            .unwrap();

        let other = manager();
        assert!(matches!(
            svc.revoke(&other, org, invitation.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            svc.revoke(&issuer, Uuid::new_v4(), invitation.id).await,
            Err(AppError::NotFound(_))
        ));

        let admin = AuthUser::new(test_user("admin@example.com", UserRole::Admin), true);
        let revoked = svc.revoke(&admin, org, invitation.id).await.unwrap();
        assert_eq!(revoked.status, InvitationStatus::Revoked);
        assert_eq!(provider.revoked(), vec![invitation.external_id.unwrap()]);

        // terminal
        assert!(matches!(
            svc.revoke(&issuer, org, invitation.id).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_survives_provider_failure() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let issuer = manager();
        let org = Uuid::new_v4();
        let invitation = svc
            .issue(&issuer, org, Uuid::new_v4(), "x@example.com")
            .await
            .unwrap();

        provider.fail_revocations();
        let revoked = svc.revoke(&issuer, org, invitation.id).await.unwrap();
        assert_eq!(revoked.status, InvitationStatus::Revoked);
    }

    #[tokio::test]
    async fn test_accept_requires_matching_email() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let invitation = svc
            .issue(&manager(), Uuid::new_v4(), Uuid::new_v4(), "invitee@example.com")
            .await
            .unwrap();

        let stranger = test_user("stranger@example.com", UserRole::User);
        assert!(matches!(
            svc.accept(&stranger, invitation.id).await,
            Err(AppError::Forbidden(_))
        ));

        let invitee = test_user("Invitee@Example.com", UserRole::User);
        let accepted = svc.accept(&invitee, invitation.id).await.unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(accepted.accepted_by, Some(invitee.id));

        assert!(matches!(
            svc.accept(&invitee, invitation.id).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_accepting_expired_invitation_expires_it() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let invitation = svc
            .issue(&manager(), Uuid::new_v4(), Uuid::new_v4(), "late@example.com")
            .await
            .unwrap();
        store.set_expires_at(invitation.id, Utc::now() - Duration::hours(1));

        let late = test_user("late@example.com", UserRole::User);
        let err = svc.accept(&late, invitation.id).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("expired")));
        assert_eq!(store.status(invitation.id), Some(InvitationStatus::Expired));
    }

    #[tokio::test]
    async fn test_accept_pending_for_skips_overdue() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let org = Uuid::new_v4();
        let fresh = svc
            .issue(&manager(), org, Uuid::new_v4(), "hire@example.com")
            .await
            .unwrap();
        let stale = svc
            .issue(&manager(), org, Uuid::new_v4(), "hire@example.com")
            .await
            .unwrap();
        store.set_expires_at(stale.id, Utc::now() - Duration::minutes(5));

        let hire = test_user("hire@example.com", UserRole::User);
        let accepted = svc.accept_pending_for(&hire).await.unwrap();
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].id, fresh.id);
        assert_eq!(store.status(stale.id), Some(InvitationStatus::Expired));
    }

    #[tokio::test]
    async fn test_expire_sweep_counts_and_revokes_externally() {
        let store = InMemoryInvitationStore::default();
        let provider = RecordingIdentityProvider::default();
        let svc = service(&store, &provider, 10);
        let org = Uuid::new_v4();
        let overdue = svc
            .issue(&manager(), org, Uuid::new_v4(), "a@example.com")
            .await
            .unwrap();
        let current = svc
            .issue(&manager(), org, Uuid::new_v4(), "b@example.com")
            .await
            .unwrap();
        store.set_expires_at(overdue.id, Utc::now() - Duration::days(1));

        assert_eq!(svc.expire_sweep(Utc::now()).await.unwrap(), 1);
        assert_eq!(store.status(overdue.id), Some(InvitationStatus::Expired));
        assert_eq!(store.status(current.id), Some(InvitationStatus::Pending));
        assert_eq!(provider.revoked(), vec![overdue.external_id.unwrap()]);

        // nothing left to do
        assert_eq!(svc.expire_sweep(Utc::now()).await.unwrap(), 0);
    }
}
