//! Invitation persistence
//!
//! The invitation workflow talks to storage through [`InvitationStore`] so it can run
//! against an in-memory store in tests. Status changes are conditional on the current
//! status, which makes concurrent revoke/accept/expire attempts resolve to one winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{Invitation, InvitationStatus, NewInvitation},
    AppError,
};
use uuid::Uuid;

use crate::db::transaction::with_transaction;

const INVITATION_COLUMNS: &str = "id, email, status, expires_at, team_id, manager_id, \
                                  organization_id, external_id, accepted_by, created_at, updated_at";

#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// PENDING invitations issued by the manager that have not expired yet at `now`.
    async fn count_pending_for_manager(
        &self,
        manager_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// A PENDING invitation for the email and team that has not expired yet at `now`.
    async fn find_pending_for_email_and_team(
        &self,
        email: &str,
        team_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError>;

    async fn insert(&self, invitation: NewInvitation) -> Result<Invitation, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Invitation>, AppError>;

    async fn list_for_manager(
        &self,
        organization_id: Uuid,
        manager_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError>;

    async fn list_for_organization(&self, organization_id: Uuid)
        -> Result<Vec<Invitation>, AppError>;

    async fn find_pending_for_email(&self, email: &str) -> Result<Vec<Invitation>, AppError>;

    /// Move an invitation from `from` to `to`. Returns `None` when the invitation is no
    /// longer in `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, AppError>;

    /// Accept a PENDING invitation for `user_id`: the user joins the invitation's team and
    /// organization. Returns `None` when the invitation is no longer PENDING.
    async fn mark_accepted(&self, id: Uuid, user_id: Uuid)
        -> Result<Option<Invitation>, AppError>;

    async fn list_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Invitation>, AppError>;

    /// Clerk organization linked to a local organization, used to address
    /// organization-scoped invitations upstream.
    async fn clerk_organization_id(&self, organization_id: Uuid)
        -> Result<Option<String>, AppError>;
}

#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationStore for InvitationRepository {
    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "count"))]
    async fn count_pending_for_manager(
        &self,
        manager_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM invitations WHERE manager_id = $1 AND status = 'PENDING' AND expires_at > $2",
        )
        .bind(manager_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    async fn find_pending_for_email_and_team(
        &self,
        email: &str,
        team_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError> {
        let invitation = sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE email = $1 AND team_id = $2 AND status = 'PENDING' \
             AND expires_at > $3 LIMIT 1",
            INVITATION_COLUMNS
        ))
        .bind(email)
        .bind(team_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invitation)
    }

    #[tracing::instrument(skip(self, invitation), fields(db.table = "invitations", db.operation = "insert", db.record_id = %invitation.id))]
    async fn insert(&self, invitation: NewInvitation) -> Result<Invitation, AppError> {
        let row = sqlx::query_as::<Postgres, Invitation>(&format!(
            r#"
            INSERT INTO invitations (id, email, status, expires_at, team_id, manager_id, organization_id, external_id)
            VALUES ($1, $2, 'PENDING', $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        ))
        .bind(invitation.id)
        .bind(&invitation.email)
        .bind(invitation.expires_at)
        .bind(invitation.team_id)
        .bind(invitation.manager_id)
        .bind(invitation.organization_id)
        .bind(&invitation.external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Invitation>, AppError> {
        let invitation = sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE id = $1",
            INVITATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invitation)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    async fn list_for_manager(
        &self,
        organization_id: Uuid,
        manager_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError> {
        let rows = sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE organization_id = $1 AND manager_id = $2 ORDER BY created_at DESC",
            INVITATION_COLUMNS
        ))
        .bind(organization_id)
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Invitation>, AppError> {
        let rows = sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE organization_id = $1 ORDER BY created_at DESC",
            INVITATION_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    async fn find_pending_for_email(&self, email: &str) -> Result<Vec<Invitation>, AppError> {
        let rows = sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE email = $1 AND status = 'PENDING' ORDER BY created_at ASC",
            INVITATION_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "update", db.record_id = %id))]
    async fn update_status(
        &self,
        id: Uuid,
        from: InvitationStatus,
        to: InvitationStatus,
    ) -> Result<Option<Invitation>, AppError> {
        let row = sqlx::query_as::<Postgres, Invitation>(&format!(
            r#"
            UPDATE invitations SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "update", db.record_id = %id))]
    async fn mark_accepted(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Invitation>, AppError> {
        let accept_sql = format!(
            r#"
            UPDATE invitations SET status = 'ACCEPTED', accepted_by = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        );

        with_transaction(&self.pool, |tx| {
            Box::pin(async move {
                let accepted = sqlx::query_as::<Postgres, Invitation>(&accept_sql)
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(&mut **tx)
                    .await?;

                let Some(invitation) = accepted else {
                    return Ok(None);
                };

                sqlx::query(
                    "INSERT INTO team_members (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(invitation.team_id)
                .bind(user_id)
                .execute(&mut **tx)
                .await?;

                sqlx::query("UPDATE users SET organization_id = $2, updated_at = NOW() WHERE id = $1")
                    .bind(user_id)
                    .bind(invitation.organization_id)
                    .execute(&mut **tx)
                    .await?;

                Ok(Some(invitation))
            })
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "invitations", db.operation = "select"))]
    async fn list_expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Invitation>, AppError> {
        let rows = sqlx::query_as::<Postgres, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE status = 'PENDING' AND expires_at <= $1 ORDER BY expires_at ASC",
            INVITATION_COLUMNS
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select", db.record_id = %organization_id))]
    async fn clerk_organization_id(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<String>, AppError> {
        let clerk_id = sqlx::query_scalar::<Postgres, Option<String>>(
            "SELECT clerk_organization_id FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(clerk_id.flatten())
    }
}
