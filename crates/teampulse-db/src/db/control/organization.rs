use sqlx::{PgPool, Postgres};
use teampulse_core::{models::Organization, AppError};
use uuid::Uuid;

use crate::db::map_unique_violation;

/// Repository for tenant organizations
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<Postgres, Organization>(
            "SELECT id, clerk_organization_id, name, created_at, updated_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    /// Look up the local organization mirroring a Clerk organization
    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    pub async fn get_by_clerk_id(
        &self,
        clerk_organization_id: &str,
    ) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<Postgres, Organization>(
            "SELECT id, clerk_organization_id, name, created_at, updated_at FROM organizations WHERE clerk_organization_id = $1",
        )
        .bind(clerk_organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "insert"))]
    pub async fn create(
        &self,
        name: &str,
        clerk_organization_id: Option<&str>,
    ) -> Result<Organization, AppError> {
        let org = sqlx::query_as::<Postgres, Organization>(
            r#"
            INSERT INTO organizations (name, clerk_organization_id)
            VALUES ($1, $2)
            RETURNING id, clerk_organization_id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(clerk_organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, "Clerk organization is already linked to an organization")
        })?;

        Ok(org)
    }

    /// Make sure the fallback organization exists. Idempotent.
    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "upsert", db.record_id = %id))]
    pub async fn ensure_default(&self, id: Uuid, name: &str) -> Result<Organization, AppError> {
        sqlx::query("INSERT INTO organizations (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal("Default organization missing after insert".to_string()))
    }
}
