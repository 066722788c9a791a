use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{CreateTeamRequest, Team, TeamMember, UpdateTeamRequest},
    AppError,
};
use uuid::Uuid;

use crate::db::map_unique_violation;

const TEAM_COLUMNS: &str =
    "id, organization_id, name, department, head_id, owner_id, created_at, updated_at";
const DUPLICATE_TEAM: &str = "A team with this name already exists in the organization";

/// Repository for teams and team membership.
///
/// `owner` narrows every query to rows owned by that user; `None` means organization-wide
/// access.
#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "teams", db.operation = "insert"))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        owner_id: Uuid,
        request: CreateTeamRequest,
    ) -> Result<Team, AppError> {
        let name = request.name.trim().to_string();

        let duplicate_exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE organization_id = $1 AND name = $2)",
        )
        .bind(organization_id)
        .bind(&name)
        .fetch_one(&self.pool)
        .await?;

        if duplicate_exists {
            return Err(AppError::BadRequest(DUPLICATE_TEAM.to_string()));
        }

        let team = sqlx::query_as::<Postgres, Team>(&format!(
            r#"
            INSERT INTO teams (organization_id, name, department, head_id, owner_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TEAM_COLUMNS
        ))
        .bind(organization_id)
        .bind(&name)
        .bind(&request.department)
        .bind(request.head_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_TEAM))?;

        Ok(team)
    }

    #[tracing::instrument(skip(self), fields(db.table = "teams", db.operation = "select"))]
    pub async fn list(
        &self,
        organization_id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Vec<Team>, AppError> {
        let teams = sqlx::query_as::<Postgres, Team>(&format!(
            "SELECT {} FROM teams WHERE organization_id = $1 AND ($2::uuid IS NULL OR owner_id = $2) ORDER BY name ASC",
            TEAM_COLUMNS
        ))
        .bind(organization_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    #[tracing::instrument(skip(self), fields(db.table = "teams", db.operation = "select", db.record_id = %id))]
    pub async fn get(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<Postgres, Team>(&format!(
            "SELECT {} FROM teams WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
            TEAM_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    /// Apply a partial update. Returns `None` when the team is not visible to the caller.
    #[tracing::instrument(skip(self, patch), fields(db.table = "teams", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
        patch: UpdateTeamRequest,
    ) -> Result<Option<Team>, AppError> {
        let Some(current) = self.get(organization_id, id, owner).await? else {
            return Ok(None);
        };

        let name = patch
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or(current.name.clone());

        if name != current.name {
            let duplicate_exists = sqlx::query_scalar::<Postgres, bool>(
                "SELECT EXISTS(SELECT 1 FROM teams WHERE organization_id = $1 AND name = $2 AND id != $3)",
            )
            .bind(organization_id)
            .bind(&name)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

            if duplicate_exists {
                return Err(AppError::BadRequest(DUPLICATE_TEAM.to_string()));
            }
        }

        let department = patch.department.unwrap_or(current.department);
        let head_id = patch.head_id.unwrap_or(current.head_id);

        let team = sqlx::query_as::<Postgres, Team>(&format!(
            r#"
            UPDATE teams SET name = $3, department = $4, head_id = $5, updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING {}
            "#,
            TEAM_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(&name)
        .bind(&department)
        .bind(head_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_TEAM))?;

        Ok(team)
    }

    /// Delete a team. Employees and pending invitations of the team go with it.
    #[tracing::instrument(skip(self), fields(db.table = "teams", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM teams WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
        )
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "team_members", db.operation = "select"))]
    pub async fn list_members(&self, team_id: Uuid) -> Result<Vec<TeamMember>, AppError> {
        let members = sqlx::query_as::<Postgres, TeamMember>(
            r#"
            SELECT tm.team_id, tm.user_id, u.email, u.name, tm.joined_at
            FROM team_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id = $1
            ORDER BY tm.joined_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Whether a team exists in the organization, regardless of owner.
    #[tracing::instrument(skip(self), fields(db.table = "teams", db.operation = "select"))]
    pub async fn exists_in_organization(
        &self,
        organization_id: Uuid,
        team_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE organization_id = $1 AND id = $2)",
        )
        .bind(organization_id)
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
