use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{CreateDepartmentRequest, Department, UpdateDepartmentRequest},
    AppError,
};
use uuid::Uuid;

use crate::db::map_unique_violation;

const DEPARTMENT_COLUMNS: &str =
    "id, organization_id, name, head_id, owner_id, created_at, updated_at";
const DUPLICATE_DEPARTMENT: &str = "A department with this name already exists in the organization";

#[derive(Clone)]
pub struct DepartmentRepository {
    pool: PgPool,
}

impl DepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "departments", db.operation = "insert"))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        owner_id: Uuid,
        request: CreateDepartmentRequest,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<Postgres, Department>(&format!(
            r#"
            INSERT INTO departments (organization_id, name, head_id, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            DEPARTMENT_COLUMNS
        ))
        .bind(organization_id)
        .bind(request.name.trim())
        .bind(request.head_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_DEPARTMENT))?;

        Ok(department)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "select"))]
    pub async fn list(
        &self,
        organization_id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<Postgres, Department>(&format!(
            "SELECT {} FROM departments WHERE organization_id = $1 AND ($2::uuid IS NULL OR owner_id = $2) ORDER BY name ASC",
            DEPARTMENT_COLUMNS
        ))
        .bind(organization_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(departments)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "select", db.record_id = %id))]
    pub async fn get(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Option<Department>, AppError> {
        let department = sqlx::query_as::<Postgres, Department>(&format!(
            "SELECT {} FROM departments WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
            DEPARTMENT_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(department)
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "departments", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
        patch: UpdateDepartmentRequest,
    ) -> Result<Option<Department>, AppError> {
        let Some(current) = self.get(organization_id, id, owner).await? else {
            return Ok(None);
        };

        let name = patch
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or(current.name);
        let head_id = patch.head_id.unwrap_or(current.head_id);

        let department = sqlx::query_as::<Postgres, Department>(&format!(
            r#"
            UPDATE departments SET name = $3, head_id = $4, updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING {}
            "#,
            DEPARTMENT_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(&name)
        .bind(head_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DUPLICATE_DEPARTMENT))?;

        Ok(department)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM departments WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
        )
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
