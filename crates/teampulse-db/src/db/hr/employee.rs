use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{CreateEmployeeRequest, Employee, UpdateEmployeeRequest},
    AppError,
};
use uuid::Uuid;

const EMPLOYEE_COLUMNS: &str =
    "id, organization_id, name, title, email, team_id, owner_id, start_date, created_at, updated_at";

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_team(&self, organization_id: Uuid, team_id: Uuid) -> Result<(), AppError> {
        let team_exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1 AND organization_id = $2)",
        )
        .bind(team_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        if !team_exists {
            return Err(AppError::BadRequest(
                "Team not found in this organization".to_string(),
            ));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "employees", db.operation = "insert"))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        owner_id: Uuid,
        request: CreateEmployeeRequest,
    ) -> Result<Employee, AppError> {
        self.ensure_team(organization_id, request.team_id).await?;

        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            r#"
            INSERT INTO employees (organization_id, name, title, email, team_id, owner_id, start_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(organization_id)
        .bind(request.name.trim())
        .bind(&request.title)
        .bind(request.email.as_deref().map(|e| e.trim().to_lowercase()))
        .bind(request.team_id)
        .bind(owner_id)
        .bind(request.start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(employee)
    }

    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select"))]
    pub async fn list(
        &self,
        organization_id: Uuid,
        owner: Option<Uuid>,
        team_id: Option<Uuid>,
    ) -> Result<Vec<Employee>, AppError> {
        let employees = sqlx::query_as::<Postgres, Employee>(&format!(
            r#"
            SELECT {} FROM employees
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR owner_id = $2)
              AND ($3::uuid IS NULL OR team_id = $3)
            ORDER BY name ASC
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(organization_id)
        .bind(owner)
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "select", db.record_id = %id))]
    pub async fn get(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            "SELECT {} FROM employees WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
            EMPLOYEE_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "employees", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
        patch: UpdateEmployeeRequest,
    ) -> Result<Option<Employee>, AppError> {
        let Some(current) = self.get(organization_id, id, owner).await? else {
            return Ok(None);
        };

        if let Some(team_id) = patch.team_id {
            if team_id != current.team_id {
                self.ensure_team(organization_id, team_id).await?;
            }
        }

        let name = patch
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or(current.name);
        let title = patch.title.or(current.title);
        let email = patch
            .email
            .map(|e| e.trim().to_lowercase())
            .or(current.email);
        let team_id = patch.team_id.unwrap_or(current.team_id);
        let start_date = patch.start_date.or(current.start_date);

        let employee = sqlx::query_as::<Postgres, Employee>(&format!(
            r#"
            UPDATE employees
            SET name = $3, title = $4, email = $5, team_id = $6, start_date = $7, updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(&name)
        .bind(&title)
        .bind(&email)
        .bind(team_id)
        .bind(start_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    #[tracing::instrument(skip(self), fields(db.table = "employees", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM employees WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
        )
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
