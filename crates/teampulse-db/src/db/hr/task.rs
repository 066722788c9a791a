use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{CreateTaskRequest, Task, TaskStatus, UpdateTaskRequest},
    AppError,
};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, organization_id, title, description, status, assignee_id, \
                            due_date, owner_id, created_at, updated_at";

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_assignee(&self, organization_id: Uuid, assignee_id: Uuid) -> Result<(), AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE id = $1 AND organization_id = $2)",
        )
        .bind(assignee_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        if !exists {
            return Err(AppError::BadRequest(
                "Assignee not found in this organization".to_string(),
            ));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "tasks", db.operation = "insert"))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        owner_id: Uuid,
        request: CreateTaskRequest,
    ) -> Result<Task, AppError> {
        if let Some(assignee_id) = request.assignee_id {
            self.ensure_assignee(organization_id, assignee_id).await?;
        }

        let task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            INSERT INTO tasks (organization_id, title, description, status, assignee_id, due_date, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(organization_id)
        .bind(request.title.trim())
        .bind(&request.description)
        .bind(request.status.unwrap_or(TaskStatus::Todo))
        .bind(request.assignee_id)
        .bind(request.due_date)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select"))]
    pub async fn list(
        &self,
        organization_id: Uuid,
        owner: Option<Uuid>,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            SELECT {} FROM tasks
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR owner_id = $2)
              AND ($3::task_status IS NULL OR status = $3)
            ORDER BY due_date ASC NULLS LAST, created_at DESC
            "#,
            TASK_COLUMNS
        ))
        .bind(organization_id)
        .bind(owner)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "select", db.record_id = %id))]
    pub async fn get(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<Postgres, Task>(&format!(
            "SELECT {} FROM tasks WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
            TASK_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    #[tracing::instrument(skip(self, patch), fields(db.table = "tasks", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
        patch: UpdateTaskRequest,
    ) -> Result<Option<Task>, AppError> {
        let Some(current) = self.get(organization_id, id, owner).await? else {
            return Ok(None);
        };

        if let Some(Some(assignee_id)) = patch.assignee_id {
            self.ensure_assignee(organization_id, assignee_id).await?;
        }

        let title = patch
            .title
            .map(|t| t.trim().to_string())
            .unwrap_or(current.title);
        let description = patch.description.unwrap_or(current.description);
        let status = patch.status.unwrap_or(current.status);
        let assignee_id = patch.assignee_id.unwrap_or(current.assignee_id);
        let due_date = patch.due_date.unwrap_or(current.due_date);

        let task = sqlx::query_as::<Postgres, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, status = $5, assignee_id = $6, due_date = $7, updated_at = NOW()
            WHERE organization_id = $1 AND id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(&title)
        .bind(&description)
        .bind(status)
        .bind(assignee_id)
        .bind(due_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tasks", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(
        &self,
        organization_id: Uuid,
        id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM tasks WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR owner_id = $3)",
        )
        .bind(organization_id)
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
