use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use teampulse_core::models::{CreateTaskRequest, Task, TaskListQuery, UpdateTaskRequest};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".to_string())
}

/// Create a task. The assignee, when given, must be a user of the same organization.
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid input or unknown reference", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    ValidatedJson(request): ValidatedJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    let task = state.db.tasks.create(org.id(), auth.id(), request).await?;
    tracing::info!(task_id = %task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    params(TaskListQuery),
    responses((status = 200, description = "Tasks visible to the caller", body = Vec<Task>)),
    security(("bearer_auth" = []))
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<Vec<Task>>, HttpAppError> {
    let tasks = state
        .db
        .tasks
        .list(org.id(), auth.owner_filter(), query.status)
        .await?;
    Ok(Json(tasks))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task", body = Task),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, HttpAppError> {
    let task = state
        .db
        .tasks
        .get(org.id(), id, auth.owner_filter())
        .await?
        .ok_or_else(task_not_found)?;
    Ok(Json(task))
}

/// Partial update; `null` clears description, assignee and due date.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, patch), fields(organization_id = %org.id()))]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<Task>, HttpAppError> {
    auth.require_manager()?;
    let task = state
        .db
        .tasks
        .update(org.id(), id, auth.owner_filter(), patch)
        .await?
        .ok_or_else(task_not_found)?;
    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    auth.require_manager()?;
    if !state.db.tasks.delete(org.id(), id, auth.owner_filter()).await? {
        return Err(task_not_found().into());
    }
    tracing::info!(task_id = %id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}
