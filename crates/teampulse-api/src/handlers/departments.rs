use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use teampulse_core::models::{CreateDepartmentRequest, Department, UpdateDepartmentRequest};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

fn department_not_found() -> AppError {
    AppError::NotFound("Department not found".to_string())
}

#[utoipa::path(
    post,
    path = "/api/departments",
    tag = "departments",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Invalid input or duplicate name", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    ValidatedJson(request): ValidatedJson<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    let department = state.db.departments.create(org.id(), auth.id(), request).await?;
    tracing::info!(department_id = %department.id, "Department created");
    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "departments",
    responses((status = 200, description = "Departments visible to the caller", body = Vec<Department>)),
    security(("bearer_auth" = []))
)]
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
) -> Result<Json<Vec<Department>>, HttpAppError> {
    let departments = state.db.departments.list(org.id(), auth.owner_filter()).await?;
    Ok(Json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    tag = "departments",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department", body = Department),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_department(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Department>, HttpAppError> {
    let department = state
        .db
        .departments
        .get(org.id(), id, auth.owner_filter())
        .await?
        .ok_or_else(department_not_found)?;
    Ok(Json(department))
}

#[utoipa::path(
    put,
    path = "/api/departments/{id}",
    tag = "departments",
    params(("id" = Uuid, Path, description = "Department ID")),
    request_body = UpdateDepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, patch), fields(organization_id = %org.id()))]
pub async fn update_department(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<UpdateDepartmentRequest>,
) -> Result<Json<Department>, HttpAppError> {
    auth.require_manager()?;
    let department = state
        .db
        .departments
        .update(org.id(), id, auth.owner_filter(), patch)
        .await?
        .ok_or_else(department_not_found)?;
    Ok(Json(department))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    tag = "departments",
    params(("id" = Uuid, Path, description = "Department ID")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    auth.require_manager()?;
    if !state.db.departments.delete(org.id(), id, auth.owner_filter()).await? {
        return Err(department_not_found().into());
    }
    tracing::info!(department_id = %id, "Department deleted");
    Ok(StatusCode::NO_CONTENT)
}
