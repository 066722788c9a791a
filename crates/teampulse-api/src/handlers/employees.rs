use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use teampulse_core::models::{
    CreateEmployeeRequest, Employee, EmployeeListQuery, UpdateEmployeeRequest,
};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

fn employee_not_found() -> AppError {
    AppError::NotFound("Employee not found".to_string())
}

/// Add an employee to one of the organization's teams.
#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid input or unknown reference", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    ValidatedJson(request): ValidatedJson<CreateEmployeeRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    let employee = state.db.employees.create(org.id(), auth.id(), request).await?;
    tracing::info!(employee_id = %employee.id, "Employee created");
    Ok((StatusCode::CREATED, Json(employee)))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "employees",
    params(EmployeeListQuery),
    responses((status = 200, description = "Employees visible to the caller", body = Vec<Employee>)),
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Query(query): Query<EmployeeListQuery>,
) -> Result<Json<Vec<Employee>>, HttpAppError> {
    let employees = state
        .db
        .employees
        .list(org.id(), auth.owner_filter(), query.team_id)
        .await?;
    Ok(Json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "employees",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Employee>, HttpAppError> {
    let employee = state
        .db
        .employees
        .get(org.id(), id, auth.owner_filter())
        .await?
        .ok_or_else(employee_not_found)?;
    Ok(Json(employee))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "employees",
    params(("id" = Uuid, Path, description = "Employee ID")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, patch), fields(organization_id = %org.id()))]
pub async fn update_employee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, HttpAppError> {
    auth.require_manager()?;
    let employee = state
        .db
        .employees
        .update(org.id(), id, auth.owner_filter(), patch)
        .await?
        .ok_or_else(employee_not_found)?;
    Ok(Json(employee))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "employees",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    auth.require_manager()?;
    if !state.db.employees.delete(org.id(), id, auth.owner_filter()).await? {
        return Err(employee_not_found().into());
    }
    tracing::info!(employee_id = %id, "Employee deleted");
    Ok(StatusCode::NO_CONTENT)
}
