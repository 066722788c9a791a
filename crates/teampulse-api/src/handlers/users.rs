use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use teampulse_core::models::{Pagination, UpdateRoleRequest, UserResponse};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Signed-in user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(auth: AuthUser) -> Json<UserResponse> {
    let mut response = UserResponse::from(auth.user);
    response.role = auth.role;
    Json(response)
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(Pagination),
    responses(
        (status = 200, description = "Users of the organization", body = Vec<UserResponse>),
        (status = 403, description = "Manager role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, HttpAppError> {
    auth.require_manager()?;
    let users = state
        .db
        .users
        .list_by_organization(org.id(), pagination.clamped())
        .await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/role",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, HttpAppError> {
    auth.require_admin()?;
    if id == auth.id() {
        return Err(AppError::BadRequest("You cannot change your own role".to_string()).into());
    }

    let user = state
        .db
        .users
        .update_role(org.id(), id, request.role)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, role = %user.role, "User role changed");
    Ok(Json(UserResponse::from(user)))
}
