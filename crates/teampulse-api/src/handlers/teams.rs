use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use teampulse_core::models::{CreateTeamRequest, Team, TeamMember, UpdateTeamRequest};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

fn team_not_found() -> AppError {
    AppError::NotFound("Team not found".to_string())
}

#[utoipa::path(
    post,
    path = "/api/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 400, description = "Invalid input or duplicate name", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_team(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    ValidatedJson(request): ValidatedJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    let team = state.db.teams.create(org.id(), auth.id(), request).await?;
    tracing::info!(team_id = %team.id, "Team created");
    Ok((StatusCode::CREATED, Json(team)))
}

#[utoipa::path(
    get,
    path = "/api/teams",
    tag = "teams",
    responses((status = 200, description = "Teams visible to the caller", body = Vec<Team>)),
    security(("bearer_auth" = []))
)]
pub async fn list_teams(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
) -> Result<Json<Vec<Team>>, HttpAppError> {
    let teams = state.db.teams.list(org.id(), auth.owner_filter()).await?;
    Ok(Json(teams))
}

#[utoipa::path(
    get,
    path = "/api/teams/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team", body = Team),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Team>, HttpAppError> {
    let team = state
        .db
        .teams
        .get(org.id(), id, auth.owner_filter())
        .await?
        .ok_or_else(team_not_found)?;
    Ok(Json(team))
}

#[utoipa::path(
    put,
    path = "/api/teams/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = Team),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, patch), fields(organization_id = %org.id()))]
pub async fn update_team(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<UpdateTeamRequest>,
) -> Result<Json<Team>, HttpAppError> {
    auth.require_manager()?;
    let team = state
        .db
        .teams
        .update(org.id(), id, auth.owner_filter(), patch)
        .await?
        .ok_or_else(team_not_found)?;
    Ok(Json(team))
}

#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn delete_team(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    auth.require_manager()?;
    if !state.db.teams.delete(org.id(), id, auth.owner_filter()).await? {
        return Err(team_not_found().into());
    }
    tracing::info!(team_id = %id, "Team deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/teams/{id}/members",
    tag = "teams",
    params(("id" = Uuid, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Users who joined the team", body = Vec<TeamMember>),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_members(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TeamMember>>, HttpAppError> {
    let team = state
        .db
        .teams
        .get(org.id(), id, auth.owner_filter())
        .await?
        .ok_or_else(team_not_found)?;
    let members = state.db.teams.list_members(team.id).await?;
    Ok(Json(members))
}
