use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use teampulse_core::models::{
    AcceptInvitationsResponse, CreateInvitationRequest, ExpireSweepResponse, Invitation,
};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Invite someone by email to join a team of the current organization.
#[utoipa::path(
    post,
    path = "/api/invitations",
    tag = "invitations",
    request_body = CreateInvitationRequest,
    responses(
        (status = 201, description = "Invitation issued", body = Invitation),
        (status = 400, description = "Invalid input or duplicate pending invitation", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse),
        (status = 429, description = "Pending invitation limit reached", body = ErrorResponse),
        (status = 502, description = "Identity provider failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_invitation(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    ValidatedJson(request): ValidatedJson<CreateInvitationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    if !state
        .db
        .teams
        .exists_in_organization(org.id(), request.team_id)
        .await?
    {
        return Err(AppError::NotFound("Team not found".to_string()).into());
    }

    let invitation = state
        .invitations
        .issue(&auth, org.id(), request.team_id, &request.email)
        .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

#[utoipa::path(
    get,
    path = "/api/invitations",
    tag = "invitations",
    responses((status = 200, description = "Invitations issued by the caller, or all for admins", body = Vec<Invitation>)),
    security(("bearer_auth" = []))
)]
pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
) -> Result<Json<Vec<Invitation>>, HttpAppError> {
    let invitations = state.invitations.list(&auth, org.id()).await?;
    Ok(Json(invitations))
}

#[utoipa::path(
    post,
    path = "/api/invitations/{id}/revoke",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation ID")),
    responses(
        (status = 200, description = "Invitation revoked", body = Invitation),
        (status = 400, description = "Invitation is not pending", body = ErrorResponse),
        (status = 403, description = "Not the issuing manager", body = ErrorResponse),
        (status = 404, description = "Invitation not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn revoke_invitation(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Invitation>, HttpAppError> {
    let invitation = state.invitations.revoke(&auth, org.id(), id).await?;
    Ok(Json(invitation))
}

#[utoipa::path(
    post,
    path = "/api/invitations/{id}/accept",
    tag = "invitations",
    params(("id" = Uuid, Path, description = "Invitation ID")),
    responses(
        (status = 200, description = "Invitation accepted, caller joined the team", body = Invitation),
        (status = 400, description = "Invitation expired or not pending", body = ErrorResponse),
        (status = 403, description = "Invitation addressed to another email", body = ErrorResponse),
        (status = 404, description = "Invitation not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invitation>, HttpAppError> {
    let invitation = state.invitations.accept(&auth.user, id).await?;
    Ok(Json(invitation))
}

/// Accept every pending invitation addressed to the caller's email.
#[utoipa::path(
    post,
    path = "/api/invitations/accept",
    tag = "invitations",
    responses((status = 200, description = "Invitations accepted", body = AcceptInvitationsResponse)),
    security(("bearer_auth" = []))
)]
pub async fn accept_pending(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AcceptInvitationsResponse>, HttpAppError> {
    let accepted = state.invitations.accept_pending_for(&auth.user).await?;
    Ok(Json(AcceptInvitationsResponse { accepted }))
}

#[utoipa::path(
    post,
    path = "/api/invitations/expire",
    tag = "invitations",
    responses(
        (status = 200, description = "Overdue invitations expired", body = ExpireSweepResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id()))]
pub async fn expire_invitations(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ExpireSweepResponse>, HttpAppError> {
    auth.require_admin()?;
    let expired = state.invitations.expire_sweep(Utc::now()).await?;
    Ok(Json(ExpireSweepResponse { expired }))
}
