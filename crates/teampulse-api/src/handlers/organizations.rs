use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use teampulse_core::models::{CreateOrganizationRequest, Organization};
use teampulse_core::AppError;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/organizations/current",
    tag = "organizations",
    responses(
        (status = 200, description = "Organization the request is scoped to", body = Organization),
        (status = 404, description = "Organization not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn current(
    State(state): State<Arc<AppState>>,
    org: CurrentOrg,
) -> Result<Json<Organization>, HttpAppError> {
    let organization = state
        .db
        .organizations
        .get_by_id(org.id())
        .await?
        .ok_or_else(|| AppError::OrganizationNotFound(org.id().to_string()))?;
    Ok(Json(organization))
}

#[utoipa::path(
    post,
    path = "/api/organizations",
    tag = "organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = Organization),
        (status = 400, description = "Invalid input or Clerk organization already linked", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_admin()?;
    let organization = state
        .db
        .organizations
        .create(request.name.trim(), request.clerk_organization_id.as_deref())
        .await?;

    tracing::info!(organization_id = %organization.id, "Organization created");
    Ok((StatusCode::CREATED, Json(organization)))
}
