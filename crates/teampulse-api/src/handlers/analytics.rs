use axum::{extract::State, Json};
use std::sync::Arc;
use teampulse_core::models::OrganizationSummary;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Dashboard aggregates for the current organization: headcount, team and department
/// breakdowns, open tasks, pending invitations and interview ratings.
#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = "analytics",
    responses(
        (status = 200, description = "Organization summary", body = OrganizationSummary),
        (status = 403, description = "Manager role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
) -> Result<Json<OrganizationSummary>, HttpAppError> {
    auth.require_manager()?;
    let summary = state.db.analytics.organization_summary(org.id()).await?;
    Ok(Json(summary))
}
