use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use teampulse_core::models::{CreateInterviewRequest, Interview, InterviewWithAnswers};
use teampulse_core::AppError;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Record an interview conducted by the caller. The overall rating is derived from the
/// answer scores.
#[utoipa::path(
    post,
    path = "/api/interviews",
    tag = "interviews",
    request_body = CreateInterviewRequest,
    responses(
        (status = 201, description = "Interview recorded", body = InterviewWithAnswers),
        (status = 400, description = "Invalid input or score out of range", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_interview(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    ValidatedJson(request): ValidatedJson<CreateInterviewRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let interview = state
        .db
        .interviews
        .create(org.id(), auth.id(), request)
        .await?;
    tracing::info!(
        interview_id = %interview.interview.id,
        rating = ?interview.interview.overall_rating,
        "Interview recorded"
    );
    Ok((StatusCode::CREATED, Json(interview)))
}

#[utoipa::path(
    get,
    path = "/api/interviews",
    tag = "interviews",
    responses((status = 200, description = "Interviews visible to the caller, newest first", body = Vec<Interview>)),
    security(("bearer_auth" = []))
)]
pub async fn list_interviews(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
) -> Result<Json<Vec<Interview>>, HttpAppError> {
    let interviews = state
        .db
        .interviews
        .list(org.id(), auth.owner_filter())
        .await?;
    Ok(Json(interviews))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{id}",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Interview ID")),
    responses(
        (status = 200, description = "Interview with its answers", body = InterviewWithAnswers),
        (status = 404, description = "Interview not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_interview(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewWithAnswers>, HttpAppError> {
    let interview = state
        .db
        .interviews
        .get_with_answers(org.id(), id, auth.owner_filter())
        .await?
        .ok_or_else(|| AppError::NotFound("Interview not found".to_string()))?;
    Ok(Json(interview))
}

#[utoipa::path(
    delete,
    path = "/api/interviews/{id}",
    tag = "interviews",
    params(("id" = Uuid, Path, description = "Interview ID")),
    responses(
        (status = 204, description = "Interview deleted"),
        (status = 404, description = "Interview not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn delete_interview(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    if !state
        .db
        .interviews
        .delete(org.id(), id, auth.owner_filter())
        .await?
    {
        return Err(AppError::NotFound("Interview not found".to_string()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
