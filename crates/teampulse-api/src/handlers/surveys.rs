//! Survey endpoints
//!
//! Survey rows live in Supabase and are reached through the [`SurveyStore`]. Every
//! nested route first loads the survey scoped to the current organization, so a survey
//! id from another tenant answers 404 before any question, response or participant is
//! touched.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use teampulse_core::invitation_policy::normalize_email;
use teampulse_core::models::{
    check_submission, AddParticipantRequest, CreateQuestionRequest, CreateSurveyRequest,
    NewParticipant, NewSurvey, NewSurveyQuestion, NewSurveyResponse, Participant,
    ParticipantStatus, SubmitResponsesRequest, Survey, SurveyQuestion, SurveyResponse,
    SurveyStatus, UpdateParticipantStatusRequest, UpdateSurveyRequest,
};
use teampulse_core::AppError;
use teampulse_services::SurveyStore;
use uuid::Uuid;

use crate::auth::{AuthUser, CurrentOrg};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

async fn scoped_survey(
    store: &Arc<dyn SurveyStore>,
    org: CurrentOrg,
    survey_id: Uuid,
) -> Result<Survey, AppError> {
    store.get_survey(org.id(), survey_id).await
}

#[utoipa::path(
    get,
    path = "/api/surveys",
    tag = "surveys",
    responses(
        (status = 200, description = "Surveys of the organization", body = Vec<Survey>),
        (status = 502, description = "Survey backend unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_surveys(
    State(state): State<Arc<AppState>>,
    org: CurrentOrg,
) -> Result<Json<Vec<Survey>>, HttpAppError> {
    let surveys = state.survey_store()?.list_surveys(org.id()).await?;
    Ok(Json(surveys))
}

#[utoipa::path(
    post,
    path = "/api/surveys",
    tag = "surveys",
    request_body = CreateSurveyRequest,
    responses(
        (status = 201, description = "Survey created", body = Survey),
        (status = 403, description = "Manager role required", body = ErrorResponse),
        (status = 502, description = "Survey backend unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_survey(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    ValidatedJson(request): ValidatedJson<CreateSurveyRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    let survey = state
        .survey_store()?
        .create_survey(NewSurvey {
            organization_id: org.id(),
            title: request.title.trim().to_string(),
            description: request.description,
            status: request.status.unwrap_or(SurveyStatus::Draft),
            created_by: auth.id(),
        })
        .await?;
    tracing::info!(survey_id = %survey.id, "Survey created");
    Ok((StatusCode::CREATED, Json(survey)))
}

#[utoipa::path(
    get,
    path = "/api/surveys/{id}",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 200, description = "Survey", body = Survey),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_survey(
    State(state): State<Arc<AppState>>,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Survey>, HttpAppError> {
    let survey = scoped_survey(state.survey_store()?, org, id).await?;
    Ok(Json(survey))
}

#[utoipa::path(
    put,
    path = "/api/surveys/{id}",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = UpdateSurveyRequest,
    responses(
        (status = 200, description = "Survey updated", body = Survey),
        (status = 400, description = "Empty update", body = ErrorResponse),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, patch), fields(organization_id = %org.id()))]
pub async fn update_survey(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(patch): ValidatedJson<UpdateSurveyRequest>,
) -> Result<Json<Survey>, HttpAppError> {
    auth.require_manager()?;
    if patch.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()).into());
    }
    let survey = state
        .survey_store()?
        .update_survey(org.id(), id, patch)
        .await?;
    Ok(Json(survey))
}

#[utoipa::path(
    delete,
    path = "/api/surveys/{id}",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 204, description = "Survey deleted"),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth), fields(organization_id = %org.id()))]
pub async fn delete_survey(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    auth.require_manager()?;
    state.survey_store()?.delete_survey(org.id(), id).await?;
    tracing::info!(survey_id = %id, "Survey deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/surveys/{id}/questions",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 200, description = "Questions in display order", body = Vec<SurveyQuestion>),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SurveyQuestion>>, HttpAppError> {
    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    let questions = store.list_questions(survey.id).await?;
    Ok(Json(questions))
}

/// Append a question. Without an explicit position it goes after the existing ones.
#[utoipa::path(
    post,
    path = "/api/surveys/{id}/questions",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question added", body = SurveyQuestion),
        (status = 400, description = "Invalid options for the question kind", body = ErrorResponse),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, auth, request), fields(organization_id = %org.id()))]
pub async fn create_question(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    request.validate_options().map_err(AppError::BadRequest)?;

    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    let position = match request.position {
        Some(position) => position,
        None => store.list_questions(survey.id).await?.len() as i32,
    };

    let question = store
        .create_question(NewSurveyQuestion {
            survey_id: survey.id,
            prompt: request.prompt.trim().to_string(),
            kind: request.kind,
            options: request.options,
            position,
            required: request.required,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

#[utoipa::path(
    delete,
    path = "/api/surveys/{id}/questions/{question_id}",
    tag = "surveys",
    params(
        ("id" = Uuid, Path, description = "Survey ID"),
        ("question_id" = Uuid, Path, description = "Question ID")
    ),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 404, description = "Survey or question not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, HttpAppError> {
    auth.require_manager()?;
    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    store.delete_question(survey.id, question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/surveys/{id}/responses",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 200, description = "Submitted answers", body = Vec<SurveyResponse>),
        (status = 403, description = "Manager role required", body = ErrorResponse),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_responses(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SurveyResponse>>, HttpAppError> {
    auth.require_manager()?;
    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    let responses = store.list_responses(survey.id).await?;
    Ok(Json(responses))
}

/// Submit a participant's answers in one batch and mark the participant completed.
#[utoipa::path(
    post,
    path = "/api/surveys/{id}/responses",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = SubmitResponsesRequest,
    responses(
        (status = 201, description = "Answers stored", body = Vec<SurveyResponse>),
        (status = 400, description = "Survey closed, unknown question or missing required answer", body = ErrorResponse),
        (status = 404, description = "Survey or participant not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(organization_id = %org.id(), participant_id = %request.participant_id))]
pub async fn submit_responses(
    State(state): State<Arc<AppState>>,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SubmitResponsesRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    if survey.status == SurveyStatus::Closed {
        return Err(AppError::BadRequest("Survey is closed".to_string()).into());
    }

    let participant = store
        .get_participant(survey.id, request.participant_id)
        .await?;
    let questions = store.list_questions(survey.id).await?;
    check_submission(&questions, &request.answers).map_err(AppError::BadRequest)?;

    let rows = request
        .answers
        .into_iter()
        .map(|answer| NewSurveyResponse {
            survey_id: survey.id,
            participant_id: participant.id,
            question_id: answer.question_id,
            value: answer.value,
        })
        .collect();
    let stored = store.submit_responses(rows).await?;

    store
        .update_participant_status(survey.id, participant.id, ParticipantStatus::Completed)
        .await?;

    tracing::info!(survey_id = %survey.id, answers = stored.len(), "Survey responses submitted");
    Ok((StatusCode::CREATED, Json(stored)))
}

#[utoipa::path(
    get,
    path = "/api/surveys/{id}/participants",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    responses(
        (status = 200, description = "Participants", body = Vec<Participant>),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_participants(
    State(state): State<Arc<AppState>>,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Participant>>, HttpAppError> {
    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    let participants = store.list_participants(survey.id).await?;
    Ok(Json(participants))
}

#[utoipa::path(
    post,
    path = "/api/surveys/{id}/participants",
    tag = "surveys",
    params(("id" = Uuid, Path, description = "Survey ID")),
    request_body = AddParticipantRequest,
    responses(
        (status = 201, description = "Participant invited", body = Participant),
        (status = 404, description = "Survey not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_participant(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    org: CurrentOrg,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AddParticipantRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    auth.require_manager()?;
    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    let participant = store
        .add_participant(NewParticipant {
            survey_id: survey.id,
            email: normalize_email(&request.email),
            name: request.name,
            status: ParticipantStatus::Invited,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

#[utoipa::path(
    put,
    path = "/api/surveys/{id}/participants/{participant_id}",
    tag = "surveys",
    params(
        ("id" = Uuid, Path, description = "Survey ID"),
        ("participant_id" = Uuid, Path, description = "Participant ID")
    ),
    request_body = UpdateParticipantStatusRequest,
    responses(
        (status = 200, description = "Participant status updated", body = Participant),
        (status = 404, description = "Survey or participant not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_participant_status(
    State(state): State<Arc<AppState>>,
    org: CurrentOrg,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(request): ValidatedJson<UpdateParticipantStatusRequest>,
) -> Result<Json<Participant>, HttpAppError> {
    let store = state.survey_store()?;
    let survey = scoped_survey(store, org, id).await?;
    let participant = store
        .update_participant_status(survey.id, participant_id, request.status)
        .await?;
    Ok(Json(participant))
}
