//! Survey storage on Supabase
//!
//! Surveys, questions, participants and responses are rows in the Supabase project and
//! are reached through its PostgREST endpoint with the service-role key. Filters use the
//! PostgREST `column=eq.value` syntax; writes ask for the affected rows back.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use teampulse_core::{
    models::{
        NewParticipant, NewSurvey, NewSurveyQuestion, NewSurveyResponse, Participant,
        ParticipantStatus, Survey, SurveyQuestion, SurveyResponse, UpdateSurveyRequest,
    },
    AppError,
};
use uuid::Uuid;

const SERVICE: &str = "supabase";
const REQUEST_TIMEOUT_SECS: u64 = 15;

const SURVEYS: &str = "surveys";
const QUESTIONS: &str = "survey_questions";
const RESPONSES: &str = "survey_responses";
const PARTICIPANTS: &str = "survey_participants";

#[async_trait]
pub trait SurveyStore: Send + Sync {
    async fn list_surveys(&self, organization_id: Uuid) -> Result<Vec<Survey>, AppError>;
    async fn get_survey(&self, organization_id: Uuid, id: Uuid) -> Result<Survey, AppError>;
    async fn create_survey(&self, survey: NewSurvey) -> Result<Survey, AppError>;
    async fn update_survey(
        &self,
        organization_id: Uuid,
        id: Uuid,
        patch: UpdateSurveyRequest,
    ) -> Result<Survey, AppError>;
    async fn delete_survey(&self, organization_id: Uuid, id: Uuid) -> Result<(), AppError>;

    async fn list_questions(&self, survey_id: Uuid) -> Result<Vec<SurveyQuestion>, AppError>;
    async fn create_question(&self, question: NewSurveyQuestion)
        -> Result<SurveyQuestion, AppError>;
    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> Result<(), AppError>;

    async fn list_responses(&self, survey_id: Uuid) -> Result<Vec<SurveyResponse>, AppError>;
    /// Insert a batch of answers in one request.
    async fn submit_responses(
        &self,
        responses: Vec<NewSurveyResponse>,
    ) -> Result<Vec<SurveyResponse>, AppError>;

    async fn list_participants(&self, survey_id: Uuid) -> Result<Vec<Participant>, AppError>;
    async fn get_participant(
        &self,
        survey_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Participant, AppError>;
    async fn add_participant(&self, participant: NewParticipant) -> Result<Participant, AppError>;
    async fn update_participant_status(
        &self,
        survey_id: Uuid,
        participant_id: Uuid,
        status: ParticipantStatus,
    ) -> Result<Participant, AppError>;
}

pub struct SupabaseClient {
    http_client: reqwest::Client,
    rest_url: String,
    service_key: String,
}

impl Debug for SupabaseClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SupabaseClient")
            .field("rest_url", &self.rest_url)
            .finish()
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

impl SupabaseClient {
    /// `project_url` is the Supabase project URL, e.g. `https://xyz.supabase.co`.
    pub fn new(project_url: &str, service_key: &str) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Internal(format!("Failed to create HTTP client for Supabase: {}", e))
            })?;

        Ok(Self {
            http_client,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            service_key: service_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::external(SERVICE, None, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), body = %error_text, "Supabase request failed");
            return Err(AppError::external(
                SERVICE,
                Some(status.as_u16()),
                format!("Supabase request failed: {}", status),
            ));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| AppError::external(SERVICE, None, format!("Invalid response body: {}", e)))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        order: &str,
    ) -> Result<Vec<T>, AppError> {
        let request = self
            .request(reqwest::Method::GET, table)
            .query(&[("select", "*"), ("order", order)])
            .query(filters);
        self.execute(request).await
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<Vec<T>, AppError> {
        let request = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body);
        self.execute(request).await
    }

    async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>, AppError> {
        let request = self
            .request(reqwest::Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(filters)
            .json(body);
        self.execute(request).await
    }

    async fn delete(&self, table: &str, filters: &[(&str, String)]) -> Result<usize, AppError> {
        let request = self
            .request(reqwest::Method::DELETE, table)
            .header("Prefer", "return=representation")
            .query(filters);
        let rows: Vec<serde_json::Value> = self.execute(request).await?;
        Ok(rows.len())
    }
}

fn single<T>(rows: Vec<T>, what: &str) -> Result<T, AppError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("{} not found", what)))
}

#[async_trait]
impl SurveyStore for SupabaseClient {
    #[tracing::instrument(skip(self), fields(table = SURVEYS))]
    async fn list_surveys(&self, organization_id: Uuid) -> Result<Vec<Survey>, AppError> {
        self.select(
            SURVEYS,
            &[("organization_id", eq(organization_id))],
            "created_at.desc",
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(table = SURVEYS))]
    async fn get_survey(&self, organization_id: Uuid, id: Uuid) -> Result<Survey, AppError> {
        let rows = self
            .select(
                SURVEYS,
                &[("organization_id", eq(organization_id)), ("id", eq(id))],
                "created_at.desc",
            )
            .await?;
        single(rows, "Survey")
    }

    #[tracing::instrument(skip(self, survey), fields(table = SURVEYS))]
    async fn create_survey(&self, survey: NewSurvey) -> Result<Survey, AppError> {
        let rows = self.insert(SURVEYS, &survey).await?;
        single(rows, "Created survey")
    }

    #[tracing::instrument(skip(self, patch), fields(table = SURVEYS))]
    async fn update_survey(
        &self,
        organization_id: Uuid,
        id: Uuid,
        patch: UpdateSurveyRequest,
    ) -> Result<Survey, AppError> {
        let mut body = serde_json::to_value(&patch)?;
        if let Some(map) = body.as_object_mut() {
            map.insert("updated_at".to_string(), json!(chrono::Utc::now()));
        }
        let rows = self
            .update(
                SURVEYS,
                &[("organization_id", eq(organization_id)), ("id", eq(id))],
                &body,
            )
            .await?;
        single(rows, "Survey")
    }

    #[tracing::instrument(skip(self), fields(table = SURVEYS))]
    async fn delete_survey(&self, organization_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let deleted = self
            .delete(
                SURVEYS,
                &[("organization_id", eq(organization_id)), ("id", eq(id))],
            )
            .await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Survey not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(table = QUESTIONS))]
    async fn list_questions(&self, survey_id: Uuid) -> Result<Vec<SurveyQuestion>, AppError> {
        self.select(QUESTIONS, &[("survey_id", eq(survey_id))], "position.asc")
            .await
    }

    #[tracing::instrument(skip(self, question), fields(table = QUESTIONS))]
    async fn create_question(
        &self,
        question: NewSurveyQuestion,
    ) -> Result<SurveyQuestion, AppError> {
        let rows = self.insert(QUESTIONS, &question).await?;
        single(rows, "Created question")
    }

    #[tracing::instrument(skip(self), fields(table = QUESTIONS))]
    async fn delete_question(&self, survey_id: Uuid, question_id: Uuid) -> Result<(), AppError> {
        let deleted = self
            .delete(
                QUESTIONS,
                &[("survey_id", eq(survey_id)), ("id", eq(question_id))],
            )
            .await?;
        if deleted == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(table = RESPONSES))]
    async fn list_responses(&self, survey_id: Uuid) -> Result<Vec<SurveyResponse>, AppError> {
        self.select(RESPONSES, &[("survey_id", eq(survey_id))], "submitted_at.asc")
            .await
    }

    #[tracing::instrument(skip(self, responses), fields(table = RESPONSES, count = responses.len()))]
    async fn submit_responses(
        &self,
        responses: Vec<NewSurveyResponse>,
    ) -> Result<Vec<SurveyResponse>, AppError> {
        if responses.is_empty() {
            return Ok(Vec::new());
        }
        self.insert(RESPONSES, &responses).await
    }

    #[tracing::instrument(skip(self), fields(table = PARTICIPANTS))]
    async fn list_participants(&self, survey_id: Uuid) -> Result<Vec<Participant>, AppError> {
        self.select(PARTICIPANTS, &[("survey_id", eq(survey_id))], "email.asc")
            .await
    }

    #[tracing::instrument(skip(self), fields(table = PARTICIPANTS))]
    async fn get_participant(
        &self,
        survey_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Participant, AppError> {
        let rows = self
            .select(
                PARTICIPANTS,
                &[("survey_id", eq(survey_id)), ("id", eq(participant_id))],
                "email.asc",
            )
            .await?;
        single(rows, "Participant")
    }

    #[tracing::instrument(skip(self, participant), fields(table = PARTICIPANTS))]
    async fn add_participant(&self, participant: NewParticipant) -> Result<Participant, AppError> {
        let rows = self.insert(PARTICIPANTS, &participant).await?;
        single(rows, "Created participant")
    }

    #[tracing::instrument(skip(self), fields(table = PARTICIPANTS))]
    async fn update_participant_status(
        &self,
        survey_id: Uuid,
        participant_id: Uuid,
        status: ParticipantStatus,
    ) -> Result<Participant, AppError> {
        let rows = self
            .update(
                PARTICIPANTS,
                &[("survey_id", eq(survey_id)), ("id", eq(participant_id))],
                &json!({ "status": status }),
            )
            .await?;
        single(rows, "Participant")
    }
}
