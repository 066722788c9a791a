//! Survey models
//!
//! Surveys live in the Supabase schema, not in the main Postgres database. Rows are
//! exchanged as JSON with the PostgREST endpoint, so these types only derive serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Draft,
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Survey {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: SurveyStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSurveyRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<SurveyStatus>,
}

#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateSurveyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SurveyStatus>,
}

impl UpdateSurveyRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Insert payload sent to the survey backend
#[derive(Debug, Clone, Serialize)]
pub struct NewSurvey {
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: SurveyStatus,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    Rating,
    SingleChoice,
    MultipleChoice,
}

impl QuestionKind {
    pub fn has_options(self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultipleChoice)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SurveyQuestion {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub position: i32,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub required: bool,
}

impl CreateQuestionRequest {
    /// Choice questions need at least two options; other kinds take none.
    pub fn validate_options(&self) -> Result<(), String> {
        if self.kind.has_options() {
            if self.options.len() < 2 {
                return Err("Choice questions need at least two options".to_string());
            }
            if self.options.iter().any(|o| o.trim().is_empty()) {
                return Err("Options cannot be empty".to_string());
            }
        } else if !self.options.is_empty() {
            return Err("Only choice questions take options".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSurveyQuestion {
    pub survey_id: Uuid,
    pub prompt: String,
    pub kind: QuestionKind,
    pub options: Vec<String>,
    pub position: i32,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Invited,
    Started,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: ParticipantStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddParticipantRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateParticipantStatusRequest {
    pub status: ParticipantStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewParticipant {
    pub survey_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub status: ParticipantStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SurveyResponse {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub participant_id: Uuid,
    pub question_id: Uuid,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnswerInput {
    pub question_id: Uuid,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitResponsesRequest {
    pub participant_id: Uuid,
    #[validate(length(min = 1, max = 500))]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSurveyResponse {
    pub survey_id: Uuid,
    pub participant_id: Uuid,
    pub question_id: Uuid,
    pub value: serde_json::Value,
}

/// Check a submission against the survey's questions: every answer must target a
/// question of this survey and every required question must be answered.
pub fn check_submission(
    questions: &[SurveyQuestion],
    answers: &[AnswerInput],
) -> Result<(), String> {
    for answer in answers {
        if !questions.iter().any(|q| q.id == answer.question_id) {
            return Err(format!(
                "Question {} does not belong to this survey",
                answer.question_id
            ));
        }
    }
    for question in questions.iter().filter(|q| q.required) {
        let answered = answers
            .iter()
            .any(|a| a.question_id == question.id && !a.value.is_null());
        if !answered {
            return Err(format!("Question '{}' is required", question.prompt));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(required: bool) -> SurveyQuestion {
        SurveyQuestion {
            id: Uuid::new_v4(),
            survey_id: Uuid::new_v4(),
            prompt: "How satisfied are you?".to_string(),
            kind: QuestionKind::Rating,
            options: vec![],
            position: 0,
            required,
        }
    }

    #[test]
    fn test_choice_questions_need_options() {
        let mut request = CreateQuestionRequest {
            prompt: "Pick one".to_string(),
            kind: QuestionKind::SingleChoice,
            options: vec!["Yes".to_string()],
            position: None,
            required: false,
        };
        assert!(request.validate_options().is_err());
        request.options.push("No".to_string());
        assert!(request.validate_options().is_ok());

        request.kind = QuestionKind::Text;
        assert!(request.validate_options().is_err());
    }

    #[test]
    fn test_submission_rejects_foreign_question() {
        let questions = vec![question(false)];
        let answers = vec![AnswerInput {
            question_id: Uuid::new_v4(),
            value: serde_json::json!(5),
        }];
        assert!(check_submission(&questions, &answers).is_err());
    }

    #[test]
    fn test_submission_requires_required_questions() {
        let required = question(true);
        let optional = question(false);
        let questions = vec![required.clone(), optional.clone()];

        let only_optional = vec![AnswerInput {
            question_id: optional.id,
            value: serde_json::json!("fine"),
        }];
        assert!(check_submission(&questions, &only_optional).is_err());

        let null_required = vec![AnswerInput {
            question_id: required.id,
            value: serde_json::Value::Null,
        }];
        assert!(check_submission(&questions, &null_required).is_err());

        let complete = vec![AnswerInput {
            question_id: required.id,
            value: serde_json::json!(8),
        }];
        assert!(check_submission(&questions, &complete).is_ok());
    }

    #[test]
    fn test_submit_request_answer_count_is_validated() {
        let mut request = SubmitResponsesRequest {
            participant_id: Uuid::new_v4(),
            answers: vec![],
        };
        assert!(request.validate().is_err());

        request.answers.push(AnswerInput {
            question_id: Uuid::new_v4(),
            value: serde_json::json!(4),
        });
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_survey_update_serializes_only_present_fields() {
        let patch = UpdateSurveyRequest {
            status: Some(SurveyStatus::Closed),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({"status": "closed"})
        );
        assert!(!patch.is_empty());
        assert!(UpdateSurveyRequest::default().is_empty());
    }
}
