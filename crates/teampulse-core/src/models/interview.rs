//! Interview records
//!
//! Interviews snapshot the employee and team by name rather than referencing the
//! employee row, so they survive employee edits and deletions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const MIN_ANSWER_SCORE: i32 = 1;
pub const MAX_ANSWER_SCORE: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Interview {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub employee_name: String,
    pub employee_title: Option<String>,
    pub team_name: Option<String>,
    pub interviewer_id: Uuid,
    pub conducted_at: DateTime<Utc>,
    pub overall_rating: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InterviewAnswer {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub question: String,
    pub answer: String,
    pub score: i32,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InterviewWithAnswers {
    #[serde(flatten)]
    pub interview: Interview,
    pub answers: Vec<InterviewAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InterviewAnswerInput {
    #[validate(length(min = 1, max = 2000))]
    pub question: String,
    #[validate(length(max = 10000))]
    pub answer: String,
    #[validate(range(min = 1, max = 10))]
    pub score: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInterviewRequest {
    #[validate(length(min = 1, max = 200))]
    pub employee_name: String,
    #[serde(default)]
    pub employee_title: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub conducted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 100), nested)]
    pub answers: Vec<InterviewAnswerInput>,
}

/// Mean of the answer scores rounded to one decimal. `None` when there are no answers.
pub fn overall_rating(scores: &[i32]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    let mean = sum as f64 / scores.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}
