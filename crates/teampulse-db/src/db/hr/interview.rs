//! Interview repository
//!
//! An interview and its answers are written in one transaction; the overall rating is
//! computed from the answer scores before insert.

use chrono::Utc;
use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{overall_rating, CreateInterviewRequest, Interview, InterviewAnswer, InterviewWithAnswers},
    AppError,
};
use uuid::Uuid;

use crate::db::transaction::with_transaction;

const INTERVIEW_COLUMNS: &str = "id, organization_id, employee_name, employee_title, team_name, \
                                 interviewer_id, conducted_at, overall_rating, notes, created_at";

#[derive(Clone)]
pub struct InterviewRepository {
    pool: PgPool,
}

impl InterviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, request), fields(db.table = "interviews", db.operation = "insert", answers = request.answers.len()))]
    pub async fn create(
        &self,
        organization_id: Uuid,
        interviewer_id: Uuid,
        request: CreateInterviewRequest,
    ) -> Result<InterviewWithAnswers, AppError> {
        let scores: Vec<i32> = request.answers.iter().map(|a| a.score).collect();
        let rating = overall_rating(&scores);
        let conducted_at = request.conducted_at.unwrap_or_else(Utc::now);
        let insert_sql = format!(
            r#"
            INSERT INTO interviews (organization_id, employee_name, employee_title, team_name,
                                    interviewer_id, conducted_at, overall_rating, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        );

        with_transaction(&self.pool, |tx| {
            Box::pin(async move {
                let interview = sqlx::query_as::<Postgres, Interview>(&insert_sql)
                    .bind(organization_id)
                    .bind(request.employee_name.trim())
                    .bind(&request.employee_title)
                    .bind(&request.team_name)
                    .bind(interviewer_id)
                    .bind(conducted_at)
                    .bind(rating)
                    .bind(&request.notes)
                    .fetch_one(&mut **tx)
                    .await?;

                let mut answers = Vec::with_capacity(request.answers.len());
                for (position, answer) in request.answers.iter().enumerate() {
                    let row = sqlx::query_as::<Postgres, InterviewAnswer>(
                        r#"
                        INSERT INTO interview_answers (interview_id, question, answer, score, position)
                        VALUES ($1, $2, $3, $4, $5)
                        RETURNING id, interview_id, question, answer, score, position
                        "#,
                    )
                    .bind(interview.id)
                    .bind(&answer.question)
                    .bind(&answer.answer)
                    .bind(answer.score)
                    .bind(position as i32)
                    .fetch_one(&mut **tx)
                    .await?;
                    answers.push(row);
                }

                Ok(InterviewWithAnswers { interview, answers })
            })
        })
        .await
    }

    /// List interviews, newest first. `interviewer` narrows to one interviewer's records.
    #[tracing::instrument(skip(self), fields(db.table = "interviews", db.operation = "select"))]
    pub async fn list(
        &self,
        organization_id: Uuid,
        interviewer: Option<Uuid>,
    ) -> Result<Vec<Interview>, AppError> {
        let interviews = sqlx::query_as::<Postgres, Interview>(&format!(
            "SELECT {} FROM interviews WHERE organization_id = $1 AND ($2::uuid IS NULL OR interviewer_id = $2) ORDER BY conducted_at DESC",
            INTERVIEW_COLUMNS
        ))
        .bind(organization_id)
        .bind(interviewer)
        .fetch_all(&self.pool)
        .await?;

        Ok(interviews)
    }

    #[tracing::instrument(skip(self), fields(db.table = "interviews", db.operation = "select", db.record_id = %id))]
    pub async fn get_with_answers(
        &self,
        organization_id: Uuid,
        id: Uuid,
        interviewer: Option<Uuid>,
    ) -> Result<Option<InterviewWithAnswers>, AppError> {
        let interview = sqlx::query_as::<Postgres, Interview>(&format!(
            "SELECT {} FROM interviews WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR interviewer_id = $3)",
            INTERVIEW_COLUMNS
        ))
        .bind(organization_id)
        .bind(id)
        .bind(interviewer)
        .fetch_optional(&self.pool)
        .await?;

        let Some(interview) = interview else {
            return Ok(None);
        };

        let answers = sqlx::query_as::<Postgres, InterviewAnswer>(
            "SELECT id, interview_id, question, answer, score, position FROM interview_answers WHERE interview_id = $1 ORDER BY position ASC",
        )
        .bind(interview.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(InterviewWithAnswers { interview, answers }))
    }

    /// Delete an interview; answers cascade.
    #[tracing::instrument(skip(self), fields(db.table = "interviews", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(
        &self,
        organization_id: Uuid,
        id: Uuid,
        interviewer: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM interviews WHERE organization_id = $1 AND id = $2 AND ($3::uuid IS NULL OR interviewer_id = $3)",
        )
        .bind(organization_id)
        .bind(id)
        .bind(interviewer)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
