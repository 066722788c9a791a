//! Dashboard aggregates
//!
//! Read-only queries behind the organization summary. Counts are computed on demand; the
//! data volumes of a single organization keep these cheap.

use sqlx::{PgPool, Postgres};
use teampulse_core::{
    models::{DepartmentHeadcount, OrganizationSummary, TeamHeadcount, TeamRating},
    AppError,
};
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct Totals {
    headcount: i64,
    team_count: i64,
    department_count: i64,
    open_tasks: i64,
    pending_invitations: i64,
    average_interview_rating: Option<f64>,
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(
        db.system = "postgresql",
        db.table = "employees",
        db.operation = "aggregate",
        organization_id = %organization_id
    ))]
    pub async fn organization_summary(
        &self,
        organization_id: Uuid,
    ) -> Result<OrganizationSummary, AppError> {
        let totals = sqlx::query_as::<Postgres, Totals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM employees WHERE organization_id = $1) AS headcount,
                (SELECT COUNT(*) FROM teams WHERE organization_id = $1) AS team_count,
                (SELECT COUNT(*) FROM departments WHERE organization_id = $1) AS department_count,
                (SELECT COUNT(*) FROM tasks WHERE organization_id = $1 AND status <> 'DONE') AS open_tasks,
                (SELECT COUNT(*) FROM invitations
                    WHERE organization_id = $1 AND status = 'PENDING' AND expires_at > NOW()) AS pending_invitations,
                (SELECT ROUND(AVG(overall_rating)::numeric, 1)::DOUBLE PRECISION
                    FROM interviews WHERE organization_id = $1) AS average_interview_rating
            "#,
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        let headcount_by_team = sqlx::query_as::<Postgres, TeamHeadcount>(
            r#"
            SELECT t.id AS team_id, t.name AS team_name, COUNT(e.id) AS headcount
            FROM teams t
            LEFT JOIN employees e ON e.team_id = t.id
            WHERE t.organization_id = $1
            GROUP BY t.id, t.name
            ORDER BY t.name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let headcount_by_department = sqlx::query_as::<Postgres, DepartmentHeadcount>(
            r#"
            SELECT COALESCE(t.department, 'Unassigned') AS department, COUNT(e.id) AS headcount
            FROM employees e
            JOIN teams t ON t.id = e.team_id
            WHERE e.organization_id = $1
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        let ratings_by_team = sqlx::query_as::<Postgres, TeamRating>(
            r#"
            SELECT COALESCE(team_name, 'Unassigned') AS team_name,
                   COUNT(*) AS interviews,
                   ROUND(AVG(overall_rating)::numeric, 1)::DOUBLE PRECISION AS average_rating
            FROM interviews
            WHERE organization_id = $1
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrganizationSummary {
            organization_id,
            headcount: totals.headcount,
            team_count: totals.team_count,
            department_count: totals.department_count,
            open_tasks: totals.open_tasks,
            pending_invitations: totals.pending_invitations,
            average_interview_rating: totals.average_interview_rating,
            headcount_by_team,
            headcount_by_department,
            ratings_by_team,
        })
    }
}
