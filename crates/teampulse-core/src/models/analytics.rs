use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Dashboard summary for one organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationSummary {
    pub organization_id: Uuid,
    pub headcount: i64,
    pub team_count: i64,
    pub department_count: i64,
    pub open_tasks: i64,
    pub pending_invitations: i64,
    /// Average overall interview rating across the organization
    pub average_interview_rating: Option<f64>,
    pub headcount_by_team: Vec<TeamHeadcount>,
    pub headcount_by_department: Vec<DepartmentHeadcount>,
    pub ratings_by_team: Vec<TeamRating>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamHeadcount {
    pub team_id: Uuid,
    pub team_name: String,
    pub headcount: i64,
}

/// Employees grouped by the department label of their team
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DepartmentHeadcount {
    pub department: String,
    pub headcount: i64,
}

/// Interview ratings grouped by the team name recorded on the interview
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TeamRating {
    pub team_name: String,
    pub interviews: i64,
    pub average_rating: Option<f64>,
}
