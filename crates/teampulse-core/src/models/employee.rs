use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Employee entity. An employee belongs to exactly one team and one owning user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub team_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    pub team_id: Uuid,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EmployeeListQuery {
    pub team_id: Option<Uuid>,
}
