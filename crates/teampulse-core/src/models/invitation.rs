use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "invitation_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
    Expired,
}

impl Display for InvitationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            InvitationStatus::Pending => write!(f, "PENDING"),
            InvitationStatus::Accepted => write!(f, "ACCEPTED"),
            InvitationStatus::Revoked => write!(f, "REVOKED"),
            InvitationStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Invitation for a user to join a team, mirrored in the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub team_id: Uuid,
    pub manager_id: Uuid,
    pub organization_id: Uuid,
    /// Invitation id in the identity provider
    pub external_id: Option<String>,
    pub accepted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert for a freshly issued invitation
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub id: Uuid,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub team_id: Uuid,
    pub manager_id: Uuid,
    pub organization_id: Uuid,
    pub external_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    pub team_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpireSweepResponse {
    pub expired: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptInvitationsResponse {
    pub accepted: Vec<Invitation>,
}
