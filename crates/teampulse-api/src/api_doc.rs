//! OpenAPI documentation served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use teampulse_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Registers the `bearer_auth` scheme the protected paths refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TeamPulse API",
        version = "0.1.0",
        description = "Multi-tenant HR analytics and survey management. Requests are authenticated with Clerk, Supabase or password-login bearer tokens and scoped to one organization, picked with the X-Organization-ID header when organizations are enabled."
    ),
    modifiers(&BearerAuth),
    paths(
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        // Users
        handlers::users::me,
        handlers::users::list_users,
        handlers::users::update_role,
        // Organizations
        handlers::organizations::current,
        handlers::organizations::create,
        // Teams
        handlers::teams::create_team,
        handlers::teams::list_teams,
        handlers::teams::get_team,
        handlers::teams::update_team,
        handlers::teams::delete_team,
        handlers::teams::list_members,
        // Departments
        handlers::departments::create_department,
        handlers::departments::list_departments,
        handlers::departments::get_department,
        handlers::departments::update_department,
        handlers::departments::delete_department,
        // Employees
        handlers::employees::create_employee,
        handlers::employees::list_employees,
        handlers::employees::get_employee,
        handlers::employees::update_employee,
        handlers::employees::delete_employee,
        // Interviews
        handlers::interviews::create_interview,
        handlers::interviews::list_interviews,
        handlers::interviews::get_interview,
        handlers::interviews::delete_interview,
        // Tasks
        handlers::tasks::create_task,
        handlers::tasks::list_tasks,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        // Invitations
        handlers::invitations::create_invitation,
        handlers::invitations::list_invitations,
        handlers::invitations::revoke_invitation,
        handlers::invitations::accept_invitation,
        handlers::invitations::accept_pending,
        handlers::invitations::expire_invitations,
        // Surveys
        handlers::surveys::list_surveys,
        handlers::surveys::create_survey,
        handlers::surveys::get_survey,
        handlers::surveys::update_survey,
        handlers::surveys::delete_survey,
        handlers::surveys::list_questions,
        handlers::surveys::create_question,
        handlers::surveys::delete_question,
        handlers::surveys::list_responses,
        handlers::surveys::submit_responses,
        handlers::surveys::list_participants,
        handlers::surveys::add_participant,
        handlers::surveys::update_participant_status,
        // Analytics
        handlers::analytics::summary,
    ),
    components(
        schemas(
            // Users and auth
            models::UserResponse,
            models::UserRole,
            models::RegisterRequest,
            models::LoginRequest,
            models::LoginResponse,
            models::UpdateRoleRequest,
            // Organizations
            models::Organization,
            models::CreateOrganizationRequest,
            // HR
            models::Team,
            models::TeamMember,
            models::CreateTeamRequest,
            models::UpdateTeamRequest,
            models::Department,
            models::CreateDepartmentRequest,
            models::UpdateDepartmentRequest,
            models::Employee,
            models::CreateEmployeeRequest,
            models::UpdateEmployeeRequest,
            models::Interview,
            models::InterviewAnswer,
            models::InterviewWithAnswers,
            models::InterviewAnswerInput,
            models::CreateInterviewRequest,
            models::Task,
            models::TaskStatus,
            models::CreateTaskRequest,
            models::UpdateTaskRequest,
            // Invitations
            models::Invitation,
            models::InvitationStatus,
            models::CreateInvitationRequest,
            models::AcceptInvitationsResponse,
            models::ExpireSweepResponse,
            // Surveys
            models::Survey,
            models::SurveyStatus,
            models::CreateSurveyRequest,
            models::UpdateSurveyRequest,
            models::SurveyQuestion,
            models::QuestionKind,
            models::CreateQuestionRequest,
            models::SurveyResponse,
            models::AnswerInput,
            models::SubmitResponsesRequest,
            models::Participant,
            models::ParticipantStatus,
            models::AddParticipantRequest,
            models::UpdateParticipantStatusRequest,
            // Analytics
            models::OrganizationSummary,
            models::TeamHeadcount,
            models::DepartmentHeadcount,
            models::TeamRating,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Password registration and login"),
        (name = "users", description = "Signed-in user and role management"),
        (name = "organizations", description = "Tenants and their Clerk organization link"),
        (name = "teams", description = "Teams and their members"),
        (name = "departments", description = "Departments"),
        (name = "employees", description = "Employee records"),
        (name = "interviews", description = "Scored employee interviews"),
        (name = "tasks", description = "HR tasks"),
        (name = "invitations", description = "Team invitations mirrored in Clerk"),
        (name = "surveys", description = "Surveys stored in Supabase"),
        (name = "analytics", description = "Organization dashboard aggregates"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_tenant_paths() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/teams/{id}/members"));
        assert!(spec.paths.paths.contains_key("/api/invitations/{id}/revoke"));
        assert!(spec
            .paths
            .paths
            .contains_key("/api/surveys/{id}/participants/{participant_id}"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let spec = get_openapi_spec();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
