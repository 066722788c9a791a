//! Route groups by audience.
//!
//! `tenant_routes` need an organization context; `account_routes` only need a signed-in
//! user; `public_routes` need neither.

use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
}

pub fn account_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/me", get(handlers::users::me))
        .route("/api/organizations", post(handlers::organizations::create))
        .route(
            "/api/invitations/accept",
            post(handlers::invitations::accept_pending),
        )
        .route(
            "/api/invitations/{id}/accept",
            post(handlers::invitations::accept_invitation),
        )
        .route(
            "/api/invitations/expire",
            post(handlers::invitations::expire_invitations),
        )
}

pub fn tenant_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(people_routes())
        .merge(hr_routes())
        .merge(invitation_routes())
        .merge(survey_routes())
        .route(
            "/api/analytics/summary",
            get(handlers::analytics::summary),
        )
}

fn people_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(handlers::users::list_users))
        .route("/api/users/{id}/role", put(handlers::users::update_role))
        .route(
            "/api/organizations/current",
            get(handlers::organizations::current),
        )
}

fn hr_routes() -> Router<Arc<AppState>> {
    use handlers::{departments, employees, interviews, tasks, teams};

    Router::new()
        .route("/api/teams", post(teams::create_team).get(teams::list_teams))
        .route(
            "/api/teams/{id}",
            get(teams::get_team)
                .put(teams::update_team)
                .delete(teams::delete_team),
        )
        .route("/api/teams/{id}/members", get(teams::list_members))
        .route(
            "/api/departments",
            post(departments::create_department).get(departments::list_departments),
        )
        .route(
            "/api/departments/{id}",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        )
        .route(
            "/api/employees",
            post(employees::create_employee).get(employees::list_employees),
        )
        .route(
            "/api/employees/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route(
            "/api/interviews",
            post(interviews::create_interview).get(interviews::list_interviews),
        )
        .route(
            "/api/interviews/{id}",
            get(interviews::get_interview).delete(interviews::delete_interview),
        )
        .route("/api/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route(
            "/api/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
}

fn invitation_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/invitations",
            post(handlers::invitations::create_invitation)
                .get(handlers::invitations::list_invitations),
        )
        .route(
            "/api/invitations/{id}/revoke",
            post(handlers::invitations::revoke_invitation),
        )
}

fn survey_routes() -> Router<Arc<AppState>> {
    use handlers::surveys;

    Router::new()
        .route(
            "/api/surveys",
            get(surveys::list_surveys).post(surveys::create_survey),
        )
        .route(
            "/api/surveys/{id}",
            get(surveys::get_survey)
                .put(surveys::update_survey)
                .delete(surveys::delete_survey),
        )
        .route(
            "/api/surveys/{id}/questions",
            get(surveys::list_questions).post(surveys::create_question),
        )
        .route(
            "/api/surveys/{id}/questions/{question_id}",
            axum::routing::delete(surveys::delete_question),
        )
        .route(
            "/api/surveys/{id}/responses",
            get(surveys::list_responses).post(surveys::submit_responses),
        )
        .route(
            "/api/surveys/{id}/participants",
            get(surveys::list_participants).post(surveys::add_participant),
        )
        .route(
            "/api/surveys/{id}/participants/{participant_id}",
            put(surveys::update_participant_status),
        )
}
