//! Application state and sub-state extractors.
//!
//! Handlers take `State<Arc<AppState>>`; middleware that only needs a slice of it
//! extracts the sub-state through `FromRef`.

use sqlx::PgPool;
use std::sync::Arc;
use teampulse_core::{AppError, Config, FeatureFlags};
use teampulse_db::{
    AnalyticsRepository, DepartmentRepository, EmployeeRepository, InterviewRepository,
    OrganizationRepository, TaskRepository, TeamRepository, UserRepository,
};
use teampulse_services::SurveyStore;

use crate::auth::AuthState;
use crate::services::InvitationService;

/// Database pool and repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub users: UserRepository,
    pub organizations: OrganizationRepository,
    pub teams: TeamRepository,
    pub departments: DepartmentRepository,
    pub employees: EmployeeRepository,
    pub interviews: InterviewRepository,
    pub tasks: TaskRepository,
    pub analytics: AnalyticsRepository,
}

impl DbState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            organizations: OrganizationRepository::new(pool.clone()),
            teams: TeamRepository::new(pool.clone()),
            departments: DepartmentRepository::new(pool.clone()),
            employees: EmployeeRepository::new(pool.clone()),
            interviews: InterviewRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool.clone()),
            analytics: AnalyticsRepository::new(pool.clone()),
            pool,
        }
    }
}

/// What the organization-context middleware needs.
#[derive(Clone)]
pub struct OrgContextState {
    pub flags: FeatureFlags,
    pub organizations: OrganizationRepository,
}

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub auth: Arc<AuthState>,
    pub invitations: InvitationService,
    /// Survey backend; `None` when Supabase is not configured
    pub surveys: Option<Arc<dyn SurveyStore>>,
    pub config: Config,
    pub flags: FeatureFlags,
    pub is_production: bool,
}

impl AppState {
    pub fn survey_store(&self) -> Result<&Arc<dyn SurveyStore>, AppError> {
        self.surveys.as_ref().ok_or_else(|| {
            AppError::external("supabase", None, "Survey backend is not configured")
        })
    }
}

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for OrgContextState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        OrgContextState {
            flags: state.flags,
            organizations: state.db.organizations.clone(),
        }
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRef;

    use crate::test_helpers::{test_config, test_state};

    #[tokio::test]
    async fn test_sub_states_follow_app_state() {
        let config = test_config(&[("ENABLE_ADMIN_ROLE", "true")]);
        let state = test_state(&config);

        let org = OrgContextState::from_ref(&state);
        assert_eq!(org.flags.enable_admin_role, state.flags.enable_admin_role);
        assert!(state.auth.admin_enabled);

        let auth = state.auth.clone();
        assert!(Arc::ptr_eq(&auth, &state.auth));
        assert!(state.survey_store().is_err());
    }
}
