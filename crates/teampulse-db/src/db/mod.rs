//! Database repositories for data access layer
//!
//! Repositories are organized into control/ (users, organizations, invitations) and hr/
//! (teams, departments, employees, interviews, tasks, analytics). Every tenant-scoped
//! query takes the organization id explicitly.
//
// Identity and tenancy repositories
pub mod control;
//
// HR data repositories
pub mod hr;
//
// Transaction utilities
pub mod transaction;

pub use control::{InvitationRepository, InvitationStore, OrganizationRepository, UserRepository};
pub use hr::{
    AnalyticsRepository, DepartmentRepository, EmployeeRepository, InterviewRepository,
    TaskRepository, TeamRepository,
};
pub use transaction::with_transaction;

use teampulse_core::AppError;

/// Map a unique-constraint violation to `BadRequest(message)`, anything else to a
/// database error.
pub(crate) fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::BadRequest(message.to_string())
        }
        _ => AppError::from(err),
    }
}
