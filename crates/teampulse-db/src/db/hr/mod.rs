pub mod analytics;
pub mod department;
pub mod employee;
pub mod interview;
pub mod task;
pub mod team;

pub use analytics::AnalyticsRepository;
pub use department::DepartmentRepository;
pub use employee::EmployeeRepository;
pub use interview::InterviewRepository;
pub use task::TaskRepository;
pub use team::TeamRepository;
