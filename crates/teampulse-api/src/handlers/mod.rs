//! HTTP handlers, one module per resource.

pub mod analytics;
pub mod auth;
pub mod departments;
pub mod employees;
pub mod interviews;
pub mod invitations;
pub mod organizations;
pub mod surveys;
pub mod tasks;
pub mod teams;
pub mod users;
