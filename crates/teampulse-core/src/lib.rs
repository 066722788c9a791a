//! TeamPulse Core Library
//!
//! Domain models, error types, configuration, feature flags and the tenancy and
//! invitation rules shared by every TeamPulse crate.

pub mod config;
pub mod error;
pub mod flags;
pub mod invitation_policy;
pub mod models;
pub mod org_context;

pub use config::{AppConfig, BaseConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use flags::{FeatureFlags, DEFAULT_ORGANIZATION_ID};
pub use org_context::{OrgContext, OrgContextSources, OrgSelector, OrgSource};
