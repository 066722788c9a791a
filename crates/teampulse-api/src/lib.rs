//! TeamPulse API Library
//!
//! HTTP handlers, authentication, tenancy middleware and application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
mod utils;

pub mod auth;
pub mod error;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{ErrorResponse, HttpAppError};
