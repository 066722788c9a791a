//! TeamPulse Infrastructure Library
//!
//! Shared infrastructure for the API server: request-id and security-header middleware,
//! tracing initialization and the JSON error body.

pub mod error;
pub mod middleware;
pub mod telemetry;

pub use error::ErrorResponse;
pub use middleware::{request_id_middleware, security_headers_middleware, RequestId};
pub use telemetry::{init_telemetry, shutdown_telemetry};
