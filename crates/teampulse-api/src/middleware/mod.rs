pub mod org_context;

pub use org_context::org_context_middleware;
