//! API constants

/// Issuer claim on tokens minted by the password login endpoints.
pub const LEGACY_TOKEN_ISSUER: &str = "teampulse";

/// Audience Supabase Auth puts on signed-in user tokens.
pub const SUPABASE_TOKEN_AUDIENCE: &str = "authenticated";

/// How long JWKS keys fetched from Clerk stay cached.
pub const JWKS_CACHE_TTL_SECS: i64 = 3600;

/// Failed authentication attempts allowed per client IP within the window.
pub const AUTH_FAILURE_LIMIT: u32 = 10;
pub const AUTH_FAILURE_WINDOW_SECS: u64 = 15 * 60;

/// Largest JSON body the organization-context middleware buffers.
pub const MAX_ORG_CONTEXT_BODY_BYTES: usize = 1024 * 1024;

/// Request bodies above this size are rejected before reaching handlers.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Name given to the organization created at startup for single-tenant deployments.
pub const DEFAULT_ORGANIZATION_NAME: &str = "Default Organization";

/// In-flight request cap applied in front of every route.
pub const MAX_CONCURRENT_REQUESTS: usize = 10_000;
