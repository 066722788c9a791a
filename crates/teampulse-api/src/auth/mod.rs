//! Authentication: bearer-token verification, identity mapping and the auth middleware.

pub mod identity;
pub mod jwks;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use identity::{IdentityResolver, ResolvedUser};
pub use jwks::ClerkJwtVerifier;
pub use jwt::{LegacyTokens, SupabaseTokens, TokenVerifier, VerifiedToken};
pub use middleware::{auth_middleware, AuthFailureLimiter, AuthState};
pub use models::{AuthUser, CurrentOrg, VerifiedIdentity};
