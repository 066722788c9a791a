//! TeamPulse Services Layer
//!
//! Outbound integrations: the Clerk backend API (invitations and user profiles) and the
//! Supabase project that stores survey data. Both sit behind traits so the API crate can
//! swap in in-memory implementations for tests or when an integration is not configured.

pub mod clerk;
pub mod supabase;

pub use clerk::{ClerkClient, ExternalInvitation, IdentityProvider, IdentityUser, NoopIdentityProvider};
pub use supabase::{SupabaseClient, SurveyStore};
