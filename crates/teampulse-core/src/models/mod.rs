//! Data models for the application
//!
//! Relational rows persisted in Postgres, survey rows stored in Supabase, and the
//! request/response DTOs the API exchanges. Each sub-module covers one feature area.

mod analytics;
mod employee;
mod interview;
mod invitation;
mod organization;
mod survey;
mod task;
mod team;
mod user;

pub use analytics::*;
pub use employee::*;
pub use interview::*;
pub use invitation::*;
pub use organization::*;
pub use survey::*;
pub use task::*;
pub use team::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Distinguishes a missing field (`None`) from an explicit `null` (`Some(None)`)
/// in partial updates.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Pagination query parameters shared by list endpoints
#[derive(Debug, Clone, Copy, Deserialize, utoipa::IntoParams)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl Pagination {
    /// Clamp to sane bounds before handing values to SQL.
    pub fn clamped(self) -> Self {
        Self {
            limit: self.limit.clamp(1, 200),
            offset: self.offset.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps_limits() {
        let p = Pagination {
            limit: 10_000,
            offset: -5,
        }
        .clamped();
        assert_eq!(p.limit, 200);
        assert_eq!(p.offset, 0);

        let p = Pagination { limit: 0, offset: 3 }.clamped();
        assert_eq!(p.limit, 1);
        assert_eq!(p.offset, 3);
    }

    #[test]
    fn test_explicit_null_is_distinguished_from_missing() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "deserialize_some")]
            head_id: Option<Option<uuid::Uuid>>,
        }

        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.head_id, None);

        let cleared: Patch = serde_json::from_str(r#"{"head_id": null}"#).unwrap();
        assert_eq!(cleared.head_id, Some(None));
    }
}
