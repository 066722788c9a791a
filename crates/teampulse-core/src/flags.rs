//! Runtime feature flags
//!
//! Flags are read once at startup and copied into application state. They control
//! whether organizations are enforced and whether the ADMIN role is honoured.

use uuid::Uuid;

/// Tenant used for every request when multi-tenancy is disabled.
pub const DEFAULT_ORGANIZATION_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub enable_organizations: bool,
    pub enable_admin_role: bool,
    pub default_organization_id: Uuid,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_organizations: false,
            enable_admin_role: false,
            default_organization_id: DEFAULT_ORGANIZATION_ID,
        }
    }
}

/// Parse a boolean flag value. Unknown or missing values fall back to `default`.
pub fn parse_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        assert!(parse_flag(Some("TRUE"), false));
        assert!(parse_flag(Some(" on "), false));
        assert!(parse_flag(Some("1"), false));
        assert!(!parse_flag(Some("off"), true));
        assert!(!parse_flag(Some("No"), true));
    }

    #[test]
    fn test_parse_flag_falls_back_to_default() {
        assert!(parse_flag(None, true));
        assert!(!parse_flag(Some("maybe"), false));
    }

    #[test]
    fn test_default_flags_disable_tenancy() {
        let flags = FeatureFlags::default();
        assert!(!flags.enable_organizations);
        assert!(!flags.enable_admin_role);
        assert_eq!(
            flags.default_organization_id.to_string(),
            "00000000-0000-0000-0000-000000000001"
        );
    }
}
