//! Configuration validation
//!
//! `Config::from_env` already rejects values that cannot work. This pass catches
//! combinations that start fine but behave surprisingly, and warns or fails early.

use anyhow::Result;
use teampulse_core::Config;

/// Validate cross-field configuration before anything connects.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    if config.jwt_expiry_hours() < 1 {
        return Err(anyhow::anyhow!("JWT_EXPIRY_HOURS must be at least 1"));
    }

    if config.trusted_proxy_count() > 10 {
        tracing::warn!(
            trusted_proxy_count = config.trusted_proxy_count(),
            "TRUSTED_PROXY_COUNT is very high - ensure this matches your actual proxy setup"
        );
    }

    if config.clerk_jwks_url().is_some() && config.clerk_secret_key().is_none() {
        tracing::warn!(
            "CLERK_JWKS_URL is set without CLERK_SECRET_KEY - Clerk sessions verify, but invitations stay local"
        );
    }

    if config.is_production() && config.clerk_secret_key().is_none() {
        tracing::warn!("Running in production without Clerk - invitation emails will not be sent");
    }

    if config.supabase_url().is_none() {
        tracing::info!("Supabase not configured - survey endpoints will answer 502");
    }

    let flags = config.flags();
    if !flags.enable_organizations {
        tracing::info!(
            default_organization_id = %flags.default_organization_id,
            "Organizations disabled - every request uses the default organization"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use teampulse_core::AppConfig;

    fn config(overrides: &[(&str, &str)]) -> Config {
        let mut env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/teampulse"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]);
        env.extend(overrides.iter().copied());
        let app = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        Config(Box::new(app))
    }

    #[test]
    fn test_defaults_pass() {
        assert!(validate_config(&config(&[])).is_ok());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let err = validate_config(&config(&[("DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(err.to_string().contains("max connections"));
    }

    #[test]
    fn test_zero_token_lifetime_rejected() {
        assert!(validate_config(&config(&[("JWT_EXPIRY_HOURS", "0")])).is_err());
    }
}
