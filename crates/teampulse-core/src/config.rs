//! Configuration module
//!
//! Settings come from environment variables (with `.env` support) and are validated once
//! at startup. `Config` is cheap to clone and exposes getters for every field.

use std::env;

use uuid::Uuid;

use crate::flags::{parse_flag, FeatureFlags, DEFAULT_ORGANIZATION_ID};
use crate::invitation_policy::{DEFAULT_EXPIRY_DAYS, DEFAULT_MAX_PENDING_PER_MANAGER};

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const INVITATION_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_CLERK_API_URL: &str = "https://api.clerk.com/v1";
const MIN_JWT_SECRET_LEN: usize = 32;

/// Server, database and legacy token settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
    /// `json` switches log output to one JSON object per line
    pub log_json: bool,
    /// Reverse proxies in front of the server, used to pick the client IP from
    /// `X-Forwarded-For`
    pub trusted_proxy_count: usize,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Clerk
    pub clerk_secret_key: Option<String>,
    pub clerk_api_url: String,
    pub clerk_jwks_url: Option<String>,
    // Supabase
    pub supabase_url: Option<String>,
    pub supabase_service_role_key: Option<String>,
    pub supabase_jwt_secret: Option<String>,
    pub flags: FeatureFlags,
    // Invitations
    pub max_pending_invitations_per_manager: i64,
    pub invitation_expiry_days: i64,
    /// Seconds between background expiry sweeps. 0 = disabled.
    pub invitation_sweep_interval_secs: u64,
    pub frontend_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = AppConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production(&self.inner().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_json(&self) -> bool {
        self.inner().base.log_json
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.inner().base.trusted_proxy_count
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.inner().base.jwt_expiry_hours
    }

    pub fn clerk_secret_key(&self) -> Option<&str> {
        self.inner().clerk_secret_key.as_deref()
    }

    pub fn clerk_api_url(&self) -> &str {
        &self.inner().clerk_api_url
    }

    pub fn clerk_jwks_url(&self) -> Option<&str> {
        self.inner().clerk_jwks_url.as_deref()
    }

    pub fn supabase_url(&self) -> Option<&str> {
        self.inner().supabase_url.as_deref()
    }

    pub fn supabase_service_role_key(&self) -> Option<&str> {
        self.inner().supabase_service_role_key.as_deref()
    }

    pub fn supabase_jwt_secret(&self) -> Option<&str> {
        self.inner().supabase_jwt_secret.as_deref()
    }

    pub fn flags(&self) -> FeatureFlags {
        self.inner().flags
    }

    pub fn max_pending_invitations_per_manager(&self) -> i64 {
        self.inner().max_pending_invitations_per_manager
    }

    pub fn invitation_expiry_days(&self) -> i64 {
        self.inner().invitation_expiry_days
    }

    pub fn invitation_sweep_interval_secs(&self) -> u64 {
        self.inner().invitation_sweep_interval_secs
    }

    pub fn frontend_url(&self) -> Option<&str> {
        self.inner().frontend_url.as_deref()
    }
}

fn is_production(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

impl AppConfig {
    /// Build the configuration from a key lookup. `Config::from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = non_empty("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: non_empty("PORT")
                .unwrap_or_else(|| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: non_empty("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: non_empty("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: non_empty("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: non_empty("JWT_EXPIRY_HOURS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(JWT_EXPIRY_HOURS),
            environment,
            log_json: non_empty("LOG_FORMAT")
                .map(|f| f.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            trusted_proxy_count: non_empty("TRUSTED_PROXY_COUNT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
        };

        let default_organization_id = match non_empty("DEFAULT_ORGANIZATION_ID") {
            Some(raw) => Uuid::parse_str(raw.trim())
                .map_err(|_| anyhow::anyhow!("DEFAULT_ORGANIZATION_ID must be a UUID"))?,
            None => DEFAULT_ORGANIZATION_ID,
        };

        let flags = FeatureFlags {
            enable_organizations: parse_flag(lookup("ENABLE_ORGANIZATIONS").as_deref(), false),
            enable_admin_role: parse_flag(lookup("ENABLE_ADMIN_ROLE").as_deref(), false),
            default_organization_id,
        };

        let config = AppConfig {
            base,
            database_url: non_empty("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            clerk_secret_key: non_empty("CLERK_SECRET_KEY"),
            clerk_api_url: non_empty("CLERK_API_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_CLERK_API_URL.to_string()),
            clerk_jwks_url: non_empty("CLERK_JWKS_URL"),
            supabase_url: non_empty("SUPABASE_URL").map(|s| s.trim_end_matches('/').to_string()),
            supabase_service_role_key: non_empty("SUPABASE_SERVICE_ROLE_KEY"),
            supabase_jwt_secret: non_empty("SUPABASE_JWT_SECRET"),
            flags,
            max_pending_invitations_per_manager: non_empty("MAX_PENDING_INVITATIONS_PER_MANAGER")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_PENDING_PER_MANAGER),
            invitation_expiry_days: non_empty("INVITATION_EXPIRY_DAYS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_EXPIRY_DAYS),
            invitation_sweep_interval_secs: non_empty("INVITATION_SWEEP_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(INVITATION_SWEEP_INTERVAL_SECS),
            frontend_url: non_empty("FRONTEND_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.supabase_url.is_some() != self.supabase_service_role_key.is_some() {
            return Err(anyhow::anyhow!(
                "SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set together"
            ));
        }

        if self.max_pending_invitations_per_manager < 1 {
            return Err(anyhow::anyhow!(
                "MAX_PENDING_INVITATIONS_PER_MANAGER must be at least 1"
            ));
        }

        if self.invitation_expiry_days < 1 {
            return Err(anyhow::anyhow!("INVITATION_EXPIRY_DAYS must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/teampulse"),
            ("JWT_SECRET", SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&minimal())).unwrap();
        assert_eq!(config.base.server_port, 4000);
        assert_eq!(config.base.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.base.jwt_expiry_hours, 24);
        assert_eq!(config.clerk_api_url, "https://api.clerk.com/v1");
        assert_eq!(config.max_pending_invitations_per_manager, 10);
        assert_eq!(config.invitation_expiry_days, 7);
        assert_eq!(config.invitation_sweep_interval_secs, 3600);
        assert_eq!(config.flags, FeatureFlags::default());
        assert!(!config.base.log_json);
    }

    #[test]
    fn test_flags_and_overrides() {
        let mut pairs = minimal();
        pairs.extend([
            ("ENABLE_ORGANIZATIONS", "yes"),
            ("ENABLE_ADMIN_ROLE", "1"),
            ("DEFAULT_ORGANIZATION_ID", "6f1c1b8e-2f3a-4d55-9a51-2c1c8e0a7b10"),
            ("MAX_PENDING_INVITATIONS_PER_MANAGER", "3"),
            ("CORS_ORIGINS", "https://app.example.com, https://admin.example.com"),
        ]);
        let config = Config(Box::new(AppConfig::from_lookup(lookup(&pairs)).unwrap()));
        let flags = config.flags();
        assert!(flags.enable_organizations);
        assert!(flags.enable_admin_role);
        assert_eq!(
            flags.default_organization_id.to_string(),
            "6f1c1b8e-2f3a-4d55-9a51-2c1c8e0a7b10"
        );
        assert_eq!(config.max_pending_invitations_per_manager(), 3);
        assert_eq!(config.cors_origins().len(), 2);
        assert_eq!(config.cors_origins()[1], "https://admin.example.com");
    }

    #[test]
    fn test_missing_required_values() {
        let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", SECRET)])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err = AppConfig::from_lookup(lookup(&[(
            "DATABASE_URL",
            "postgres://localhost/teampulse",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let pairs = [
            ("DATABASE_URL", "postgres://localhost/teampulse"),
            ("JWT_SECRET", "too-short"),
        ];
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut pairs = minimal();
        pairs.push(("ENVIRONMENT", "production"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());

        pairs.push(("CORS_ORIGINS", "https://app.example.com"));
        let config = Config(Box::new(AppConfig::from_lookup(lookup(&pairs)).unwrap()));
        assert!(config.is_production());
    }

    #[test]
    fn test_supabase_settings_come_in_pairs() {
        let mut pairs = minimal();
        pairs.push(("SUPABASE_URL", "https://xyz.supabase.co/"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());

        pairs.push(("SUPABASE_SERVICE_ROLE_KEY", "service-key"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.supabase_url.as_deref(), Some("https://xyz.supabase.co"));
    }

    #[test]
    fn test_invalid_default_organization_id() {
        let mut pairs = minimal();
        pairs.push(("DEFAULT_ORGANIZATION_ID", "not-a-uuid"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }
}
