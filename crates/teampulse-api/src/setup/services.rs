//! Service initialization and application state setup

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use teampulse_core::Config;
use teampulse_db::InvitationRepository;
use teampulse_services::{
    ClerkClient, IdentityProvider, NoopIdentityProvider, SupabaseClient, SurveyStore,
};

use crate::auth::{
    AuthFailureLimiter, AuthState, ClerkJwtVerifier, IdentityResolver, LegacyTokens,
    SupabaseTokens, TokenVerifier,
};
use crate::constants::{AUTH_FAILURE_LIMIT, AUTH_FAILURE_WINDOW_SECS, DEFAULT_ORGANIZATION_NAME};
use crate::services::{ExpirySweeper, InvitationService, InvitationSettings};
use crate::state::{AppState, DbState};

/// Path on the frontend that finishes an invitation sign-up.
const ACCEPT_INVITATION_PATH: &str = "/accept-invitation";

/// Build the repositories and outbound clients and assemble the application state.
pub async fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let db = DbState::new(pool.clone());
    let flags = config.flags();

    let default_org = db
        .organizations
        .ensure_default(flags.default_organization_id, DEFAULT_ORGANIZATION_NAME)
        .await
        .context("Failed to ensure the default organization")?;
    tracing::info!(organization_id = %default_org.id, "Default organization ready");

    let identity_provider = identity_provider(config)?;
    let surveys = survey_store(config)?;

    let invitations = InvitationService::new(
        Arc::new(InvitationRepository::new(pool)),
        identity_provider.clone(),
        InvitationSettings {
            max_pending_per_manager: config.max_pending_invitations_per_manager(),
            expiry_days: config.invitation_expiry_days(),
            redirect_url: config
                .frontend_url()
                .map(|url| format!("{}{}", url.trim_end_matches('/'), ACCEPT_INVITATION_PATH)),
        },
    );

    let verifier = TokenVerifier::new(
        LegacyTokens::new(config.jwt_secret(), config.jwt_expiry_hours()),
        config.supabase_jwt_secret().map(SupabaseTokens::new),
        config.clerk_jwks_url().map(ClerkJwtVerifier::new),
    );

    let auth = AuthState {
        verifier,
        identities: IdentityResolver::new(
            db.users.clone(),
            db.organizations.clone(),
            identity_provider,
            flags,
        ),
        invitations: invitations.clone(),
        failure_limiter: Some(Arc::new(AuthFailureLimiter::new(
            AUTH_FAILURE_LIMIT,
            AUTH_FAILURE_WINDOW_SECS,
        ))),
        trusted_proxy_count: config.trusted_proxy_count(),
        admin_enabled: flags.enable_admin_role,
    };

    Ok(Arc::new(AppState {
        db,
        auth: Arc::new(auth),
        invitations,
        surveys,
        config: config.clone(),
        flags,
        is_production: config.is_production(),
    }))
}

/// Start the periodic invitation expiry sweep, unless disabled by configuration.
pub fn start_background_tasks(config: &Config, state: &AppState) -> Option<ExpirySweeper> {
    ExpirySweeper::start(
        state.invitations.clone(),
        config.invitation_sweep_interval_secs(),
    )
}

fn identity_provider(config: &Config) -> Result<Arc<dyn IdentityProvider>> {
    match config.clerk_secret_key() {
        Some(secret_key) => {
            let client = ClerkClient::new(config.clerk_api_url(), secret_key)?;
            tracing::info!(api_url = %config.clerk_api_url(), "Clerk identity provider enabled");
            Ok(Arc::new(client))
        }
        None => {
            tracing::info!("CLERK_SECRET_KEY not set, invitations stay local");
            Ok(Arc::new(NoopIdentityProvider))
        }
    }
}

fn survey_store(config: &Config) -> Result<Option<Arc<dyn SurveyStore>>> {
    match (config.supabase_url(), config.supabase_service_role_key()) {
        (Some(url), Some(key)) => {
            let client = SupabaseClient::new(url, key)?;
            tracing::info!(url = %url, "Supabase survey backend enabled");
            Ok(Some(Arc::new(client)))
        }
        _ => Ok(None),
    }
}
