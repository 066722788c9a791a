//! Application setup and initialization
//!
//! Startup order: initialize tracing, validate configuration, connect the database and
//! migrate, build services, then the router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod validation;

use anyhow::{Context, Result};
use std::sync::Arc;
use teampulse_core::Config;

use crate::services::ExpirySweeper;
use crate::state::AppState;

/// Everything `main` needs to serve and later shut down.
pub struct Application {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub sweeper: Option<ExpirySweeper>,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<Application> {
    teampulse_infra::init_telemetry(config.log_json())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!(environment = %config.environment(), "Configuration loaded and validated");

    let pool = database::setup_database(&config).await?;
    let state = services::initialize_services(&config, pool).await?;
    let sweeper = services::start_background_tasks(&config, &state);
    let router = routes::setup_routes(&config, state.clone())?;

    Ok(Application {
        state,
        router,
        sweeper,
    })
}
