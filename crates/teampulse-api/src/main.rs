use teampulse_api::setup;
use teampulse_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let app = setup::initialize_app(config.clone()).await?;
    setup::server::start_server(&config, app.router).await?;

    if let Some(sweeper) = app.sweeper {
        sweeper.shutdown().await;
    }
    app.state.db.pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
