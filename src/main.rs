//! # Chirp Server
//!
//! Entry point: loads configuration, initializes logging and serves the
//! API until interrupted.

use anyhow::Result;
use tracing::info;

use chirp_server::config::Settings;
use chirp_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    chirp_server::telemetry::init_tracing(&settings.log_format);

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        database = ?settings.database.backend,
        sessions = ?settings.session.backend,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
