//! Longbox Server Binary

use anyhow::{Context, Result};
use longbox_common_config::{vars, ConfigLoader, Environment};
use longbox_common_log::LogConfig;
use longbox_server::Server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    Environment::init();
    longbox_common_log::init(LogConfig::from_env()).context("failed to initialise logging")?;

    let config_dir = Environment::get_or(vars::CONFIG_DIR, ".");
    let config = ConfigLoader::new(config_dir)
        .load()
        .context("failed to load configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rbac_enabled = config.features.rbac_enabled,
        "Starting Longbox server"
    );

    let server = Server::new(config).await?;
    server.run().await?;

    info!("Server shutdown complete");
    Ok(())
}
