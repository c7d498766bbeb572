//! sockbot binary: load the config, then run the bot.

use sockbot::config::Config;
use sockbot::plugins::PluginRegistry;
use sockbot::Bot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server,
        nick = %config.nick,
        plugins = config.plugins.len(),
        "Starting sockbot"
    );

    Bot::new(config, PluginRegistry::with_builtins()).run().await?;

    info!("sockbot stopped");
    Ok(())
}
