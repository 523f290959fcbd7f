mod config;
mod state;

use config::VersaConfig;
use state::ServerState;
use std::path::Path;
use tracing::info;
use versa_protocol::ProtocolAdapter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Versa...");

    let config = VersaConfig::load(Path::new("config/versa.toml"))?;
    info!(
        "Config loaded: latest={} ({}), {} translated protocols, {} custom items",
        config.latest.id,
        config.latest.version,
        config.protocols.len(),
        config.custom_items.len()
    );
    if config.protocols.is_empty() {
        tracing::warn!("No protocols configured, only {} will be accepted", config.latest.version);
    }

    let state = ServerState::load(&config).await?;
    state.self_check()?;

    let latest = state.latest();
    info!(
        "Latest catalogues: {} block states, {} items",
        latest.blocks.len(),
        latest.items.len()
    );
    for adapter in state.adapters() {
        info!("Accepting protocol {} ({})", adapter.id(), adapter.version());
    }

    Ok(())
}
