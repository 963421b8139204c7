//! Application server command.

use std::sync::Arc;

use anyhow::{Context, Result};

use lumina_server::{AppState, LuminaServer, ServerConfig};
use lumina_store::LocalIdentity;

use crate::config::LuminaConfig;

/// Run the serve command.
pub async fn run(config: LuminaConfig, port: Option<u16>, open: bool) -> Result<()> {
    let api_key = config.api_key().unwrap_or_else(|| {
        tracing::warn!(
            "{} is not set; generation requests will fail",
            config.gateway.api_key_env
        );
        String::new()
    });

    let documents = config.documents();
    let state = AppState::new(
        Arc::new(LocalIdentity::new(documents.clone())),
        Arc::new(config.gateway(api_key)),
        documents,
        config.history(),
        config.server.public_url.clone(),
    )
    .context("Failed to load templates")?;

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: port.unwrap_or(config.server.port),
        open: open || config.server.open,
    };

    LuminaServer::new(server_config, state).start().await?;

    Ok(())
}
