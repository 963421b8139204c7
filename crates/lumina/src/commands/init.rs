//! Write a default configuration file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::DEFAULT_CONFIG;

/// Run the init command.
pub async fn run(path: &Path, yes: bool) -> Result<()> {
    if path.exists() && !yes {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());
    tracing::info!("Export your API key and run 'lumina serve' to get started.");

    Ok(())
}
