//! Render a published page without signing in.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use lumina_core::{PublicId, ViewerState};
use lumina_static::PageRenderer;
use lumina_store::Resolver;

use crate::config::LuminaConfig;

/// Run the view command.
pub async fn run(config: LuminaConfig, public_id: &str, output: Option<PathBuf>) -> Result<()> {
    let resolver = Resolver::new(config.documents());

    let page = match resolver.view(&PublicId::from(public_id)).await {
        ViewerState::Loaded(page) => page,
        ViewerState::Unavailable(message) => bail!(message),
        ViewerState::Loading => bail!("Page could not be loaded"),
    };

    let document = PageRenderer::new()?.assemble(&page.source)?;

    match output {
        Some(path) => {
            fs::write(&path, document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote \"{}\" to {}", page.title(), path.display());
        }
        None => println!("{}", document),
    }

    Ok(())
}
