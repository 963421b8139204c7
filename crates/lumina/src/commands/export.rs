//! Export a page from history.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use lumina_core::PageId;
use lumina_static::{ExportedProject, PageRenderer};
use lumina_store::{LocalIdentity, SessionCache};

use crate::config::LuminaConfig;

/// Run the export command.
pub async fn run(
    config: LuminaConfig,
    email: &str,
    id: &str,
    output: &Path,
    as_dir: bool,
) -> Result<()> {
    let identity = LocalIdentity::new(config.documents());
    let user = super::sign_in(&identity, email).await?;

    let history = SessionCache::open(config.history(), user.id.clone());
    let page = history
        .get(&PageId::from(id))
        .with_context(|| format!("No page {} in your history", id))?;

    let renderer = PageRenderer::new()?;
    let project = ExportedProject::build(&renderer, page.source())?;

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let written = if as_dir {
        project.write_to(output)?
    } else {
        let path = output.join(project.archive_name());
        let archive = project.to_zip()?;
        fs::write(&path, archive).with_context(|| format!("Failed to write {}", path.display()))?;
        path
    };

    tracing::info!("Exported \"{}\" to {}", page.title(), written.display());
    Ok(())
}
