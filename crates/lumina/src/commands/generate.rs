//! Generate a page from the command line.

use anyhow::{bail, Context, Result};

use lumina_core::{GeneratedPage, Prompt};
use lumina_gateway::CompletionGateway;
use lumina_store::{IdentityProvider, LocalIdentity, Session};

use crate::config::LuminaConfig;

/// Run the generate command.
///
/// The session follows the identity provider's change feed: it starts from
/// the user the provider reports after sign-in, and a sign-out reported while
/// the completion is in flight abandons it, as does Ctrl-C. Either way the
/// history is left untouched.
pub async fn run(config: LuminaConfig, email: &str, prompt: String) -> Result<()> {
    let prompt = Prompt::parse(prompt)?;

    let api_key = config
        .api_key()
        .with_context(|| format!("Set {} to your API key", config.gateway.api_key_env))?;
    let gateway = config.gateway(api_key);

    let identity = LocalIdentity::new(config.documents());
    let mut changes = identity.subscribe();
    super::sign_in(&identity, email).await?;
    let user = changes
        .borrow_and_update()
        .clone()
        .context("Identity provider reported no user after sign-in")?;
    let mut session = Session::start(user, config.history());
    session.generation_started(prompt.as_str());

    tracing::info!("Generating with {}...", gateway.name());

    let outcome = tokio::select! {
        outcome = gateway.generate(&prompt) => outcome,
        _ = tokio::signal::ctrl_c() => {
            session.generation_failed("Cancelled");
            session.end();
            bail!("Generation cancelled");
        }
        _ = changes.wait_for(Option::is_none) => {
            session.generation_failed("Signed out");
            session.end();
            bail!("Signed out during generation");
        }
    };

    let source = match outcome {
        Ok(source) => source,
        Err(e) => {
            session.generation_failed(e.to_string());
            session.end();
            return Err(e.into());
        }
    };

    let page = GeneratedPage::create(&prompt, source, session.user().id.clone());
    session
        .generation_succeeded(page.clone())
        .context("Failed to save history")?;
    session.end();

    tracing::info!("Generated \"{}\"", page.title());
    println!("{}", page.id());

    Ok(())
}
