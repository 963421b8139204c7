pub mod export;
pub mod generate;
pub mod init;
pub mod serve;
pub mod view;

use anyhow::{Context, Result};

use lumina_core::User;
use lumina_store::IdentityProvider;

/// Environment variable read for the account password.
const PASSWORD_ENV: &str = "LUMINA_PASSWORD";

/// Sign in with `email` and the password from the environment.
async fn sign_in(identity: &dyn IdentityProvider, email: &str) -> Result<User> {
    let password = std::env::var(PASSWORD_ENV)
        .with_context(|| format!("Set {} to your account password", PASSWORD_ENV))?;

    let user = identity.sign_in(email, &password).await?;
    Ok(user)
}
