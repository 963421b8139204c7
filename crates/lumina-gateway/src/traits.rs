//! Trait definitions for completion gateways.

use async_trait::async_trait;
use lumina_core::{PageSource, Prompt};

/// Errors that can occur during a completion.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No response from AI")]
    EmptyResponse,

    #[error("AI response was not valid JSON: {0}")]
    MalformedResponse(String),

    #[error("Completion service error: {0}")]
    Upstream(String),
}

/// A single-shot boundary to a generative model.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Backend identifier (e.g., "gemini")
    fn name(&self) -> &'static str;

    /// Generate page fragments for a prompt.
    ///
    /// The prompt is already validated; implementations do not check it again.
    /// Dropping the returned future abandons the request.
    async fn generate(&self, prompt: &Prompt) -> Result<PageSource, GatewayError>;
}
