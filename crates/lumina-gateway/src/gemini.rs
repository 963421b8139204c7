//! Gemini `generateContent` implementation of the completion gateway.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use lumina_core::{PageSource, Prompt};

use crate::directive::{response_schema, SYSTEM_DIRECTIVE};
use crate::traits::{CompletionGateway, GatewayError};

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base, e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// API key sent as `x-goog-api-key`
    pub api_key: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-pro-preview".to_string(),
            api_key: String::new(),
        }
    }
}

/// Gateway backed by the Gemini REST API.
pub struct GeminiGateway {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGateway {
    /// Create a new gateway.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// Build the request body for a prompt.
fn request_body(prompt: &Prompt) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_DIRECTIVE }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt.as_str() }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        },
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }
}

/// Decode the model's text into page fragments.
///
/// Missing or empty text is `EmptyResponse`; anything that is not a JSON
/// object with four string fields is `MalformedResponse`.
pub fn parse_page_source(text: Option<&str>) -> Result<PageSource, GatewayError> {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return Err(GatewayError::EmptyResponse),
    };

    let malformed = |reason: String| {
        tracing::warn!("Failed to parse completion JSON: {}", reason);
        GatewayError::MalformedResponse(reason)
    };

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
    // Derived struct decoding also takes a sequence in field order.
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

#[async_trait]
impl CompletionGateway for GeminiGateway {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<PageSource, GatewayError> {
        tracing::debug!("Requesting completion from {}", self.config.model);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!("{}: {}", status, body.trim())));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        parse_page_source(envelope.text().as_deref())
    }
}
