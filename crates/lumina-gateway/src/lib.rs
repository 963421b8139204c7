//! Completion gateway for Lumina.
//!
//! Sends a prompt plus a fixed design brief to a generative model and returns
//! the four page fragments it produces. One attempt per call; nothing is
//! persisted here.

pub mod directive;
pub mod gemini;
pub mod traits;

pub use directive::{response_schema, SYSTEM_DIRECTIVE};
pub use gemini::{parse_page_source, GeminiConfig, GeminiGateway};
pub use traits::{CompletionGateway, GatewayError};
