//! HTTP application for Lumina.
//!
//! Serves the application shell and the public viewer from one entry URL,
//! and exposes the page lifecycle (generate, publish, preview, export) as a
//! JSON API. Each signed-in client holds its own session, named by an
//! HttpOnly cookie.

pub mod error;
pub mod preview;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::AppError;
pub use preview::{PreviewRegistry, PREVIEW_CSP};
pub use routes::create_router;
pub use server::{LuminaServer, ServerConfig, ServerError};
pub use session::{SessionToken, SESSION_COOKIE};
pub use state::AppState;
