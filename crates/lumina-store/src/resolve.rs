//! Unauthenticated lookup of public copies.

use std::sync::Arc;

use lumina_core::{PublicId, PublishedPage, ViewerEvent, ViewerState};

use crate::document::DocumentStore;
use crate::publish::PUBLISHED_PAGES;

/// Errors from a public lookup.
///
/// Callers show both the same way; they differ only in what gets logged.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Published page not found")]
    NotFound,

    #[error("Failed to fetch published page: {0}")]
    Fetch(String),
}

/// Reads public copies. Never writes and never needs an identity.
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn DocumentStore>,
}

impl Resolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Look up a public copy with a single store read.
    pub async fn resolve(&self, id: &PublicId) -> Result<PublishedPage, ResolveError> {
        let record = self
            .store
            .get(PUBLISHED_PAGES, id.as_str())
            .await
            .map_err(|e| ResolveError::Fetch(e.to_string()))?
            .ok_or(ResolveError::NotFound)?;

        serde_json::from_value(record).map_err(|e| ResolveError::Fetch(e.to_string()))
    }

    /// Resolve and fold the outcome into the viewer state machine.
    pub async fn view(&self, id: &PublicId) -> ViewerState {
        let event = match self.resolve(id).await {
            Ok(page) => ViewerEvent::Resolved(page),
            Err(ResolveError::NotFound) => {
                tracing::info!("Published page {} not found", id);
                ViewerEvent::NotFound
            }
            Err(ResolveError::Fetch(cause)) => {
                tracing::error!("Error fetching published page {}: {}", id, cause);
                ViewerEvent::FetchFailed
            }
        };
        ViewerState::Loading.apply(event)
    }
}
