//! Ephemeral preview documents.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::session::SessionToken;

/// Content-Security-Policy sent with every preview document.
pub const PREVIEW_CSP: &str = "sandbox allow-scripts allow-popups allow-forms";

#[derive(Debug)]
struct Preview {
    owner: SessionToken,
    document: String,
}

/// Assembled documents held in memory under random tokens.
///
/// Nothing here is persisted. Entries live until released or until the
/// owning session ends.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    documents: RwLock<HashMap<String, Preview>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document for a session and return its token.
    pub async fn register(&self, owner: &SessionToken, document: String) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.documents.write().await.insert(
            token.clone(),
            Preview {
                owner: owner.clone(),
                document,
            },
        );
        token
    }

    pub async fn get(&self, token: &str) -> Option<String> {
        self.documents
            .read()
            .await
            .get(token)
            .map(|preview| preview.document.clone())
    }

    /// Release one of `owner`'s documents. Returns `false` for unknown tokens
    /// and for documents of other sessions.
    pub async fn release(&self, owner: &SessionToken, token: &str) -> bool {
        let mut documents = self.documents.write().await;
        match documents.get(token) {
            Some(preview) if &preview.owner == owner => documents.remove(token).is_some(),
            _ => false,
        }
    }

    /// Release everything a session registered.
    pub async fn clear(&self, owner: &SessionToken) {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, preview| &preview.owner != owner);
        if documents.len() < before {
            tracing::debug!("Releasing {} previews", before - documents.len());
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

/// Path a preview is served from.
pub fn preview_path(token: &str) -> String {
    format!("/preview/{}", token)
}
