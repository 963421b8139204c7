//! Publication of private pages as public copies.

use std::sync::Arc;

use lumina_core::{GeneratedPage, PublicId, PublishedPage, UserId};

use crate::document::{DocumentStore, StoreError};

/// Collection holding public copies.
pub const PUBLISHED_PAGES: &str = "published_pages";

/// Query parameter of the entry URL that carries a public identifier.
pub const PUBLIC_ID_PARAM: &str = "p";

/// Errors that can occur while publishing.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to publish page: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to encode public copy: {0}")]
    Encode(String),
}

/// Creates public copies in the document store.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn DocumentStore>,
}

impl Publisher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a snapshot of `page` and return the new public identifier.
    ///
    /// Every call creates a separate copy, even for a page that is already
    /// published. The page itself is not modified; attaching the returned id
    /// is the caller's job.
    pub async fn publish(
        &self,
        page: &GeneratedPage,
        owner_id: &UserId,
    ) -> Result<PublicId, PublishError> {
        let copy = PublishedPage::snapshot(page, owner_id);
        let record =
            serde_json::to_value(&copy).map_err(|e| PublishError::Encode(e.to_string()))?;

        let id = self.store.create(PUBLISHED_PAGES, record).await?;

        tracing::info!("Published page {} as {}", page.id(), id);
        Ok(PublicId::from(id))
    }
}

/// Public link for a published page: `{base}?p={id}`.
pub fn public_url(base: &str, id: &PublicId) -> String {
    format!(
        "{}?{}={}",
        base.trim_end_matches('/'),
        PUBLIC_ID_PARAM,
        id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocumentStore;
    use lumina_core::{PageSource, Prompt};

    fn page() -> GeneratedPage {
        GeneratedPage::create(
            &Prompt::parse("A pricing page for a SaaS tool").unwrap(),
            PageSource {
                title: "Pricing".to_string(),
                markup: "<section>...</section>".to_string(),
                style: String::new(),
                script: String::new(),
            },
            UserId::from("u1"),
        )
    }

    #[tokio::test]
    async fn stores_snapshot_record() {
        let store = Arc::new(MemoryDocumentStore::new());
        let publisher = Publisher::new(store.clone());
        let page = page();

        let id = publisher.publish(&page, &UserId::from("u1")).await.unwrap();

        let record = store
            .get(PUBLISHED_PAGES, id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record["title"], "Pricing");
        assert_eq!(record["html"], "<section>...</section>");
        assert_eq!(record["prompt"], "A pricing page for a SaaS tool");
        assert_eq!(record["userId"], "u1");
        assert_eq!(record["originalId"], page.id().as_str());
        assert!(record["createdAt"].is_i64());
    }

    #[tokio::test]
    async fn republishing_creates_new_copy() {
        let store = Arc::new(MemoryDocumentStore::new());
        let publisher = Publisher::new(store.clone());
        let page = page();

        let first = publisher.publish(&page, &UserId::from("u1")).await.unwrap();
        let second = publisher.publish(&page, &UserId::from("u1")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.count(PUBLISHED_PAGES).await, 2);
    }

    #[test]
    fn builds_public_url() {
        let id = PublicId::from("abc123");
        assert_eq!(public_url("https://lumina.app/", &id), "https://lumina.app?p=abc123");
        assert_eq!(public_url("http://127.0.0.1:8787", &id), "http://127.0.0.1:8787?p=abc123");
    }
}
