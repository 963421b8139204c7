//! Document store boundary.
//!
//! Records are JSON objects grouped in named collections and addressed by a
//! store-assigned identifier.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors that can occur with a document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Stored record is not valid JSON: {0}")]
    Serialization(String),

    #[error("Invalid record key: {0}")]
    InvalidKey(String),
}

/// A durable collection-of-records store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record and return its generated identifier.
    async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError>;

    /// Read a record by identifier.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Create a record under a known identifier, or merge top-level fields
    /// into the existing one.
    async fn merge(&self, collection: &str, id: &str, record: Value) -> Result<(), StoreError>;
}

/// Store-assigned identifiers: 32 lowercase hex characters.
fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Keys must be safe to use as a single path component.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn merge_into(existing: &mut Value, record: Value) {
    match record {
        Value::Object(update) if existing.is_object() => {
            if let Some(current) = existing.as_object_mut() {
                current.extend(update);
            }
        }
        record => *existing = record,
    }
}

/// In-memory store, used by tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    records: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError> {
        let id = new_record_id();
        self.records
            .write()
            .await
            .insert((collection.to_string(), id.clone()), record);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn merge(&self, collection: &str, id: &str, record: Value) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&(collection.to_string(), id.to_string())) {
            Some(existing) => merge_into(existing, record),
            None => {
                records.insert((collection.to_string(), id.to_string()), record);
            }
        }
        Ok(())
    }
}

/// Store that keeps one JSON file per record: `{root}/{collection}/{id}.json`.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, collection: &str, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_key(collection) {
            return Err(StoreError::InvalidKey(collection.to_string()));
        }
        if !is_valid_key(id) {
            return Err(StoreError::InvalidKey(id.to_string()));
        }
        Ok(self.root.join(collection).join(format!("{}.json", id)))
    }

    async fn write(&self, path: &Path, record: &Value) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write then rename so readers never see a partial record.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }

    async fn read(&self, path: &Path) -> Result<Option<Value>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn create(&self, collection: &str, record: Value) -> Result<String, StoreError> {
        let id = new_record_id();
        let path = self.record_path(collection, &id)?;
        self.write(&path, &record).await?;
        tracing::debug!("Created {}/{}", collection, id);
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        // An identifier that could never have been assigned simply does not exist.
        if !is_valid_key(id) {
            return Ok(None);
        }
        let path = self.record_path(collection, id)?;
        self.read(&path).await
    }

    async fn merge(&self, collection: &str, id: &str, record: Value) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        let merged = match self.read(&path).await? {
            Some(mut existing) => {
                merge_into(&mut existing, record);
                existing
            }
            None => record,
        };
        self.write(&path, &merged).await
    }
}
