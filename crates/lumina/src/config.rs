//! Configuration file (lumina.toml).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use lumina_gateway::{GeminiConfig, GeminiGateway};
use lumina_store::{DirCache, FileDocumentStore, HistoryStore};

#[derive(Debug, Deserialize, Default)]
pub struct LuminaConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub gateway: GatewaySection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub open: bool,
    /// Base of public links
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct GatewaySection {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open: false,
            public_url: default_public_url(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8787
}
fn default_public_url() -> String {
    "http://127.0.0.1:8787".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from(".lumina")
}
fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}
fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

impl LuminaConfig {
    /// Load configuration if the file exists.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn documents(&self) -> Arc<FileDocumentStore> {
        Arc::new(FileDocumentStore::new(self.storage.data_dir.join("documents")))
    }

    pub fn history(&self) -> HistoryStore {
        HistoryStore::new(Arc::new(DirCache::new(self.storage.data_dir.join("cache"))))
    }

    /// The API key, read from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.gateway.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn gateway(&self, api_key: String) -> GeminiGateway {
        GeminiGateway::new(GeminiConfig {
            endpoint: self.gateway.endpoint.clone(),
            model: self.gateway.model.clone(),
            api_key,
        })
    }
}

pub const DEFAULT_CONFIG: &str = r#"# Lumina Configuration

[server]
host = "127.0.0.1"
port = 8787

# Open a browser when the server starts
open = false

# Base of public links (?p={id} is appended)
public_url = "http://127.0.0.1:8787"

[storage]
# Documents, accounts and history caches
data_dir = ".lumina"

[gateway]
model = "gemini-3-pro-preview"
endpoint = "https://generativelanguage.googleapis.com/v1beta"

# Environment variable holding the API key. Never put the key itself here.
api_key_env = "GEMINI_API_KEY"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_defaults() {
        let temp = TempDir::new().unwrap();

        let config = LuminaConfig::load(&temp.path().join("lumina.toml")).unwrap();

        assert_eq!(config.server.port, 8787);
        assert_eq!(config.server.public_url, "http://127.0.0.1:8787");
        assert_eq!(config.storage.data_dir, PathBuf::from(".lumina"));
        assert_eq!(config.gateway.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lumina.toml");
        fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = LuminaConfig::load(&path).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.gateway.model, "gemini-3-pro-preview");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lumina.toml");
        fs::write(&path, "[server\nport = ").unwrap();

        assert!(LuminaConfig::load(&path).is_err());
    }

    #[test]
    fn default_file_parses_to_defaults() {
        let config: LuminaConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = LuminaConfig::default();

        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.storage.data_dir, defaults.storage.data_dir);
        assert_eq!(config.gateway.endpoint, defaults.gateway.endpoint);
    }
}
