//! Persisted API credentials.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::local::FileStore;
use crate::paths::StateDirs;
use crate::provider::{JsonObject, StateStore};
use idealista_common::{Credentials, Result};

/// Credential halves found in the config file. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

/// Typed access to the credentials config file.
#[derive(Clone)]
pub struct ConfigStore {
    store: Arc<dyn StateStore>,
}

impl ConfigStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// File-backed store at the standard config location.
    pub fn open(dirs: &StateDirs) -> Self {
        Self::new(Arc::new(FileStore::new(dirs.config_file())))
    }

    pub fn path(&self) -> &Path {
        self.store.location()
    }

    /// Read stored credentials. A missing file yields empty credentials.
    ///
    /// Non-string or empty values are treated as missing.
    pub async fn load(&self) -> Result<StoredCredentials> {
        let data = self.store.load().await?;
        Ok(StoredCredentials {
            api_key: non_empty(&data, "api_key"),
            api_secret: non_empty(&data, "api_secret"),
        })
    }

    /// Persist `credentials`, replacing the whole file.
    pub async fn save(&self, credentials: &Credentials) -> Result<PathBuf> {
        let mut data = JsonObject::new();
        data.insert(
            "api_key".to_string(),
            Value::String(credentials.api_key.clone()),
        );
        data.insert(
            "api_secret".to_string(),
            Value::String(credentials.api_secret.clone()),
        );
        self.store.save(&data).await
    }
}

fn non_empty(data: &JsonObject, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use idealista_common::Error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_config_is_empty() {
        let config = ConfigStore::new(Arc::new(MemoryStore::new("config")));
        assert_eq!(config.load().await.unwrap(), StoredCredentials::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let config = ConfigStore::new(Arc::new(MemoryStore::new("config")));
        let creds = Credentials::new("key", "secret").unwrap();

        config.save(&creds).await.unwrap();
        let stored = config.load().await.unwrap();

        assert_eq!(stored.api_key.as_deref(), Some("key"));
        assert_eq!(stored.api_secret.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_partial_config() {
        let store = MemoryStore::with_contents("config", r#"{"api_secret": "s", "api_key": ""}"#);
        let config = ConfigStore::new(Arc::new(store));

        let stored = config.load().await.unwrap();
        assert_eq!(stored.api_key, None);
        assert_eq!(stored.api_secret.as_deref(), Some("s"));
    }

    #[tokio::test]
    async fn test_corrupt_config_propagates() {
        let store = MemoryStore::with_contents("config", "api_key=k");
        let config = ConfigStore::new(Arc::new(store));

        assert!(matches!(
            config.load().await,
            Err(Error::CorruptState { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_uses_config_home() {
        let temp = TempDir::new().unwrap();
        let dirs = StateDirs::new(temp.path().join("cfg"), temp.path().join("cache"));
        let config = ConfigStore::open(&dirs);

        let path = config
            .save(&Credentials::new("k", "s").unwrap())
            .await
            .unwrap();

        assert_eq!(path, temp.path().join("cfg/idealista-cli/config.json"));
        assert!(path.exists());
    }
}
