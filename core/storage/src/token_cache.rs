//! Persisted OAuth token.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::local::FileStore;
use crate::paths::StateDirs;
use crate::provider::StateStore;
use idealista_common::{Result, TokenRecord};

/// Typed access to the token cache file.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn StateStore>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// File-backed cache at the standard cache location.
    pub fn open(dirs: &StateDirs) -> Self {
        Self::new(Arc::new(FileStore::new(dirs.token_file())))
    }

    pub fn path(&self) -> &Path {
        self.store.location()
    }

    /// Read the cached token.
    ///
    /// Returns `None` when the cache is empty or holds no access token.
    ///
    /// # Errors
    /// - `CorruptState` if the cache file is unreadable
    pub async fn load(&self) -> Result<Option<TokenRecord>> {
        let data = self.store.load().await?;
        Ok(TokenRecord::from_cached(data))
    }

    /// Replace the cached token.
    pub async fn save(&self, record: &TokenRecord) -> Result<PathBuf> {
        self.store.save(&record.to_map()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::{json, Map};

    #[tokio::test]
    async fn test_empty_cache_is_miss() {
        let cache = TokenCache::new(Arc::new(MemoryStore::new("token")));
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_roundtrip_keeps_provider_fields() {
        let store = Arc::new(MemoryStore::new("token"));
        let cache = TokenCache::new(store.clone());

        let mut extra = Map::new();
        extra.insert("token_type".to_string(), json!("bearer"));
        let record = TokenRecord {
            access_token: "abc".to_string(),
            expires_in: 3600,
            expires_at: 5000,
            extra,
        };

        cache.save(&record).await.unwrap();

        let raw: serde_json::Value = serde_json::from_str(&store.contents().unwrap()).unwrap();
        assert_eq!(raw["token_type"], "bearer");
        assert_eq!(raw["expires_at"], 5000);

        assert_eq!(cache.load().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_record_without_token_is_miss() {
        let store = MemoryStore::with_contents("token", r#"{"expires_at": 99999999999}"#);
        let cache = TokenCache::new(Arc::new(store));
        assert!(cache.load().await.unwrap().is_none());
    }
}
