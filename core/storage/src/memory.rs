//! In-memory state store for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::provider::{parse_document, render_document, JsonObject, StateStore};
use idealista_common::Result;

/// In-memory state store.
///
/// Keeps the document as the same text a file would hold, so corrupt content
/// can be simulated and is reported exactly like a bad file.
pub struct MemoryStore {
    location: PathBuf,
    contents: RwLock<Option<String>>,
    writes: RwLock<usize>,
}

impl MemoryStore {
    /// Create an empty store. `name` only shows up in paths and messages.
    pub fn new(name: &str) -> Self {
        Self {
            location: PathBuf::from(format!("memory://{}", name)),
            contents: RwLock::new(None),
            writes: RwLock::new(0),
        }
    }

    /// Create a store that already holds `text`.
    pub fn with_contents(name: &str, text: impl Into<String>) -> Self {
        let store = Self::new(name);
        *store.contents.write().unwrap_or_else(|e| e.into_inner()) = Some(text.into());
        store
    }

    /// Current raw contents, if anything was stored.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of successful `save` calls.
    pub fn writes(&self) -> usize {
        *self.writes.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    fn location(&self) -> &Path {
        &self.location
    }

    async fn load(&self) -> Result<JsonObject> {
        match self.contents() {
            Some(text) => parse_document(&self.location, &text),
            None => Ok(JsonObject::new()),
        }
    }

    async fn save(&self, data: &JsonObject) -> Result<PathBuf> {
        let text = render_document(data)?;
        *self.contents.write().unwrap_or_else(|e| e.into_inner()) = Some(text);
        *self.writes.write().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(self.location.clone())
    }
}
