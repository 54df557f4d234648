//! Local filesystem state store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::provider::{parse_document, render_document, JsonObject, StateStore};
use idealista_common::{Error, Result};

/// State store backed by a single JSON file.
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// an interrupted write leaves the previous file in place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store for the given file. Nothing is touched until `save`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl StateStore for FileStore {
    fn location(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<JsonObject> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => parse_document(&self.path, &text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(JsonObject::new()),
            Err(e) if e.kind() == ErrorKind::InvalidData => Err(Error::CorruptState {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, data: &JsonObject) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let text = render_document(data)?;
        let temp = self.temp_path();
        let written = match fs::write(&temp, text.as_bytes()).await {
            Ok(()) => fs::rename(&temp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // A failed write may still have created a partial temp file
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        tracing::debug!(path = %self.path.display(), "state file written");
        Ok(self.path.clone())
    }
}
