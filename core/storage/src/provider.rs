//! State store trait definition.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use idealista_common::{Error, Result};

/// JSON object persisted by a state store.
pub type JsonObject = Map<String, Value>;

/// Persistence backend for a single JSON document (config or token cache).
///
/// Implementations hold no lock across processes; the last writer wins.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Where the document lives. Used in messages and returned by `save`.
    fn location(&self) -> &Path;

    /// Read the stored document.
    ///
    /// # Postconditions
    /// - Returns an empty object when nothing has been stored yet
    ///
    /// # Errors
    /// - `CorruptState` if the stored content is not a JSON object
    /// - I/O errors other than "not found"
    async fn load(&self) -> Result<JsonObject>;

    /// Replace the stored document.
    ///
    /// # Postconditions
    /// - Parent directories exist
    /// - Returns the location written to
    async fn save(&self, data: &JsonObject) -> Result<PathBuf>;
}

/// Parse stored text into a JSON object, reporting problems against `path`.
pub(crate) fn parse_document(path: &Path, text: &str) -> Result<JsonObject> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::CorruptState {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::CorruptState {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, found {}", kind_of(&other)),
        }),
    }
}

/// Render a document the way it is written to disk.
pub(crate) fn render_document(data: &JsonObject) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(|e| Error::Serialization(e.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
