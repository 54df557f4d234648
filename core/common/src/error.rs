//! Common error types for the Idealista client.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for Idealista client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable API key/secret pair could be found.
    #[error(
        "Missing credentials. Set IDEALISTA_API_KEY and IDEALISTA_API_SECRET or run 'idealista config set'."
    )]
    MissingCredentials,

    /// The API answered with a terminal status, or retries were exhausted.
    ///
    /// `message` already embeds the first 500 characters of the body.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        body: Option<String>,
    },

    /// Connection-level failure (DNS, TCP, TLS, timeout) after retries.
    #[error("{0}")]
    Network(String),

    /// A persisted state file exists but cannot be read back.
    #[error("Corrupt state file {}: {reason}", path.display())]
    CorruptState { path: PathBuf, reason: String },

    /// The API answered successfully but the body was unusable.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
