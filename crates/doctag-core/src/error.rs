//! Error types for doctag.

use thiserror::Error;

/// Result type alias using doctag's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for doctag operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    /// Upload rejected before any side effect occurred
    #[error("Validation error: {0}")]
    Validation(String),

    /// Blob storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Search index operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// Keyword extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Unique-constraint conflict on insert.
    ///
    /// Signals the tag reconciler to re-read instead of failing; this
    /// variant is consumed internally and never surfaces to callers.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that occur after the durability point and must
    /// degrade the ingestion result instead of failing it.
    pub fn is_enrichment_failure(&self) -> bool {
        matches!(self, Error::Search(_) | Error::Extraction(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
