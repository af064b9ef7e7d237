//! Error types for Evidex.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The document store could not be reached, or the connection was lost.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single external record could not be turned into evidence.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),

    #[error("Invalid extraction technique: {0}")]
    InvalidTechnique(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this failure means the store itself is out of reach.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
