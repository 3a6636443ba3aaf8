//! Error types for chatmon-core

use thiserror::Error;

/// Main error type for the chatmon-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error for archive payloads
    #[error("parse error in {format} archive: {message}")]
    Parse { format: String, message: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a parse failure in a named archive format.
    pub fn parse(format: &str, message: impl Into<String>) -> Self {
        Error::Parse {
            format: format.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for chatmon-core
pub type Result<T> = std::result::Result<T, Error>;
