//! Centralized error types for mailsindex.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailsindex library.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The corpus walk failed on a directory entry.
    #[error("Failed to walk corpus: {0}")]
    Walk(#[from] walkdir::Error),

    /// The raw bytes are not a structurally valid RFC 822 message.
    #[error("Malformed message: {reason}")]
    Parse { reason: String },

    /// The message body could not be read.
    #[error("Failed to read message body: {source}")]
    BodyRead { source: std::io::Error },

    /// The `Date:` header is missing or not a recognizable date.
    #[error("Unparsable Date header: '{value}'")]
    DateParse { value: String },

    /// The index service could not be reached.
    #[error("{method} {url} failed: {reason}")]
    Transport {
        method: String,
        url: String,
        reason: String,
    },

    /// The index service answered with a status the pipeline cannot act on.
    #[error("{method} {url} returned unexpected status {status}: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// A request body could not be serialized.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration is missing, unreadable or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An invalid path was provided.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Convenience alias for `Result<T, IndexerError>`.
pub type Result<T> = std::result::Result<T, IndexerError>;

impl IndexerError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only concerns a single message file.
    ///
    /// Recoverable errors make the ingestion driver skip the file and carry on;
    /// everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::BodyRead { .. } | Self::DateParse { .. }
        )
    }
}
