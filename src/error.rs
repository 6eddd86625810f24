//! Application error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Application-level errors for moviegraph.
#[derive(Error, Debug)]
pub enum AppError {
    // Source / interchange errors
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Collection {database}.{collection} does not exist")]
    CollectionNotFound {
        database: String,
        collection: String,
    },

    // Loader errors
    #[error("Invalid loader transition: {from} -> {to}")]
    InvalidState {
        from: &'static str,
        to: &'static str,
    },

    #[error("Bulk load cancelled")]
    Cancelled,

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by a destination graph store.
///
/// Kept separate from [`AppError`] so callers can tell store-side failures
/// (throttling, rejected documents) apart from generic ones.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Request throttled (retry after {retry_after:?})")]
    Throttled { retry_after: Option<Duration> },

    #[error("Document {id} rejected: {reason}")]
    Rejected { id: String, reason: String },

    #[error("Document has no id and automatic id generation is disabled")]
    MissingId,

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Bulk write cancelled")]
    Cancelled,
}

impl SinkError {
    /// Returns true if the request may succeed when retried later.
    pub fn is_throttle(&self) -> bool {
        matches!(self, SinkError::Throttled { .. })
    }

    /// The store's retry-after hint, if it sent one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SinkError::Throttled { retry_after } => *retry_after,
            _ => None,
        }
    }
}
