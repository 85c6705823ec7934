//! Error types for the linear-kv workspace.
//!
//! This module provides error types using `thiserror` for the store and for
//! loading recorded histories.

use thiserror::Error;

use crate::time::Timestamp;

/// Errors returned by store operations.
///
/// Store errors are scoped to the single call that produced them and are
/// never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required argument was missing or empty.
    #[error("{0}")]
    InvalidArgument(String),
}

impl StoreError {
    /// Creates a new invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Errors that can occur while building or loading a history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Failed to serialize or deserialize history data.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write history data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation ends before it starts.
    #[error("invalid interval: end {end} precedes start {start}")]
    InvalidInterval { start: Timestamp, end: Timestamp },

    /// A record cannot be interpreted.
    #[error("corrupted history: {reason}")]
    Corrupted { reason: String },
}

impl HistoryError {
    /// Creates a new corrupted history error.
    pub fn corrupted(reason: impl Into<String>) -> Self {
        Self::Corrupted {
            reason: reason.into(),
        }
    }
}
