//! # State Error Types

use std::path::PathBuf;
use thiserror::Error;

use hearth_domain::EntityKey;

/// Errors that can occur when mutating or persisting a scene state.
#[derive(Error, Debug)]
pub enum StateError {
    /// Insertion under a key that exists or existed earlier in this run.
    #[error("duplicate entity key: {0}")]
    DuplicateKey(EntityKey),

    /// The key does not name a committed entity.
    #[error("unknown entity key: {0}")]
    UnknownKey(EntityKey),

    /// Reading or writing a snapshot file failed.
    #[error("snapshot io failed for {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Snapshot encoding or decoding failed.
    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
