//! # Pipeline Error Types

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Boxed error raised by a stage body.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while running stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage body failed and the stage was not allowed to degrade.
    #[error("stage `{stage}` failed after {elapsed:?}: {source}")]
    StageFailed {
        /// Stage name.
        stage: String,
        /// Time spent in the body before it failed.
        elapsed: Duration,
        /// The body's error.
        source: BoxError,
    },

    /// A seed string could not be parsed.
    #[error("invalid scene seed `{0}`")]
    InvalidSeed(String),

    /// Writing stage records failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Stage records could not be encoded.
    #[error("stage record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
