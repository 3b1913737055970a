//! # Composition Error Types

use std::path::PathBuf;

use thiserror::Error;

use hearth_domain::DomainError;
use hearth_pipeline::PipelineError;
use hearth_solver::SolveError;
use hearth_state::StateError;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid TOML.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// An override is not of the form `key=value`.
    #[error("invalid override `{0}`, expected key=value")]
    Override(String),

    /// The merged table does not fit the typed configuration.
    #[error("invalid configuration value: {0}")]
    Invalid(#[from] toml::de::Error),

    /// A restriction names an unknown tag.
    #[error(transparent)]
    Tag(#[from] DomainError),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a composition run.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Configuration could not be loaded or interpreted.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The constraint program is malformed.
    #[error(transparent)]
    Solve(#[from] SolveError),

    /// A fatal stage failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Scene state could not be persisted.
    #[error(transparent)]
    State(#[from] StateError),

    /// The output folder could not be created.
    #[error("cannot create output folder {path}: {source}")]
    Io {
        /// Folder that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;
