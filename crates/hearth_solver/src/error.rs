//! # Solver Error Types

use thiserror::Error;

use hearth_state::StateError;

/// Errors that can occur while checking or solving.
#[derive(Error, Debug)]
pub enum SolveError {
    /// The stage catalog or constraint graph is malformed. Fatal to the run.
    #[error("invalid generation configuration: {}", .0.join("; "))]
    Configuration(Vec<String>),

    /// One assignment could not be solved within its step budget.
    #[error("unsatisfied constraints for {desc}: {}", .violations.join("; "))]
    Unsatisfied {
        /// Solve call description, e.g. `on_floor_3`.
        desc: String,
        /// Hard violations of the best placement found.
        violations: Vec<String>,
    },

    /// A stage name is not in the catalog.
    #[error("unknown stage `{0}`")]
    UnknownStage(String),

    /// Scene state rejected a mutation.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Result type for solver operations.
pub type SolveResult<T> = Result<T, SolveError>;
