//! Stage records: what happened to each named stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal state of one stage run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Not decided yet.
    Pending,
    /// The body ran and returned a value.
    Ran,
    /// The chance draw skipped the stage.
    SkippedChance,
    /// The prerequisite stage did not run.
    SkippedPrereq,
    /// The body failed and the default was substituted.
    FailedDefaulted,
    /// The body failed and the failure was propagated.
    Failed,
}

impl StageOutcome {
    /// Returns true once the stage reached a terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if the caller received the stage default.
    #[must_use]
    pub const fn used_default(self) -> bool {
        matches!(
            self,
            Self::SkippedChance | Self::SkippedPrereq | Self::FailedDefaulted
        )
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pending => "pending",
            Self::Ran => "ran",
            Self::SkippedChance => "skipped_chance",
            Self::SkippedPrereq => "skipped_prereq",
            Self::FailedDefaulted => "failed_defaulted",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Everything recorded about one stage run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Seed of the body's random stream.
    pub seed: u64,
    /// Stage that had to run first, if any.
    pub prereq: Option<String>,
    /// Probability of running.
    pub chance: f64,
    /// Whether the chance draw was made at all.
    pub use_chance: bool,
    /// Terminal state.
    pub outcome: StageOutcome,
    /// Wall-clock seconds spent in the body.
    pub duration_secs: f64,
    /// Error text of a failed body.
    pub error: Option<String>,
}
