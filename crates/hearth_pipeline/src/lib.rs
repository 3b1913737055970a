//! # HEARTH Stage Pipeline
//!
//! Runs named generation stages with reproducible per-stage randomness.
//!
//! ## Design Principles
//!
//! 1. **Seed isolation** - A stage's random stream is derived from
//!    `(scene seed, stage name)` and nothing else
//! 2. **Explicit state machine** - Every stage ends as `Ran`, `SkippedChance`,
//!    `SkippedPrereq`, `FailedDefaulted` or `Failed`
//! 3. **Caller-chosen failure policy** - A stage either degrades to its
//!    default or aborts the run, and is recorded either way
//! 4. **Queryable afterwards** - Outcomes and durations stay available
//!
//! ## Example
//!
//! ```rust,ignore
//! use hearth_pipeline::{RandomStageExecutor, SceneSeed};
//!
//! let mut p = RandomStageExecutor::new(SceneSeed::new(42), &output_folder);
//!
//! let terrain = p
//!     .stage("terrain")
//!     .use_chance(false)
//!     .degrade_on_failure()
//!     .run(|rng| build_terrain(rng))?;
//!
//! let height = p
//!     .stage("nature_backdrop")
//!     .prereq("terrain")
//!     .default(0.0)
//!     .run(|rng| backdrop(&terrain, rng))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod executor;
pub mod record;
pub mod seed;

pub use error::{BoxError, PipelineError, PipelineResult};
pub use executor::{RandomStageExecutor, StageBuilder};
pub use record::{StageOutcome, StageRecord};
pub use seed::{SceneSeed, CHANCE_PURPOSE, BODY_PURPOSE};
