//! # Random Stage Executor
//!
//! Runs named stages in call order. Per stage:
//!
//! 1. If a prerequisite is named and it did not `Ran`, the stage is
//!    `SkippedPrereq` and returns its default.
//! 2. If chance is used, a draw from the `(seed, name, CHANCE_PURPOSE)` stream
//!    decides whether to run; a miss is `SkippedChance` and returns the default.
//! 3. Otherwise the body runs with the `(seed, name, BODY_PURPOSE)` stream and
//!    is timed. Success is `Ran`. Failure is `FailedDefaulted` (default
//!    returned) if the stage may degrade, else `Failed` (error returned).
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut p = RandomStageExecutor::new(SceneSeed::new(1), "out")
//!     .with_chances([("lights_off".to_string(), 0.5)]);
//!
//! p.stage::<()>("lights_off").run(|_rng| lights_off())?;
//! assert!(p.outcome("lights_off").is_some());
//! ```

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use crate::error::{BoxError, PipelineError, PipelineResult};
use crate::record::{StageOutcome, StageRecord};
use crate::seed::{SceneSeed, BODY_PURPOSE, CHANCE_PURPOSE};

/// Sequential executor of named, seeded stages.
#[derive(Debug)]
pub struct RandomStageExecutor {
    seed: SceneSeed,
    output_folder: PathBuf,
    chances: BTreeMap<String, f64>,
    records: Vec<StageRecord>,
}

impl RandomStageExecutor {
    /// Creates an executor for one scene.
    #[must_use]
    pub fn new(seed: SceneSeed, output_folder: impl Into<PathBuf>) -> Self {
        Self {
            seed,
            output_folder: output_folder.into(),
            chances: BTreeMap::new(),
            records: Vec::new(),
        }
    }

    /// Sets per-stage run probabilities. Stages not listed always run.
    #[must_use]
    pub fn with_chances(mut self, chances: impl IntoIterator<Item = (String, f64)>) -> Self {
        self.chances.extend(chances);
        self
    }

    /// Scene seed.
    #[must_use]
    pub const fn seed(&self) -> SceneSeed {
        self.seed
    }

    /// Folder stage outputs are written to.
    #[must_use]
    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Configured probability of running `name`.
    #[must_use]
    pub fn chance(&self, name: &str) -> f64 {
        self.chances.get(name).copied().unwrap_or(1.0).clamp(0.0, 1.0)
    }

    /// Starts configuring a stage.
    pub fn stage<T>(&mut self, name: &str) -> StageBuilder<'_, T> {
        StageBuilder {
            exec: self,
            name: name.to_string(),
            use_chance: true,
            prereq: None,
            default: None,
            degrade: false,
        }
    }

    /// Runs a stage with default options (chance used, no prerequisite,
    /// failures propagated).
    ///
    /// # Errors
    ///
    /// Returns `StageFailed` if the body fails.
    pub fn run_stage<T, E, F>(&mut self, name: &str, f: F) -> PipelineResult<T>
    where
        T: Default,
        E: Into<BoxError>,
        F: FnOnce(&mut ChaCha8Rng) -> Result<T, E>,
    {
        self.stage(name).run(f)
    }

    /// The body stream of `name`, for choices made outside the stage body
    /// that must agree with it.
    #[must_use]
    pub fn stage_rng(&self, name: &str) -> ChaCha8Rng {
        self.seed.rng(name, BODY_PURPOSE)
    }

    /// Every record, in run order.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Latest record of `name`.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&StageRecord> {
        self.records.iter().rev().find(|r| r.name == name)
    }

    /// Latest outcome of `name`.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<StageOutcome> {
        self.record(name).map(|r| r.outcome)
    }

    /// Returns true if the latest run of `name` ran successfully.
    #[must_use]
    pub fn ran(&self, name: &str) -> bool {
        self.outcome(name) == Some(StageOutcome::Ran)
    }

    /// Text table of every stage's outcome and duration.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<32} {:<18} {:>10}", "stage", "outcome", "seconds");
        for r in &self.records {
            let _ = writeln!(
                out,
                "{:<32} {:<18} {:>10.3}",
                r.name,
                r.outcome.to_string(),
                r.duration_secs
            );
        }
        let total: f64 = self.records.iter().map(|r| r.duration_secs).sum();
        let _ = writeln!(out, "{:<32} {:<18} {:>10.3}", "TOTAL", "", total);
        out
    }

    /// Logs one line per stage.
    pub fn log_summary(&self) {
        for r in &self.records {
            info!(
                stage = %r.name,
                outcome = %r.outcome,
                seconds = r.duration_secs,
                "stage summary"
            );
        }
    }

    /// Writes every record as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save_results(&self, path: &Path) -> PipelineResult<()> {
        let text = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, text).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), stages = self.records.len(), "saved stage records");
        Ok(())
    }
}

/// Options of one stage run. Nothing happens until `run`.
#[must_use = "a stage does nothing until `run` is called"]
pub struct StageBuilder<'a, T> {
    exec: &'a mut RandomStageExecutor,
    name: String,
    use_chance: bool,
    prereq: Option<String>,
    default: Option<T>,
    degrade: bool,
}

impl<T> StageBuilder<'_, T> {
    /// Whether to draw against the configured chance (default true).
    pub fn use_chance(mut self, use_chance: bool) -> Self {
        self.use_chance = use_chance;
        self
    }

    /// Stage that must have run for this one to run.
    pub fn prereq(mut self, name: &str) -> Self {
        self.prereq = Some(name.to_string());
        self
    }

    /// Value returned when the stage is skipped or degrades
    /// (`T::default()` if unset).
    pub fn default(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    /// Substitute the default instead of propagating a body failure.
    pub fn degrade_on_failure(mut self) -> Self {
        self.degrade = true;
        self
    }

    /// Runs the stage.
    ///
    /// # Errors
    ///
    /// Returns `StageFailed` if the body fails and the stage may not degrade.
    pub fn run<E, F>(self, f: F) -> PipelineResult<T>
    where
        T: Default,
        E: Into<BoxError>,
        F: FnOnce(&mut ChaCha8Rng) -> Result<T, E>,
    {
        let Self {
            exec,
            name,
            use_chance,
            prereq,
            default,
            degrade,
        } = self;

        let chance = if use_chance { exec.chance(&name) } else { 1.0 };
        exec.records.push(StageRecord {
            name: name.clone(),
            seed: exec.seed.derive(&name, BODY_PURPOSE),
            prereq: prereq.clone(),
            chance,
            use_chance,
            outcome: StageOutcome::Pending,
            duration_secs: 0.0,
            error: None,
        });
        let index = exec.records.len() - 1;

        if let Some(pre) = &prereq {
            if !exec.ran(pre) {
                info!(stage = %name, prereq = %pre, "skipping stage, prerequisite did not run");
                exec.records[index].outcome = StageOutcome::SkippedPrereq;
                return Ok(default.unwrap_or_default());
            }
        }

        if use_chance {
            let draw: f64 = exec.seed.rng(&name, CHANCE_PURPOSE).gen();
            if draw >= chance {
                info!(stage = %name, chance, "skipping stage by chance");
                exec.records[index].outcome = StageOutcome::SkippedChance;
                return Ok(default.unwrap_or_default());
            }
        }

        info!(stage = %name, "running stage");
        let mut rng = exec.seed.rng(&name, BODY_PURPOSE);
        let start = Instant::now();
        let result = f(&mut rng);
        let elapsed = start.elapsed();
        exec.records[index].duration_secs = elapsed.as_secs_f64();

        match result {
            Ok(value) => {
                debug!(stage = %name, seconds = elapsed.as_secs_f64(), "stage finished");
                exec.records[index].outcome = StageOutcome::Ran;
                Ok(value)
            }
            Err(err) => {
                let source: BoxError = err.into();
                exec.records[index].error = Some(source.to_string());
                if degrade {
                    warn!(stage = %name, error = %source, "stage failed, using default");
                    exec.records[index].outcome = StageOutcome::FailedDefaulted;
                    Ok(default.unwrap_or_default())
                } else {
                    error!(stage = %name, error = %source, "stage failed");
                    exec.records[index].outcome = StageOutcome::Failed;
                    Err(PipelineError::StageFailed {
                        stage: name,
                        elapsed,
                        source,
                    })
                }
            }
        }
    }

    /// Runs a body that cannot fail.
    pub fn run_infallible<F>(self, f: F) -> T
    where
        T: Default,
        F: FnOnce(&mut ChaCha8Rng) -> T,
    {
        match self.run(|rng| Ok::<T, Infallible>(f(rng))) {
            Ok(value) => value,
            Err(_) => T::default(),
        }
    }
}
