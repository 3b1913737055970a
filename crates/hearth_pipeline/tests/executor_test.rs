//! # Stage Executor Integration Tests
//!
//! Seed isolation, prerequisite propagation and failure policies.

use std::cell::Cell;
use std::convert::Infallible;

use hearth_pipeline::{PipelineError, RandomStageExecutor, SceneSeed, StageOutcome};
use rand::Rng;

fn executor(seed: u64) -> RandomStageExecutor {
    RandomStageExecutor::new(SceneSeed::new(seed), std::env::temp_dir())
}

fn half_chance(seed: u64) -> RandomStageExecutor {
    executor(seed).with_chances((0..64).map(|i| (format!("x{i}"), 0.5)))
}

/// The run/skip decision for a stage does not depend on what ran before it.
#[test]
fn test_chance_decision_is_isolated_from_call_order() {
    let mut alone = half_chance(99);
    let mut busy = half_chance(99);

    for i in 0..16 {
        let _ = busy
            .stage::<u32>(&format!("noise{i}"))
            .run(|rng| Ok::<_, Infallible>(rng.gen()));
    }

    for i in 0..64 {
        let name = format!("x{i}");
        alone.stage::<()>(&name).run_infallible(|_| ());
        busy.stage::<()>(&name).run_infallible(|_| ());
        assert_eq!(alone.outcome(&name), busy.outcome(&name), "stage {name}");
    }

    // With 64 fair draws both outcomes appear.
    let skipped = alone
        .records()
        .iter()
        .filter(|r| r.outcome == StageOutcome::SkippedChance)
        .count();
    assert!(skipped > 0 && skipped < 64);
}

/// Running the same stage twice repeats the decision.
#[test]
fn test_repeated_stage_repeats_decision() {
    let mut p = half_chance(5);
    for i in 0..64 {
        let name = format!("x{i}");
        p.stage::<()>(&name).run_infallible(|_| ());
        let first = p.outcome(&name);
        p.stage::<()>(&name).run_infallible(|_| ());
        assert_eq!(first, p.outcome(&name));
    }
}

/// The body stream is the same whether or not other stages ran first.
#[test]
fn test_body_stream_is_isolated() {
    let mut a = executor(11);
    let mut b = executor(11);
    let _ = b.stage::<u64>("other").run(|rng| Ok::<_, Infallible>(rng.gen()));

    let va = a.stage::<u64>("body").run(|rng| Ok::<_, Infallible>(rng.gen())).unwrap();
    let vb = b.stage::<u64>("body").run(|rng| Ok::<_, Infallible>(rng.gen())).unwrap();
    assert_eq!(va, vb);

    let mut outside = a.stage_rng("body");
    assert_eq!(outside.gen::<u64>(), va);
}

/// A skipped prerequisite skips dependents without calling their bodies.
#[test]
fn test_prereq_skips_propagate() {
    let mut p = executor(3).with_chances([("terrain".to_string(), 0.0)]);
    let called = Cell::new(false);

    p.stage::<u8>("terrain").run_infallible(|_| 1);
    assert_eq!(p.outcome("terrain"), Some(StageOutcome::SkippedChance));

    let height = p
        .stage("nature_backdrop")
        .use_chance(false)
        .prereq("terrain")
        .default(0.0_f64)
        .run_infallible(|_| {
            called.set(true);
            12.5
        });
    assert!(height.abs() < f64::EPSILON);
    assert!(!called.get());
    assert_eq!(p.outcome("nature_backdrop"), Some(StageOutcome::SkippedPrereq));

    p.stage::<()>("downstream")
        .prereq("nature_backdrop")
        .run_infallible(|_| called.set(true));
    assert!(!called.get());
    assert_eq!(p.outcome("downstream"), Some(StageOutcome::SkippedPrereq));
}

/// A prerequisite that ran lets dependents run.
#[test]
fn test_prereq_that_ran_allows_stage() {
    let mut p = executor(3);
    p.stage::<()>("pose_cameras").use_chance(false).run_infallible(|_| ());
    p.stage::<()>("animate_cameras")
        .use_chance(false)
        .prereq("pose_cameras")
        .run_infallible(|_| ());
    assert!(p.ran("animate_cameras"));
}

/// Failures are recorded against their stage under both policies.
#[test]
fn test_failure_policies() {
    let mut p = executor(8);

    let degraded = p
        .stage("solve_medium")
        .use_chance(false)
        .default(7u32)
        .degrade_on_failure()
        .run(|_| Err::<u32, _>("no walls"))
        .unwrap();
    assert_eq!(degraded, 7);
    let record = p.record("solve_medium").unwrap();
    assert_eq!(record.outcome, StageOutcome::FailedDefaulted);
    assert_eq!(record.error.as_deref(), Some("no walls"));

    let err = p
        .stage::<u32>("solve_rooms")
        .use_chance(false)
        .run(|_| Err::<u32, _>("no room rules"))
        .unwrap_err();
    match err {
        PipelineError::StageFailed { stage, .. } => assert_eq!(stage, "solve_rooms"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(p.outcome("solve_rooms"), Some(StageOutcome::Failed));
}

/// Records are saved as JSON and name every stage.
#[test]
fn test_save_results() {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("test_pipeline_{id}.json"));

    let mut p = executor(1);
    p.stage::<()>("terrain").use_chance(false).run_infallible(|_| ());
    p.save_results(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"terrain\""));
    assert!(text.contains("\"ran\""));
    std::fs::remove_file(&path).ok();
}
