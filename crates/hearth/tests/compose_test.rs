//! # Composition Integration Tests
//!
//! Full headless runs: output files, stage outcomes, determinism, failure
//! policy and configuration effects.

use std::path::PathBuf;

use hearth::{
    compose_indoors, topview_pose, Collaborators, ComposeConfig, ComposeError, ComposeOutput,
    HeadlessCollaborators, RoomElement, BOTTLE_KEY, PIPELINE_FILE, SOLVE_STATE_FILE,
};
use hearth_domain::vocab::{all_room, bottom_on_floor, room_of};
use hearth_domain::{EntityKey, Semantics};
use hearth_pipeline::{BoxError, PipelineError, SceneSeed, StageOutcome, StageRecord};
use hearth_solver::check_resolved;
use hearth_state::{GeometryBackend, GeometryHandle, ProxyGeometry, SceneState};
use rand_chacha::ChaCha8Rng;

fn temp_output(name: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_compose_{name}_{id}"))
}

fn config_with(overrides: &[&str]) -> ComposeConfig {
    let mut text = String::from("solve_steps_large = 120\nsolve_steps_medium = 60\nsolve_steps_small = 30\n");
    for line in overrides {
        text.push_str(line);
        text.push('\n');
    }
    ComposeConfig::from_toml_str(&text).unwrap()
}

fn run(name: &str, seed: u64, config: &ComposeConfig) -> (ComposeOutput<ProxyGeometry>, HeadlessCollaborators, PathBuf) {
    let out_dir = temp_output(name);
    let mut collab = HeadlessCollaborators::new();
    let out = compose_indoors(&out_dir, SceneSeed::new(seed), config, ProxyGeometry::new(), &mut collab)
        .unwrap();
    (out, collab, out_dir)
}

fn outcome(records: &[StageRecord], name: &str) -> Option<StageOutcome> {
    records.iter().rev().find(|r| r.name == name).map(|r| r.outcome)
}

/// A default run writes both files and runs every mandatory stage.
#[test]
fn test_coarse_run_writes_outputs() {
    let (out, collab, dir) = run("outputs", 7, &config_with(&[]));

    let saved = SceneState::read_json(&dir.join(SOLVE_STATE_FILE)).unwrap();
    let rooms = saved.all_matching(&all_room());
    assert!(!rooms.is_empty());
    for room in &rooms {
        assert!(out.state.contains(room));
    }

    let text = std::fs::read_to_string(dir.join(PIPELINE_FILE)).unwrap();
    let records: Vec<StageRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(records, out.records);

    for stage in ["terrain", "solve_rooms", "solve_large", "solve_medium", "solve_small", "pose_cameras"] {
        assert_eq!(outcome(&records, stage), Some(StageOutcome::Ran), "{stage}");
    }
    assert!(records.iter().all(|r| r.outcome.is_terminal()));
    assert!(check_resolved(&out.state).is_empty());
    assert!(collab.called("nature_backdrop"));
    assert!(collab.called("room_walls"));

    // The house stands on the ground at z = 0; the terrain top is in [0, 0.5).
    assert!(out.height_offset >= 0.0 && out.height_offset < 0.5);
    assert!(out.whole_bbox.is_some());

    std::fs::remove_dir_all(dir).ok();
}

/// The same seed reproduces the same scene and the same stage decisions.
#[test]
fn test_same_seed_same_scene() {
    let config = config_with(&["skirting_ceiling_chance=0.5"]);
    let (a, _, dir_a) = run("determinism_a", 19, &config);
    let (b, _, dir_b) = run("determinism_b", 19, &config);

    assert_eq!(a.state.snapshot(), b.state.snapshot());
    let outcomes = |o: &ComposeOutput<ProxyGeometry>| -> Vec<(String, StageOutcome)> {
        o.records.iter().map(|r| (r.name.clone(), r.outcome)).collect()
    };
    assert_eq!(outcomes(&a), outcomes(&b));
    assert!((a.height_offset - b.height_offset).abs() < f64::EPSILON);

    std::fs::remove_dir_all(dir_a).ok();
    std::fs::remove_dir_all(dir_b).ok();
}

/// Zero-chance stages are skipped without running their body.
#[test]
fn test_zero_chance_skips_stage() {
    let (out, collab, dir) = run("chance", 3, &config_with(&["lights_off_chance=0.0"]));
    assert_eq!(outcome(&out.records, "lights_off"), Some(StageOutcome::SkippedChance));
    assert!(!collab.called("lights_off"));
    std::fs::remove_dir_all(dir).ok();
}

/// Room restrictions confine floor furniture to the chosen room type.
#[test]
fn test_restrict_parent_rooms() {
    let config = config_with(&["restrict_parent_rooms=[\"Kitchen\"]"]);
    let (out, _, dir) = run("restrict", 11, &config);
    let state = &out.state;
    let kitchens = state.all_matching(&room_of(Semantics::Kitchen));
    assert_eq!(kitchens.len(), 1);

    let on_floor = bottom_on_floor();
    for (key, spec) in state.iter() {
        if key.as_str() == BOTTLE_KEY {
            continue;
        }
        for edge in spec.relations.iter().filter(|e| e.relation == on_floor) {
            assert_eq!(edge.target, kitchens[0], "{key}");
        }
    }
    std::fs::remove_dir_all(dir).ok();
}

/// The bottle, when placed, stands on a table or surface and is followed.
#[test]
fn test_bottle_is_on_a_table() {
    let (out, _, dir) = run("bottle", 5, &config_with(&[]));
    let bottle = EntityKey::new(BOTTLE_KEY);
    if let Some(spec) = out.state.get(&bottle) {
        assert!(spec.has_tag(Semantics::FocusObject));
        let parent = out.state.parents_of(&bottle).remove(0);
        let parent_spec = out.state.get(&parent).unwrap();
        assert!(parent_spec.has_tag(Semantics::Table) || parent_spec.has_tag(Semantics::Surface));
    } else {
        assert!(out.records.iter().any(|r| r.name == "add_bottle"));
    }
    std::fs::remove_dir_all(dir).ok();
}

/// The top view frames the solved rooms and is handed to collaborators.
#[test]
fn test_topview_and_passthrough() {
    let config = config_with(&["topview=true", "topview_rot_x=30.0", "render_samples=64"]);
    let (out, collab, dir) = run("topview", 13, &config);
    assert_eq!(outcome(&out.records, "topview"), Some(StageOutcome::Ran));
    assert!(collab.called("topview"));
    assert_eq!(
        collab.extra.get("render_samples"),
        Some(&toml::Value::Integer(64))
    );
    std::fs::remove_dir_all(dir).ok();
}

/// Chance keys only reach the skirting and lights stages.
#[test]
fn test_core_stages_ignore_chance_keys() {
    let config = config_with(&[
        "solve_large_chance = 0.0",
        "overhead_cam_chance = 0.0",
        "populate_assets_chance = 0.0",
        "room_walls_chance = 0.0",
        "skirting_floor_chance = 0.0",
    ]);
    let (out, collab, dir) = run("chance_policy", 23, &config);
    for stage in ["solve_large", "overhead_cam", "populate_assets", "room_walls"] {
        assert_eq!(outcome(&out.records, stage), Some(StageOutcome::Ran), "{stage}");
    }
    let large = out.records.iter().find(|r| r.name == "solve_large").unwrap();
    assert!(!large.use_chance);
    assert_eq!(outcome(&out.records, "skirting_floor"), Some(StageOutcome::SkippedChance));
    assert!(collab.called("populate_assets"));
    assert!(!collab.called("skirting_floor"));
    std::fs::remove_dir_all(dir).ok();
}

/// The overhead camera frames the solved rooms, the top view the whole house.
#[test]
fn test_camera_framing_boxes() {
    let config = config_with(&["topview=true", "topview_rot_x=30.0", "topview_rot_z=45.0"]);
    let (out, collab, dir) = run("framing", 29, &config);

    let solved = out.solved_bbox.unwrap();
    let house = out.whole_bbox.unwrap();
    assert_eq!(collab.overhead_bbox, Some(solved));
    for axis in 0..3 {
        assert!(house.min[axis] <= solved.min[axis] && solved.max[axis] <= house.max[axis]);
    }
    assert_eq!(collab.poses.last().copied(), Some(topview_pose(&house, 30.0, 45.0)));
    std::fs::remove_dir_all(dir).ok();
}

struct NoTerrain;

impl Collaborators for NoTerrain {
    fn terrain(
        &mut self,
        _geo: &mut dyn GeometryBackend,
        _rng: &mut ChaCha8Rng,
    ) -> Result<Option<GeometryHandle>, BoxError> {
        Err("terrain service unavailable".into())
    }
}

/// A failed terrain aborts the run.
#[test]
fn test_terrain_failure_is_fatal() {
    let dir = temp_output("terrain");
    let err = compose_indoors(&dir, SceneSeed::new(1), &config_with(&[]), ProxyGeometry::new(), &mut NoTerrain)
        .unwrap_err();
    match err {
        ComposeError::Pipeline(PipelineError::StageFailed { stage, .. }) => assert_eq!(stage, "terrain"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.join(SOLVE_STATE_FILE).exists());
    std::fs::remove_dir_all(dir).ok();
}

#[derive(Default)]
struct BrokenWalls {
    inner: HeadlessCollaborators,
}

impl Collaborators for BrokenWalls {
    fn terrain(
        &mut self,
        geo: &mut dyn GeometryBackend,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<GeometryHandle>, BoxError> {
        self.inner.terrain(geo, rng)
    }

    fn decorate_room(
        &mut self,
        geo: &mut dyn GeometryBackend,
        element: RoomElement,
        handles: &[GeometryHandle],
        rng: &mut ChaCha8Rng,
    ) -> Result<(), BoxError> {
        if element == RoomElement::Walls {
            return Err("wall materials missing".into());
        }
        self.inner.decorate_room(geo, element, handles, rng)
    }
}

/// A failed decoration stage degrades and the run still completes.
#[test]
fn test_decoration_failure_degrades() {
    let dir = temp_output("walls");
    let mut collab = BrokenWalls::default();
    let out = compose_indoors(&dir, SceneSeed::new(2), &config_with(&[]), ProxyGeometry::new(), &mut collab)
        .unwrap();

    let walls = out.records.iter().find(|r| r.name == "room_walls").unwrap();
    assert_eq!(walls.outcome, StageOutcome::FailedDefaulted);
    assert!(walls.error.as_deref().unwrap().contains("wall materials"));
    assert_eq!(outcome(&out.records, "room_floors"), Some(StageOutcome::Ran));
    assert!(collab.inner.called("room_floors"));

    // The default camera hooks do nothing and still count as ran.
    assert_eq!(outcome(&out.records, "animate_cameras"), Some(StageOutcome::Ran));
    assert!(dir.join(SOLVE_STATE_FILE).exists());
    std::fs::remove_dir_all(dir).ok();
}
