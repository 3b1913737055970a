//! # Indoor Composition
//!
//! Sequences every stage of one indoor scene through a `RandomStageExecutor`.
//!
//! ## Stage Order
//!
//! ```text
//! terrain → sky_lighting → checks + restrictions → solve_rooms
//!   → solve_large → add_bottle → spawn/pose/animate cameras
//!   → populate_intermediate_pholders → solve_medium → solve_small
//!   → populate_assets → room elements → solve_state.json
//!   → lights_off → invisible_room_ceilings → overhead_cam
//!   → hide_other_rooms → nature_backdrop → topview
//! ```
//!
//! ## Failure Policy
//!
//! | Stage | On failure |
//! |---|---|
//! | `terrain`, `solve_rooms` | abort the run |
//! | checks, restrictions | abort the run |
//! | solve stages | keep what was committed, continue |
//! | everything else | default, continue |
//!
//! Only `skirting_floor`, `skirting_ceiling` and `lights_off` draw against a
//! configured `<stage>_chance`; every other stage always runs.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use hearth_domain::vocab::{all_obj, all_room, bottom_on_top, obj_of, on};
use hearth_domain::{Domain, EntityKey, Semantics, Subpart, TagSet, VariableTag};
use hearth_pipeline::{BoxError, RandomStageExecutor, SceneSeed, StageRecord};
use hearth_solver::catalog::{
    ALL_VARS, OBJ_ONTOP_OBJ, OBJ_ON_SUPPORT, ON_CEILING, ON_FLOOR, ON_WALL, ROOMS, SIDE_OBJ,
};
use hearth_solver::{
    check_all, check_resolved, default_greedy_stages, geometry_of, home_constraints,
    iterate_assignments, restrict_solving, room_keys, AssignmentLimits, ConstraintGraph,
    SolveResult, Solver, StageCatalog,
};
use hearth_state::{
    BoundingBox, GeometryBackend, GeometryHandle, ObjectSpec, SceneState, StateError,
};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::camera::topview_pose;
use crate::collaborators::{Collaborators, RoomElement};
use crate::config::ComposeConfig;
use crate::error::{ComposeError, ComposeResult};

/// Snapshot file written after decoration.
pub const SOLVE_STATE_FILE: &str = "solve_state.json";

/// Stage record file written at the end of the run.
pub const PIPELINE_FILE: &str = "pipeline_coarse.json";

/// Key of the focus bottle.
pub const BOTTLE_KEY: &str = "focus_bottle";

/// Bottle proxy size, metres.
const BOTTLE_SIZE: [f64; 3] = [0.08, 0.08, 0.3];

/// Objects with a shorter bounding diagonal count as small.
const SMALL_DIAGONAL: f64 = 1.0;

/// What a composition run leaves behind.
#[derive(Debug)]
pub struct ComposeOutput<G> {
    /// Vertical offset that puts the house on the terrain.
    pub height_offset: f64,
    /// Box around every room.
    pub whole_bbox: Option<BoundingBox>,
    /// Box around the rooms furnished by `solve_large`.
    pub solved_bbox: Option<BoundingBox>,
    /// Final scene state.
    pub state: SceneState,
    /// Record of every stage, in run order.
    pub records: Vec<StageRecord>,
    /// Geometry backend holding every mesh of the scene.
    pub backend: G,
}

/// One granularity of greedy solving.
struct SolveLevel<'a> {
    stages: &'a [&'a str],
    n_steps: usize,
    abort: bool,
    nonempty: bool,
}

/// Composes one indoor scene into `output_folder`.
///
/// # Errors
///
/// Returns an error if the constraint program is malformed, the
/// configuration names unknown tags, a fatal stage fails, or an output file
/// cannot be written. Non-fatal stage failures only degrade the scene.
#[allow(clippy::too_many_lines)]
pub fn compose_indoors<G, C>(
    output_folder: &Path,
    seed: SceneSeed,
    config: &ComposeConfig,
    backend: G,
    collab: &mut C,
) -> ComposeResult<ComposeOutput<G>>
where
    G: GeometryBackend,
    C: Collaborators + ?Sized,
{
    fs::create_dir_all(output_folder).map_err(|source| ComposeError::Io {
        path: output_folder.to_path_buf(),
        source,
    })?;
    info!(seed = seed.value(), output = %output_folder.display(), "composing indoor scene");

    let mut p = RandomStageExecutor::new(seed, output_folder).with_chances(config.stage_chances());
    let mut solver = Solver::new(backend, seed);
    collab.passthrough(&config.passthrough());

    let terrain: Option<GeometryHandle> = p
        .stage("terrain")
        .use_chance(false)
        .run(|rng| collab.terrain(solver.backend_mut(), rng))?;
    p.stage::<()>("sky_lighting")
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| collab.sky_lighting(solver.backend_mut(), rng))?;

    let (catalog, graph, limits) = build_program(&p, config)?;

    let rooms_domain = catalog.get(ROOMS)?.clone();
    let mut state: SceneState = p
        .stage("solve_rooms")
        .use_chance(false)
        .run(|_| solver.solve_rooms(&graph, &rooms_domain))?;

    let large = SolveLevel {
        stages: &[ON_FLOOR],
        n_steps: config.solve_steps_large,
        abort: config.abort_unsatisfied_large,
        nonempty: true,
    };
    p.stage::<usize>("solve_large")
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| solve_level(&mut solver, &mut state, &graph, &catalog, &limits, &large, rng))?;

    // Same stream as the first enumeration of `solve_large`. Unbound room
    // variables are dropped below, so `nonempty` does not change the list.
    let solved_rooms: Vec<EntityKey> = iterate_assignments(
        catalog.get(ON_FLOOR)?,
        &state,
        &[VariableTag::Room],
        &limits,
        false,
        &mut p.stage_rng("solve_large"),
    )?
    .filter_map(|a| a.get(VariableTag::Room).cloned())
    .collect();
    let solved_bbox = bbox_of(solver.backend(), &state, &solved_rooms);
    let house_bbox = bbox_of(solver.backend(), &state, &room_keys(&state));
    info!(solved = solved_rooms.len(), "solved rooms");

    let bottle: Option<EntityKey> = if config.add_bottle {
        p.stage("add_bottle")
            .use_chance(false)
            .degrade_on_failure()
            .run(|rng| add_bottle(&mut solver, &mut state, &solved_rooms, rng))?
    } else {
        None
    };

    let cameras: Vec<GeometryHandle> = p
        .stage("spawn_cameras")
        .use_chance(false)
        .degrade_on_failure()
        .run(|_| collab.spawn_cameras(solver.backend_mut()))?;
    p.stage::<()>("pose_cameras").use_chance(false).degrade_on_failure().run(|rng| {
        let floor = floor_surface(solver.backend_mut(), &state, &solved_rooms);
        collab.pose_cameras(solver.backend_mut(), &cameras, floor, solved_bbox, rng)
    })?;

    let focus = bottle.as_ref().filter(|_| config.focus_on_bottle);
    let follow = object_to_follow(solver.backend(), &state, focus, &mut p.stage_rng("object_to_follow"));
    let follow_handle = follow.as_ref().and_then(|k| state.get(k)).and_then(|s| s.geometry);
    debug!(follow = ?follow, "camera target");
    p.stage::<()>("animate_cameras")
        .prereq("pose_cameras")
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| collab.animate_cameras(solver.backend_mut(), &cameras, solved_bbox, follow_handle, rng))?;

    p.stage::<()>("visibility_mode").use_chance(false).run_infallible(|_| {
        for handle in geometry_of(&state, &all_room()) {
            solver.backend_mut().set_hidden(handle, false);
        }
    });

    let placeholders: usize = p
        .stage("populate_intermediate_pholders")
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| {
            let filter = Some(Semantics::AssetPlaceholderForChildren);
            collab.populate_placeholders(&state, solver.backend_mut(), filter, false, rng)
        })?;
    debug!(placeholders, "populated intermediate placeholders");

    let medium = SolveLevel {
        stages: &[ON_WALL, ON_CEILING, SIDE_OBJ],
        n_steps: config.solve_steps_medium,
        abort: config.abort_unsatisfied_medium,
        nonempty: false,
    };
    p.stage::<usize>("solve_medium")
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| solve_level(&mut solver, &mut state, &graph, &catalog, &limits, &medium, rng))?;

    let small = SolveLevel {
        stages: &[OBJ_ONTOP_OBJ, OBJ_ON_SUPPORT],
        n_steps: config.solve_steps_small,
        abort: config.abort_unsatisfied_small,
        nonempty: false,
    };
    p.stage::<usize>("solve_small")
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| solve_level(&mut solver, &mut state, &graph, &catalog, &limits, &small, rng))?;

    let unresolved = check_resolved(&state);
    if !unresolved.is_empty() {
        warn!(count = unresolved.len(), "objects without a parent after solving");
    }

    let assets: usize = p
        .stage("populate_assets")
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| collab.populate_placeholders(&state, solver.backend_mut(), None, true, rng))?;
    debug!(assets, "populated assets");

    let rooms = geometry_of(&state, &all_room());
    let doors = geometry_of(&state, &Domain::new(Semantics::Door));
    let windows = geometry_of(&state, &Domain::new(Semantics::Window));
    let stairs = geometry_of(&state, &Domain::new(Semantics::Stairs));
    decorate(&mut p, &mut solver, collab, RoomElement::Doors, &doors)?;
    decorate(&mut p, &mut solver, collab, RoomElement::Windows, &windows)?;
    decorate(&mut p, &mut solver, collab, RoomElement::Stairs, &stairs)?;
    decorate(&mut p, &mut solver, collab, RoomElement::SkirtingFloor, &rooms)?;
    decorate(&mut p, &mut solver, collab, RoomElement::SkirtingCeiling, &rooms)?;
    decorate_faces(&mut p, &mut solver, collab, RoomElement::Walls, &rooms, Subpart::Wall)?;
    decorate(&mut p, &mut solver, collab, RoomElement::Pillars, &rooms)?;
    decorate_faces(&mut p, &mut solver, collab, RoomElement::Floors, &rooms, Subpart::Floor)?;
    let ceilings =
        decorate_faces(&mut p, &mut solver, collab, RoomElement::Ceilings, &rooms, Subpart::Ceiling)?;

    state.write_json(&output_folder.join(SOLVE_STATE_FILE))?;

    p.stage::<()>("lights_off")
        .degrade_on_failure()
        .run(|rng| collab.lights_off(solver.backend_mut(), rng))?;

    p.stage::<()>("invisible_room_ceilings").use_chance(false).run_infallible(|_| {
        let lights = geometry_of(&state, &obj_of(Semantics::CeilingLight));
        for handle in ceilings.iter().chain(&lights) {
            solver.backend_mut().set_hidden(*handle, true);
        }
    });

    p.stage::<()>("overhead_cam")
        .use_chance(false)
        .degrade_on_failure()
        .run(|_| -> Result<(), BoxError> {
            let bbox = solved_bbox.ok_or("no solved rooms to frame")?;
            collab.overhead_camera(solver.backend_mut(), cameras.first().copied(), bbox)
        })?;

    let hidden: usize = p
        .stage("hide_other_rooms")
        .use_chance(false)
        .run_infallible(|_| hide_other_rooms(solver.backend_mut(), &state, &solved_rooms));
    debug!(hidden, "hid entities outside the solved rooms");

    let height_offset: f64 = p
        .stage("nature_backdrop")
        .prereq("terrain")
        .default(0.0)
        .use_chance(false)
        .degrade_on_failure()
        .run(|rng| -> Result<f64, BoxError> {
            let (Some(terrain), Some(bbox)) = (terrain, house_bbox) else {
                return Ok(0.0);
            };
            collab.nature_backdrop(solver.backend_mut(), terrain, bbox, rng)
        })?;

    if config.topview {
        p.stage::<()>("topview")
            .use_chance(false)
            .degrade_on_failure()
            .run(|_| -> Result<(), BoxError> {
                let bbox = house_bbox.ok_or("no rooms to frame")?;
                let pose = topview_pose(&bbox, config.topview_rot_x, config.topview_rot_z);
                for handle in &ceilings {
                    solver.backend_mut().set_hidden(*handle, true);
                }
                collab.topview(solver.backend_mut(), cameras.first().copied(), pose, config.alpha_walls)
            })?;
    }

    p.save_results(&output_folder.join(PIPELINE_FILE))?;
    p.log_summary();
    info!(height_offset, entities = state.len(), "composition finished");

    Ok(ComposeOutput {
        height_offset,
        whole_bbox: house_bbox,
        solved_bbox,
        state,
        records: p.records().to_vec(),
        backend: solver.into_backend(),
    })
}

/// Checks the default program, then narrows it by the configured
/// restrictions.
fn build_program(
    p: &RandomStageExecutor,
    config: &ComposeConfig,
) -> ComposeResult<(StageCatalog, ConstraintGraph, AssignmentLimits)> {
    let graph = home_constraints();
    let catalog = default_greedy_stages();
    check_all(&graph, &catalog, &ALL_VARS)?;

    let mut restrictions = config.restrictions()?;
    if config.restrict_single_supported_roomtype {
        let mut rng = p.stage_rng("restrict_single_supported_roomtype");
        if let Some(kind) = Semantics::SUPPORTED_ROOM_TYPES.choose(&mut rng) {
            info!(room_type = %kind, "restricting to a single room type");
            let tags = restrictions.parent_rooms.take().unwrap_or_default().with(*kind);
            restrictions.parent_rooms = Some(tags);
        }
    }
    Ok(restrict_solving(catalog, graph, &restrictions))
}

/// Solves every assignment of every stage of `level`, in order. Returns the
/// number of objects placed.
fn solve_level<G: GeometryBackend>(
    solver: &mut Solver<G>,
    state: &mut SceneState,
    graph: &ConstraintGraph,
    catalog: &StageCatalog,
    limits: &AssignmentLimits,
    level: &SolveLevel<'_>,
    rng: &mut ChaCha8Rng,
) -> SolveResult<usize> {
    let mut placed = 0;
    for &name in level.stages {
        let domain = catalog.get(name)?.clone();
        let assignments = iterate_assignments(&domain, &*state, &ALL_VARS, limits, level.nonempty, rng)?;
        info!(stage = name, assignments = assignments.len(), "solving greedy stage");
        for (i, assignment) in assignments.enumerate() {
            let desc = format!("{name}_{i}");
            let report =
                solver.solve_objects(state, graph, &domain, &assignment, level.n_steps, &desc, level.abort)?;
            placed += report.placed.len();
        }
    }
    Ok(placed)
}

fn bbox_of<G: GeometryBackend>(backend: &G, state: &SceneState, keys: &[EntityKey]) -> Option<BoundingBox> {
    let boxes: Vec<BoundingBox> = keys
        .iter()
        .filter_map(|k| state.get(k))
        .filter_map(|spec| spec.geometry)
        .filter_map(|h| backend.bounds(h))
        .collect();
    BoundingBox::union_all(&boxes)
}

/// Stands the focus bottle on a random table or surface of a solved room.
fn add_bottle<G: GeometryBackend>(
    solver: &mut Solver<G>,
    state: &mut SceneState,
    rooms: &[EntityKey],
    rng: &mut ChaCha8Rng,
) -> Result<Option<EntityKey>, StateError> {
    let mut surfaces = state.all_matching(&obj_of(Semantics::Table));
    surfaces.extend(state.all_matching(&obj_of(Semantics::Surface)));
    surfaces.sort();
    surfaces.dedup();
    surfaces.retain(|k| state.parents_of(k).iter().any(|parent| rooms.contains(parent)));

    let Some(parent) = surfaces.choose(rng).cloned() else {
        info!("no table or surface to stand the bottle on");
        return Ok(None);
    };

    let key = EntityKey::new(BOTTLE_KEY);
    let top = state
        .get(&parent)
        .and_then(|spec| spec.geometry)
        .and_then(|h| solver.backend().bounds(h));
    let handle = top.map(|t| {
        let c = t.center();
        let bbox = BoundingBox::from_base([c[0], c[1], t.max[2]], BOTTLE_SIZE);
        solver.backend_mut().spawn_box(key.as_str(), bbox)
    });

    let mut spec = ObjectSpec::new()
        .with_tags([Semantics::Object, Semantics::Bottle, Semantics::FocusObject])
        .with_relation(bottom_on_top(), parent.clone());
    if let Some(h) = handle {
        spec = spec.with_geometry(h);
    }
    if let Err(err) = state.insert(key.clone(), spec) {
        if let Some(h) = handle {
            solver.backend_mut().delete(h);
        }
        return Err(err);
    }
    info!(parent = %parent, "placed focus bottle");
    Ok(Some(key))
}

/// Joined floor faces of `rooms`.
fn floor_surface(
    backend: &mut dyn GeometryBackend,
    state: &SceneState,
    rooms: &[EntityKey],
) -> Option<GeometryHandle> {
    let support = TagSet::of([Subpart::SupportSurface]);
    let pieces: Vec<GeometryHandle> = rooms
        .iter()
        .filter_map(|k| state.get(k).and_then(|spec| spec.geometry))
        .filter_map(|h| backend.extract_tagged_faces(h, &support))
        .collect();
    let floor = backend.join(&pieces);
    for piece in pieces {
        backend.delete(piece);
    }
    floor
}

/// The bottle if given, else a random small object standing on a support
/// surface, else any random small object.
fn object_to_follow(
    backend: &dyn GeometryBackend,
    state: &SceneState,
    bottle: Option<&EntityKey>,
    rng: &mut ChaCha8Rng,
) -> Option<EntityKey> {
    if let Some(key) = bottle {
        return Some(key.clone());
    }
    let small: Vec<EntityKey> = state
        .all_matching(&all_obj())
        .into_iter()
        .filter(|k| {
            state
                .get(k)
                .and_then(|spec| spec.geometry)
                .and_then(|h| backend.bounds(h))
                .is_some_and(|b| b.diagonal() < SMALL_DIAGONAL)
        })
        .collect();
    let support = on();
    let supported: Vec<EntityKey> = small
        .iter()
        .filter(|k| {
            state
                .get(k)
                .is_some_and(|spec| spec.relations.iter().any(|e| support.satisfied_by(&e.relation)))
        })
        .cloned()
        .collect();
    let pool = if supported.is_empty() { &small } else { &supported };
    pool.choose(rng).cloned()
}

/// Hides every room outside `keep`, and everything standing in it.
///
/// Entities also related to a kept room (doors between rooms) stay visible.
fn hide_other_rooms(backend: &mut dyn GeometryBackend, state: &SceneState, keep: &[EntityKey]) -> usize {
    let mut queue: Vec<EntityKey> = room_keys(state)
        .into_iter()
        .filter(|k| !keep.contains(k))
        .collect();
    let mut seen = BTreeSet::new();
    let mut hidden = 0;
    while let Some(key) = queue.pop() {
        if !seen.insert(key.clone()) {
            continue;
        }
        if let Some(handle) = state.get(&key).and_then(|spec| spec.geometry) {
            backend.set_hidden(handle, true);
            hidden += 1;
        }
        queue.extend(
            state
                .children_of(&key)
                .into_iter()
                .filter(|child| !state.parents_of(child).iter().any(|p| keep.contains(p))),
        );
    }
    hidden
}

fn decorate<G, C>(
    p: &mut RandomStageExecutor,
    solver: &mut Solver<G>,
    collab: &mut C,
    element: RoomElement,
    handles: &[GeometryHandle],
) -> ComposeResult<()>
where
    G: GeometryBackend,
    C: Collaborators + ?Sized,
{
    p.stage::<()>(element.stage())
        .use_chance(element.is_optional())
        .degrade_on_failure()
        .run(|rng| collab.decorate_room(solver.backend_mut(), element, handles, rng))?;
    Ok(())
}

/// Splits `part` faces off every room and decorates them. Returns the faces.
fn decorate_faces<G, C>(
    p: &mut RandomStageExecutor,
    solver: &mut Solver<G>,
    collab: &mut C,
    element: RoomElement,
    rooms: &[GeometryHandle],
    part: Subpart,
) -> ComposeResult<Vec<GeometryHandle>>
where
    G: GeometryBackend,
    C: Collaborators + ?Sized,
{
    let tags = TagSet::of([part]);
    let faces = p
        .stage(element.stage())
        .use_chance(element.is_optional())
        .degrade_on_failure()
        .run(|rng| {
            let faces: Vec<GeometryHandle> = rooms
                .iter()
                .filter_map(|h| solver.backend_mut().extract_tagged_faces(*h, &tags))
                .collect();
            collab
                .decorate_room(solver.backend_mut(), element, &faces, rng)
                .map(|()| faces)
        })?;
    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::vocab::bottom_on_floor;
    use hearth_state::ProxyGeometry;
    use rand::SeedableRng;

    fn kitchen_with(objects: &[(&str, Semantics, [f64; 3])]) -> (ProxyGeometry, SceneState) {
        let mut geo = ProxyGeometry::new();
        let mut state = SceneState::new();
        let room = geo.spawn_box("kitchen_0000", BoundingBox::new([0.0; 3], [4.0, 3.0, 2.8]));
        state
            .insert(
                "kitchen_0000".into(),
                ObjectSpec::new()
                    .with_geometry(room)
                    .with_tags([Semantics::Room, Semantics::Kitchen]),
            )
            .unwrap();
        for (key, kind, size) in objects {
            let h = geo.spawn_box(key, BoundingBox::new([0.0; 3], *size));
            state
                .insert(
                    (*key).into(),
                    ObjectSpec::new()
                        .with_geometry(h)
                        .with_tags([Semantics::Object, *kind])
                        .with_relation(bottom_on_floor(), "kitchen_0000"),
                )
                .unwrap();
        }
        (geo, state)
    }

    #[test]
    fn test_follow_prefers_bottle() {
        let (geo, state) = kitchen_with(&[("plant_0001", Semantics::Plant, [0.3, 0.3, 0.5])]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let bottle = EntityKey::new(BOTTLE_KEY);
        assert_eq!(object_to_follow(&geo, &state, Some(&bottle), &mut rng), Some(bottle));
    }

    #[test]
    fn test_follow_picks_small_objects_only() {
        let (geo, state) = kitchen_with(&[
            ("plant_0001", Semantics::Plant, [0.3, 0.3, 0.5]),
            ("sofa_0002", Semantics::Sofa, [2.0, 0.9, 0.8]),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            object_to_follow(&geo, &state, None, &mut rng),
            Some(EntityKey::new("plant_0001"))
        );
    }

    #[test]
    fn test_bottle_stands_on_table() {
        let (geo, mut state) = kitchen_with(&[("table_0001", Semantics::Table, [1.2, 0.8, 0.75])]);
        let mut solver = Solver::new(geo, SceneSeed::new(3));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let rooms = vec![EntityKey::new("kitchen_0000")];

        let key = add_bottle(&mut solver, &mut state, &rooms, &mut rng).unwrap().unwrap();
        assert_eq!(state.parents_of(&key), vec![EntityKey::new("table_0001")]);
        let spec = state.get(&key).unwrap();
        assert!(spec.has_tag(Semantics::FocusObject));
        let b = solver.backend().bounds(spec.geometry.unwrap()).unwrap();
        assert!((b.min[2] - 0.75).abs() < 1e-9);

        // A second bottle would reuse the key.
        assert!(add_bottle(&mut solver, &mut state, &rooms, &mut rng).is_err());
    }

    #[test]
    fn test_no_bottle_without_table() {
        let (geo, mut state) = kitchen_with(&[("plant_0001", Semantics::Plant, [0.3, 0.3, 0.5])]);
        let mut solver = Solver::new(geo, SceneSeed::new(3));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let rooms = vec![EntityKey::new("kitchen_0000")];
        assert!(add_bottle(&mut solver, &mut state, &rooms, &mut rng).unwrap().is_none());
    }

    #[test]
    fn test_hide_other_rooms_keeps_shared_doors() {
        let (mut geo, mut state) = kitchen_with(&[("table_0001", Semantics::Table, [1.2, 0.8, 0.75])]);
        let bath = geo.spawn_box("bathroom_0002", BoundingBox::new([4.0, 0.0, 0.0], [6.0, 3.0, 2.8]));
        state
            .insert(
                "bathroom_0002".into(),
                ObjectSpec::new()
                    .with_geometry(bath)
                    .with_tags([Semantics::Room, Semantics::Bathroom]),
            )
            .unwrap();
        let door = geo.spawn_box("door_0003", BoundingBox::new([3.9, 1.0, 0.0], [4.1, 1.9, 2.0]));
        state
            .insert(
                "door_0003".into(),
                ObjectSpec::new()
                    .with_geometry(door)
                    .with_tags([Semantics::Door])
                    .with_relation(hearth_domain::Relation::Touching, "kitchen_0000")
                    .with_relation(hearth_domain::Relation::Touching, "bathroom_0002"),
            )
            .unwrap();

        let keep = vec![EntityKey::new("kitchen_0000")];
        let hidden = hide_other_rooms(&mut geo, &state, &keep);
        assert_eq!(hidden, 1);
        assert!(geo.is_hidden(bath));
        assert!(!geo.is_hidden(door));
    }
}
