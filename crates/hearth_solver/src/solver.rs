//! # Solver
//!
//! Owns the geometry backend and the scene seed, and solves one stage
//! assignment at a time.
//!
//! ## Solve Call
//!
//! 1. Bind the assignment into the stage domain
//! 2. Collect slots: every (rule, parent) pair whose prospective object the
//!    bound stage and the rule both admit
//! 3. Search slot counts within the step budget
//! 4. Commit every new object, or nothing
//!
//! ```rust,ignore
//! let mut solver = Solver::new(ProxyGeometry::new(), SceneSeed::new(7));
//! let mut state = solver.solve_rooms(&graph, catalog.get(ROOMS)?)?;
//! for assignment in iterate_assignments(on_floor, &state, &ALL_VARS, &limits, true, &mut rng)? {
//!     solver.solve_objects(&mut state, &graph, on_floor, &assignment, 400, "on_floor_0", true)?;
//! }
//! ```

use std::collections::BTreeMap;

use hearth_domain::{Domain, EntityKey};
use hearth_pipeline::SceneSeed;
use hearth_state::{BoundingBox, GeometryBackend, GeometryHandle, ObjectSpec, SceneState};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::catalog::ROOMS;
use crate::constraints::{ConstraintGraph, SurfaceKind};
use crate::error::{SolveError, SolveResult};
use crate::greedy::Assignment;
use crate::rooms::layout_rooms;
use crate::search::{search, violations, Group, Score, Slot};

/// Purpose id of solver streams, next to the executor's chance and body ids.
pub const SOLVE_PURPOSE: u64 = 2;

/// Key of the prospective object used to test stage membership.
const PROSPECT_KEY: &str = "__prospect__";

/// Gap left between neighbouring objects, in metres.
const GAP: f64 = 0.05;

/// Result of one solve call.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveReport {
    /// Solve call description.
    pub desc: String,
    /// Keys of committed objects, in commit order.
    pub placed: Vec<EntityKey>,
    /// Score of the committed placement.
    pub score: Score,
    /// Search steps taken.
    pub steps: usize,
    /// Hard violations left in the committed placement.
    pub violations: Vec<String>,
}

impl SolveReport {
    /// Returns true if no hard constraint is violated.
    #[must_use]
    pub const fn satisfied(&self) -> bool {
        self.score.is_satisfied()
    }
}

/// Greedy staged solver over one geometry backend.
#[derive(Debug)]
pub struct Solver<G: GeometryBackend> {
    backend: G,
    seed: SceneSeed,
}

impl<G: GeometryBackend> Solver<G> {
    /// Creates a solver.
    #[must_use]
    pub const fn new(backend: G, seed: SceneSeed) -> Self {
        Self { backend, seed }
    }

    /// Geometry backend.
    #[must_use]
    pub const fn backend(&self) -> &G {
        &self.backend
    }

    /// Geometry backend, mutably.
    pub fn backend_mut(&mut self) -> &mut G {
        &mut self.backend
    }

    /// Consumes the solver, returning its backend.
    #[must_use]
    pub fn into_backend(self) -> G {
        self.backend
    }

    /// Lays out rooms admitted by `rooms_domain` into a fresh state.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if no room rule is admitted.
    pub fn solve_rooms(
        &mut self,
        graph: &ConstraintGraph,
        rooms_domain: &Domain,
    ) -> SolveResult<SceneState> {
        let mut state = SceneState::new();
        let mut rng = self.seed.rng(ROOMS, SOLVE_PURPOSE);
        layout_rooms(&mut self.backend, &mut state, graph, rooms_domain, &mut rng)?;
        Ok(state)
    }

    /// Solves one assignment of a greedy stage and commits the result.
    ///
    /// # Errors
    ///
    /// Returns `Unsatisfied` if hard constraints remain violated and
    /// `abort_unsatisfied` is set; the state is left untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn solve_objects(
        &mut self,
        state: &mut SceneState,
        graph: &ConstraintGraph,
        domain: &Domain,
        assignment: &Assignment,
        n_steps: usize,
        desc: &str,
        abort_unsatisfied: bool,
    ) -> SolveResult<SolveReport> {
        let bound = assignment.apply(domain);
        let (slots, groups, starts) = self.collect_slots(state, graph, &bound);

        let mut rng = self.seed.rng(desc, SOLVE_PURPOSE);
        let slots: Vec<Slot> = slots
            .into_iter()
            .map(|mut s| {
                s.target = rng.gen_range(s.min..=s.max.max(s.min));
                s
            })
            .collect();

        let outcome = search(&slots, &groups, n_steps, &mut rng);
        let violated = violations(&slots, &groups, &outcome.counts);

        if !outcome.score.is_satisfied() {
            if abort_unsatisfied {
                warn!(desc, score = %outcome.score, "aborting unsatisfied solve");
                return Err(SolveError::Unsatisfied {
                    desc: desc.to_string(),
                    violations: violated,
                });
            }
            warn!(desc, score = %outcome.score, "committing unsatisfied placement");
        }

        let placed = self.commit(state, graph, &slots, &groups, starts, &outcome.counts)?;
        info!(
            desc,
            assignment = %assignment,
            slots = slots.len(),
            placed = placed.len(),
            steps = outcome.steps,
            score = %outcome.score,
            "solved"
        );
        Ok(SolveReport {
            desc: desc.to_string(),
            placed,
            score: outcome.score,
            steps: outcome.steps,
            violations: violated,
        })
    }

    fn collect_slots(
        &self,
        state: &SceneState,
        graph: &ConstraintGraph,
        bound: &Domain,
    ) -> (Vec<Slot>, Vec<Group>, Vec<usize>) {
        let prospect = EntityKey::new(PROSPECT_KEY);
        let mut slots = Vec::new();
        let mut groups: Vec<Group> = Vec::new();
        let mut starts: Vec<usize> = Vec::new();
        let mut index: BTreeMap<(EntityKey, SurfaceKind), usize> = BTreeMap::new();

        for rule in &graph.placements {
            let (Some(clause), Some(surface)) = (rule.support_clause(), rule.surface()) else {
                continue;
            };
            for parent in state.all_matching(&clause.target) {
                let spec = ObjectSpec::new()
                    .with_tags(rule.object_tags())
                    .with_relation(clause.relation.clone(), parent.clone());
                let view = state.overlay().with(prospect.clone(), spec);
                if !bound.matches(&view, &prospect) || !rule.object.matches(&view, &prospect) {
                    continue;
                }

                let group = *index.entry((parent.clone(), surface)).or_insert_with(|| {
                    let (capacity, start) = self.free_capacity(state, &parent, surface);
                    groups.push(Group {
                        parent: parent.clone(),
                        surface,
                        capacity,
                    });
                    starts.push(start);
                    groups.len() - 1
                });
                slots.push(Slot {
                    rule: rule.name.clone(),
                    group,
                    min: rule.count.min,
                    max: rule.count.max,
                    target: rule.count.min,
                    footprint: surface.footprint(rule.size),
                });
            }
        }
        debug!(slots = slots.len(), groups = groups.len(), "collected slots");
        (slots, groups, starts)
    }

    /// Capacity of `surface` on `parent` left by committed children, and how
    /// many children already use it.
    fn free_capacity(
        &self,
        state: &SceneState,
        parent: &EntityKey,
        surface: SurfaceKind,
    ) -> (f64, usize) {
        let Some(bbox) = self.bounds_of(state, parent) else {
            return (f64::INFINITY, 0);
        };
        let mut capacity = surface.capacity(&bbox);
        let mut count = 0;
        for child in state.children_of(parent) {
            let Some(spec) = state.get(&child) else {
                continue;
            };
            let on_surface = spec.relations.iter().any(|e| {
                &e.target == parent && SurfaceKind::of_relation(&e.relation) == Some(surface)
            });
            if !on_surface {
                continue;
            }
            count += 1;
            if let Some(b) = self.bounds_of(state, &child) {
                capacity -= surface.footprint(b.size());
            }
        }
        (capacity, count)
    }

    fn bounds_of(&self, state: &SceneState, key: &EntityKey) -> Option<BoundingBox> {
        state
            .get(key)
            .and_then(|spec| spec.geometry)
            .and_then(|h| self.backend.bounds(h))
    }

    /// Commits counts into a staged copy of `state`, replacing `state` only
    /// if every insert succeeds.
    fn commit(
        &mut self,
        state: &mut SceneState,
        graph: &ConstraintGraph,
        slots: &[Slot],
        groups: &[Group],
        mut next_index: Vec<usize>,
        counts: &[u32],
    ) -> SolveResult<Vec<EntityKey>> {
        let mut staged = state.clone();
        let mut spawned: Vec<GeometryHandle> = Vec::new();
        let mut placed = Vec::new();

        for (slot, &n) in slots.iter().zip(counts) {
            let Some(rule) = graph.placement(&slot.rule) else {
                continue;
            };
            let Some(clause) = rule.support_clause() else {
                continue;
            };
            let group = &groups[slot.group];
            let parent_box = self.bounds_of(&staged, &group.parent);

            for _ in 0..n {
                let key = staged.next_key(&rule.name);
                let i = next_index[slot.group];
                next_index[slot.group] += 1;
                let bbox = place(group.surface, parent_box, rule.size, i);
                let handle = self.backend.spawn_box(key.as_str(), bbox);
                spawned.push(handle);

                let spec = ObjectSpec::new()
                    .with_geometry(handle)
                    .with_tags(rule.object_tags())
                    .with_relation(clause.relation.clone(), group.parent.clone());
                if let Err(err) = staged.insert(key.clone(), spec) {
                    for h in spawned {
                        self.backend.delete(h);
                    }
                    return Err(err.into());
                }
                placed.push(key);
            }
        }

        *state = staged;
        Ok(placed)
    }
}

/// Geometry handles of every committed entity matching `domain`.
#[must_use]
pub fn geometry_of(state: &SceneState, domain: &Domain) -> Vec<GeometryHandle> {
    state
        .all_matching(domain)
        .iter()
        .filter_map(|key| state.get(key).and_then(|spec| spec.geometry))
        .collect()
}

/// Box of the `index`-th object of `size` against `surface` of a parent.
#[allow(clippy::cast_precision_loss)]
fn place(surface: SurfaceKind, parent: Option<BoundingBox>, size: [f64; 3], index: usize) -> BoundingBox {
    let i = index as f64;
    let Some(p) = parent else {
        return corner_box([i * (size[0] + GAP), 0.0, 0.0], size);
    };
    let [px, py, pz] = p.size();
    let step_x = size[0] + GAP;
    let per_row = ((px / step_x).floor() as usize).max(1);
    let col = (index % per_row) as f64;
    let row = (index / per_row) as f64;

    let base = match surface {
        SurfaceKind::Floor => [p.min[0] + col * step_x, p.min[1] + row * (size[1] + GAP), p.min[2]],
        SurfaceKind::Wall => {
            let z = (p.min[2] + 1.4).min(p.max[2] - size[2]);
            [p.min[0] + col * step_x, p.min[1], z + row * (size[2] + GAP)]
        }
        SurfaceKind::Ceiling => [
            p.min[0] + (px - size[0]) / 2.0 + col * step_x,
            p.min[1] + (py - size[1]) / 2.0,
            p.max[2] - size[2],
        ],
        SurfaceKind::Side => {
            let along = (index / 2) as f64 * (size[0] + GAP);
            let x = if index % 2 == 0 {
                p.max[0] + GAP
            } else {
                p.min[0] - GAP - size[0]
            };
            [x, p.min[1] + along, p.min[2]]
        }
        SurfaceKind::Top => [p.min[0] + col * step_x, p.min[1] + row * (size[1] + GAP), p.max[2]],
        SurfaceKind::Support => {
            let shelf = (pz / 4.0).max(size[2]);
            [p.min[0] + col * step_x, p.min[1], p.min[2] + shelf * (row + 1.0)]
        }
    };
    corner_box(base, size)
}

fn corner_box(min: [f64; 3], size: [f64; 3]) -> BoundingBox {
    BoundingBox::new(min, [min[0] + size[0], min[1] + size[1], min[2] + size[2]])
}
