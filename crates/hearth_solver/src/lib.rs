//! # HEARTH Greedy Solver
//!
//! Places rooms, then furniture, then decorations, one greedy stage at a
//! time.
//!
//! ## Design Principles
//!
//! 1. **Fail before solving** - `check_all` rejects malformed programs up front
//! 2. **Greedy, not global** - Each stage is solved per room or per parent object
//! 3. **Deterministic** - Every choice draws from a stream named by the solve call
//! 4. **Atomic commits** - A solve call commits all of its objects or none
//!
//! ## Example
//!
//! ```rust,ignore
//! use hearth_solver::{catalog, check_all, home_constraints, iterate_assignments, Solver};
//!
//! let graph = home_constraints();
//! let stages = catalog::default_greedy_stages();
//! check_all(&graph, &stages, &catalog::ALL_VARS)?;
//!
//! let mut solver = Solver::new(ProxyGeometry::new(), seed);
//! let mut state = solver.solve_rooms(&graph, stages.get(catalog::ROOMS)?)?;
//!
//! let on_floor = stages.get(catalog::ON_FLOOR)?;
//! let assignments = iterate_assignments(on_floor, &state, &catalog::ALL_VARS, &limits, true, &mut rng)?;
//! for (i, assignment) in assignments.enumerate() {
//!     solver.solve_objects(&mut state, &graph, on_floor, &assignment, 400, &format!("on_floor_{i}"), true)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod checks;
pub mod constraints;
pub mod error;
pub mod greedy;
pub mod rooms;
pub mod search;
pub mod solver;

pub use catalog::{default_greedy_stages, StageCatalog};
pub use checks::{check_all, check_resolved, variable_order, VariableGraph};
pub use constraints::{
    home_constraints, ConstraintGraph, CountRange, PlacementRule, RoomRule, SurfaceKind,
};
pub use error::{SolveError, SolveResult};
pub use greedy::{
    apply_greedy_restriction, iterate_assignments, restrict_solving, Assignment,
    AssignmentLimits, Assignments, Restrictions,
};
pub use rooms::{room_keys, WALL_HEIGHT};
pub use search::Score;
pub use solver::{geometry_of, SolveReport, Solver, SOLVE_PURPOSE};
