//! # HEARTH Scene State
//!
//! The mutable record of every placed entity in one generation run.
//!
//! ## Design Principles
//!
//! 1. **Single owner** - A `SceneState` is passed explicitly through every stage
//! 2. **Stable keys** - Keys are ordered, unique, and never reused after removal
//! 3. **Geometry at arm's length** - Entities hold opaque handles into a `GeometryBackend`
//! 4. **Portable snapshots** - Keys, tags and relations serialize without geometry
//!
//! ## Example
//!
//! ```rust,ignore
//! use hearth_state::{ObjectSpec, SceneState};
//! use hearth_domain::{vocab, Semantics};
//!
//! let mut state = SceneState::new();
//! state.insert("kitchen_0000".into(), ObjectSpec::new().with_tags([Semantics::Room, Semantics::Kitchen]))?;
//!
//! let rooms = state.all_matching(&vocab::all_room());
//! state.write_json(&output_folder.join("solve_state.json"))?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod geometry;
pub mod object;
pub mod snapshot;
pub mod state;

pub use error::{StateError, StateResult};
pub use geometry::{BoundingBox, GeometryBackend, GeometryHandle, ProxyGeometry};
pub use object::ObjectSpec;
pub use snapshot::{SnapshotEntry, StateSnapshot};
pub use state::{OverlayView, SceneState};
