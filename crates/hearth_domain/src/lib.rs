//! # HEARTH Domain Algebra
//!
//! Declarative descriptions of "which scene entities, related how, to which
//! other entities".
//!
//! ## Design Principles
//!
//! 1. **Closed vocabulary** - Tags and relations are enums, never free strings
//! 2. **Immutable values** - Every combinator returns a new `Domain`
//! 3. **Pure matching** - Evaluation reads a `SceneView` and nothing else
//! 4. **Greedy variables** - A `VariableTag` marks a family of bindings
//!
//! ## Example
//!
//! ```rust,ignore
//! use hearth_domain::{vocab, Domain, Semantics, TagSet};
//!
//! // Objects standing on the floor of some room
//! let on_floor = vocab::all_obj().with_relation(vocab::on_floor(), &vocab::all_room());
//!
//! // Only kitchens
//! let kitchen_floor = vocab::all_obj()
//!     .with_relation(vocab::on_floor(), &vocab::all_room().with_tags(Semantics::Kitchen));
//!
//! for key in kitchen_floor.matching_keys(&scene) {
//!     println!("{key}");
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod domain;
pub mod error;
pub mod matching;
pub mod relation;
pub mod tags;
pub mod vocab;
pub mod witness;

pub use domain::{Domain, RelationClause, MAX_DOMAIN_DEPTH};
pub use error::{DomainError, DomainResult};
pub use matching::SceneView;
pub use relation::{Relation, RelationEdge};
pub use tags::{EntityKey, Semantics, Subpart, Tag, TagSet, VariableTag};
pub use witness::Witness;
