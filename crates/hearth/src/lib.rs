//! # HEARTH Indoor Composition
//!
//! Drives one indoor scene from an empty world to a furnished, decorated,
//! camera-ready house.
//!
//! ## Design Principles
//!
//! 1. **Stages, not steps** - Every unit of work is a named, seeded, skippable stage
//! 2. **Configuration is data** - TOML files plus `key=value` overrides, typed once
//! 3. **External work behind a trait** - Terrain, cameras and decoration are `Collaborators`
//! 4. **Degrade, don't die** - Only a broken program or a failed room layout aborts a run
//!
//! ## Example
//!
//! ```rust,ignore
//! use hearth::{compose_indoors, ComposeConfig, HeadlessCollaborators};
//! use hearth_pipeline::SceneSeed;
//! use hearth_state::ProxyGeometry;
//!
//! let config = ComposeConfig::load(&configs, &["base".into()], &["solve_steps_large=100".into()])?;
//! let mut collab = HeadlessCollaborators::new();
//! let out = compose_indoors(&output, SceneSeed::new(7), &config, ProxyGeometry::new(), &mut collab)?;
//! println!("height offset {}", out.height_offset);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod camera;
pub mod collaborators;
pub mod compose;
pub mod config;
pub mod error;

pub use camera::{topview_pose, CameraPose};
pub use collaborators::{Collaborators, HeadlessCollaborators, RoomElement};
pub use compose::{compose_indoors, ComposeOutput, BOTTLE_KEY, PIPELINE_FILE, SOLVE_STATE_FILE};
pub use config::{parse_override, ComposeConfig};
pub use error::{ComposeError, ComposeResult, ConfigError, ConfigResult};
