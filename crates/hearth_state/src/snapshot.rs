//! # Snapshots
//!
//! Geometry-free, serializable form of a scene state: for each entity key,
//! its tag list and its relation list. Written once per run as
//! `solve_state.json` for downstream decoration and export tools.
//!
//! Removed keys and the key counter travel with the snapshot, so a restored
//! state still never hands out a key used earlier in the run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use hearth_domain::{EntityKey, RelationEdge, Tag};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{StateError, StateResult};
use crate::object::ObjectSpec;
use crate::state::SceneState;

/// One entity of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Tags, sorted.
    pub tags: Vec<Tag>,
    /// Outgoing relations, in edge order.
    pub relations: Vec<RelationEdge>,
}

/// Serializable scene state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Entities by key.
    pub entities: BTreeMap<EntityKey, SnapshotEntry>,
    /// Keys removed during the run.
    #[serde(default)]
    pub retired: BTreeSet<EntityKey>,
    /// Next counter value of `next_key`.
    #[serde(default)]
    pub key_counter: u64,
}

impl SceneState {
    /// Captures keys, tags and relations.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            entities: self
                .iter()
                .map(|(key, spec)| {
                    (
                        key.clone(),
                        SnapshotEntry {
                            tags: spec.tags.iter().cloned().collect(),
                            relations: spec.relations.clone(),
                        },
                    )
                })
                .collect(),
            retired: self.retired.clone(),
            key_counter: self.key_counter,
        }
    }

    /// Rebuilds a state from a snapshot. Geometry handles are not restored.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` only if the snapshot itself is malformed, for
    /// example when a key is both live and retired.
    pub fn from_snapshot(snapshot: &StateSnapshot) -> StateResult<Self> {
        let mut state = Self::new();
        state.retired.clone_from(&snapshot.retired);
        state.key_counter = snapshot.key_counter;
        for (key, entry) in &snapshot.entities {
            let spec = ObjectSpec {
                geometry: None,
                tags: entry.tags.iter().cloned().collect(),
                relations: entry.relations.clone(),
            };
            state.insert(key.clone(), spec)?;
        }
        Ok(state)
    }

    /// Writes the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_json(&self, path: &Path) -> StateResult<()> {
        let text = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, text).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), entities = self.len(), "wrote scene state");
        Ok(())
    }

    /// Reads a state written by `write_json`.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or decoding fails.
    pub fn read_json(path: &Path) -> StateResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| StateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: StateSnapshot = serde_json::from_str(&text)?;
        Self::from_snapshot(&snapshot)
    }
}
