//! # Scene State
//!
//! Mapping from entity key to `ObjectSpec`, plus the derived queries stages
//! need ("parents of X", "all entities matching D").
//!
//! ## Key Rules
//!
//! - Insertion under a live key fails with `DuplicateKey`.
//! - Removing an entity retires its key for the rest of the run; inserting
//!   it again also fails with `DuplicateKey`.
//! - Iteration and query results are ordered by key, never by insertion.

use std::collections::{BTreeMap, BTreeSet};

use hearth_domain::{Domain, EntityKey, RelationEdge, SceneView, Semantics, Tag};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::object::ObjectSpec;

/// Every placed entity of one generation run.
#[derive(Clone, Debug, Default)]
pub struct SceneState {
    objs: BTreeMap<EntityKey, ObjectSpec>,
    pub(crate) retired: BTreeSet<EntityKey>,
    pub(crate) key_counter: u64,
}

impl SceneState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a committed entity.
    #[must_use]
    pub fn get(&self, key: &EntityKey) -> Option<&ObjectSpec> {
        self.objs.get(key)
    }

    /// Looks up a committed entity for in-place updates (geometry, tags).
    pub fn get_mut(&mut self, key: &EntityKey) -> Option<&mut ObjectSpec> {
        self.objs.get_mut(key)
    }

    /// Returns true if `key` names a committed entity.
    #[must_use]
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.objs.contains_key(key)
    }

    /// Number of committed entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    /// Returns true if nothing is committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    /// Entities in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityKey, &ObjectSpec)> + '_ {
        self.objs.iter()
    }

    /// Inserts a new entity.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if `key` is live or was removed earlier.
    pub fn insert(&mut self, key: EntityKey, spec: ObjectSpec) -> StateResult<()> {
        if self.objs.contains_key(&key) || self.retired.contains(&key) {
            return Err(StateError::DuplicateKey(key));
        }
        debug!(key = %key, tags = spec.tags.len(), "insert entity");
        self.objs.insert(key, spec);
        Ok(())
    }

    /// Removes an entity, retires its key and drops every edge pointing at it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKey` if `key` is not committed.
    pub fn remove(&mut self, key: &EntityKey) -> StateResult<ObjectSpec> {
        let spec = self
            .objs
            .remove(key)
            .ok_or_else(|| StateError::UnknownKey(key.clone()))?;
        self.retired.insert(key.clone());
        for other in self.objs.values_mut() {
            other.relations.retain(|edge| &edge.target != key);
        }
        debug!(key = %key, "remove entity");
        Ok(spec)
    }

    /// Returns a fresh key `"{prefix}_{n:04}"` never used in this run.
    pub fn next_key(&mut self, prefix: &str) -> EntityKey {
        loop {
            let key = EntityKey::new(format!("{prefix}_{:04}", self.key_counter));
            self.key_counter += 1;
            if !self.objs.contains_key(&key) && !self.retired.contains(&key) {
                return key;
            }
        }
    }

    /// Keys of committed entities matching `domain`, in key order.
    #[must_use]
    pub fn all_matching(&self, domain: &Domain) -> Vec<EntityKey> {
        domain.matching_keys(self)
    }

    /// Committed entities `key` has a relation to, in edge order.
    #[must_use]
    pub fn parents_of(&self, key: &EntityKey) -> Vec<EntityKey> {
        self.objs.get(key).map_or_else(Vec::new, |spec| {
            spec.parents()
                .into_iter()
                .filter(|k| self.objs.contains_key(*k))
                .cloned()
                .collect()
        })
    }

    /// Committed entities with a relation to `key`, in key order.
    #[must_use]
    pub fn children_of(&self, key: &EntityKey) -> Vec<EntityKey> {
        self.objs
            .iter()
            .filter(|(_, spec)| spec.relations.iter().any(|e| &e.target == key))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Non-room objects with no relation to any committed entity.
    #[must_use]
    pub fn unresolved_objects(&self) -> Vec<EntityKey> {
        let object = Tag::Semantics(Semantics::Object);
        let room = Tag::Semantics(Semantics::Room);
        self.objs
            .iter()
            .filter(|(_, spec)| spec.tags.contains(&object) && !spec.tags.contains(&room))
            .filter(|(_, spec)| {
                !spec
                    .relations
                    .iter()
                    .any(|e| self.objs.contains_key(&e.target))
            })
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// A read-only view of this state plus uncommitted prospective entities.
    #[must_use]
    pub fn overlay(&self) -> OverlayView<'_> {
        OverlayView {
            base: self,
            extra: BTreeMap::new(),
        }
    }
}

impl SceneView for SceneState {
    fn tags_of(&self, key: &EntityKey) -> Option<&BTreeSet<Tag>> {
        self.objs.get(key).map(|spec| &spec.tags)
    }

    fn relations_of(&self, key: &EntityKey) -> &[RelationEdge] {
        self.objs
            .get(key)
            .map(|spec| spec.relations.as_slice())
            .unwrap_or_default()
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &EntityKey> + '_> {
        Box::new(self.objs.keys())
    }
}

/// Committed state plus prospective entities nobody else can see.
///
/// Lets the solver ask "would this new object match the stage?" without
/// touching the state.
#[derive(Debug)]
pub struct OverlayView<'a> {
    base: &'a SceneState,
    extra: BTreeMap<EntityKey, ObjectSpec>,
}

impl OverlayView<'_> {
    /// Adds a prospective entity, shadowing any committed one with the same key.
    #[must_use]
    pub fn with(mut self, key: EntityKey, spec: ObjectSpec) -> Self {
        self.extra.insert(key, spec);
        self
    }

    fn lookup(&self, key: &EntityKey) -> Option<&ObjectSpec> {
        self.extra.get(key).or_else(|| self.base.get(key))
    }
}

impl SceneView for OverlayView<'_> {
    fn tags_of(&self, key: &EntityKey) -> Option<&BTreeSet<Tag>> {
        self.lookup(key).map(|spec| &spec.tags)
    }

    fn relations_of(&self, key: &EntityKey) -> &[RelationEdge] {
        self.lookup(key)
            .map(|spec| spec.relations.as_slice())
            .unwrap_or_default()
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &EntityKey> + '_> {
        let merged: BTreeSet<&EntityKey> = self.base.objs.keys().chain(self.extra.keys()).collect();
        Box::new(merged.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::vocab;

    fn room() -> ObjectSpec {
        ObjectSpec::new().with_tags([Semantics::Room, Semantics::Kitchen])
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut state = SceneState::new();
        state.insert("kitchen_0000".into(), room()).unwrap();
        let err = state.insert("kitchen_0000".into(), room()).unwrap_err();
        assert!(matches!(err, StateError::DuplicateKey(_)));
    }

    #[test]
    fn test_removed_keys_are_never_reused() {
        let mut state = SceneState::new();
        let key = state.next_key("kitchen");
        state.insert(key.clone(), room()).unwrap();
        state.remove(&key).unwrap();

        assert!(matches!(
            state.insert(key.clone(), room()),
            Err(StateError::DuplicateKey(_))
        ));
        assert_ne!(state.next_key("kitchen"), key);
    }

    #[test]
    fn test_remove_strips_inbound_edges() {
        let mut state = SceneState::new();
        state.insert("kitchen_0000".into(), room()).unwrap();
        state
            .insert(
                "table_0001".into(),
                ObjectSpec::new()
                    .with_tags([Semantics::Object, Semantics::Table])
                    .with_relation(vocab::bottom_on_floor(), "kitchen_0000"),
            )
            .unwrap();

        assert_eq!(state.parents_of(&"table_0001".into()), vec![EntityKey::new("kitchen_0000")]);
        assert_eq!(state.children_of(&"kitchen_0000".into()), vec![EntityKey::new("table_0001")]);

        state.remove(&"kitchen_0000".into()).unwrap();
        assert!(state.parents_of(&"table_0001".into()).is_empty());
        assert_eq!(state.unresolved_objects(), vec![EntityKey::new("table_0001")]);
    }

    #[test]
    fn test_overlay_is_invisible_to_state() {
        let mut state = SceneState::new();
        state.insert("kitchen_0000".into(), room()).unwrap();
        let prospect = ObjectSpec::new()
            .with_tags([Semantics::Object, Semantics::Table])
            .with_relation(vocab::bottom_on_floor(), "kitchen_0000");

        let on_floor = vocab::all_obj().with_relation(vocab::on_floor(), &vocab::all_room());
        let overlay = state.overlay().with("prospect".into(), prospect);
        assert!(on_floor.matches(&overlay, &"prospect".into()));
        assert!(state.all_matching(&on_floor).is_empty());
        assert_eq!(overlay.keys().count(), 2);
    }
}
