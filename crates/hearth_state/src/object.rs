//! Object specs: one placed entity.

use std::collections::BTreeSet;

use hearth_domain::{EntityKey, Relation, RelationEdge, Tag};

use crate::geometry::GeometryHandle;

/// One placed entity: geometry, tags and outgoing relations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectSpec {
    /// Mesh in the geometry backend, if any.
    pub geometry: Option<GeometryHandle>,
    /// Semantic and subpart tags.
    pub tags: BTreeSet<Tag>,
    /// Relations to parents (supports, rooms, neighbours).
    pub relations: Vec<RelationEdge>,
}

impl ObjectSpec {
    /// Creates an untagged spec without geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the geometry handle.
    #[must_use]
    pub fn with_geometry(mut self, handle: GeometryHandle) -> Self {
        self.geometry = Some(handle);
        self
    }

    /// Adds tags.
    #[must_use]
    pub fn with_tags<T: Into<Tag>>(mut self, tags: impl IntoIterator<Item = T>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Adds a relation to `target`.
    #[must_use]
    pub fn with_relation(mut self, relation: Relation, target: impl Into<EntityKey>) -> Self {
        self.relations.push(RelationEdge::new(relation, target));
        self
    }

    /// Returns true if the entity carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: impl Into<Tag>) -> bool {
        self.tags.contains(&tag.into())
    }

    /// Keys this entity relates to, in edge order, without repeats.
    #[must_use]
    pub fn parents(&self) -> Vec<&EntityKey> {
        let mut seen = BTreeSet::new();
        self.relations
            .iter()
            .map(|e| &e.target)
            .filter(|k| seen.insert(*k))
            .collect()
    }
}
