//! # Matching
//!
//! Evaluation of domains against a read-only view of scene entities.
//!
//! Matching recurses only into clause targets and excluded domains, which are
//! strictly smaller than the domain being evaluated, so it terminates for any
//! entity graph, including cyclic ones.

use std::collections::BTreeSet;

use crate::domain::Domain;
use crate::relation::RelationEdge;
use crate::tags::{EntityKey, Tag};

/// Read-only access to entities, their tags and their outgoing relations.
pub trait SceneView {
    /// Tags of `key`, or `None` if the entity does not exist.
    fn tags_of(&self, key: &EntityKey) -> Option<&BTreeSet<Tag>>;

    /// Outgoing relation edges of `key` (empty for unknown keys).
    fn relations_of(&self, key: &EntityKey) -> &[RelationEdge];

    /// Every entity key, in ascending order.
    fn keys(&self) -> Box<dyn Iterator<Item = &EntityKey> + '_>;
}

impl Domain {
    /// Returns true if entity `key` of `view` satisfies this domain.
    #[must_use]
    pub fn matches(&self, view: &dyn SceneView, key: &EntityKey) -> bool {
        let Some(tags) = view.tags_of(key) else {
            return false;
        };
        if !self.tags().admits(key, tags) {
            return false;
        }

        let edges = view.relations_of(key);
        let clauses_hold = self.relations().iter().all(|clause| {
            let wanted = clause.relation.positive();
            let reached = edges.iter().any(|edge| {
                wanted.satisfied_by(&edge.relation) && clause.target.matches(view, &edge.target)
            });
            reached != clause.is_negated()
        });

        clauses_hold && !self.excludes().iter().any(|d| d.matches(view, key))
    }

    /// Keys of every matching entity, in ascending order.
    #[must_use]
    pub fn matching_keys(&self, view: &dyn SceneView) -> Vec<EntityKey> {
        view.keys()
            .filter(|key| self.matches(view, key))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Relation;
    use crate::tags::{Semantics, Subpart, TagSet};
    use crate::vocab;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MiniScene {
        tags: BTreeMap<EntityKey, BTreeSet<Tag>>,
        edges: BTreeMap<EntityKey, Vec<RelationEdge>>,
    }

    impl MiniScene {
        fn add(&mut self, key: &str, tags: &[Semantics], edges: Vec<RelationEdge>) {
            let key = EntityKey::new(key);
            self.tags
                .insert(key.clone(), tags.iter().copied().map(Tag::from).collect());
            self.edges.insert(key, edges);
        }
    }

    impl SceneView for MiniScene {
        fn tags_of(&self, key: &EntityKey) -> Option<&BTreeSet<Tag>> {
            self.tags.get(key)
        }

        fn relations_of(&self, key: &EntityKey) -> &[RelationEdge] {
            self.edges.get(key).map(Vec::as_slice).unwrap_or_default()
        }

        fn keys(&self) -> Box<dyn Iterator<Item = &EntityKey> + '_> {
            Box::new(self.tags.keys())
        }
    }

    fn scene() -> MiniScene {
        let mut s = MiniScene::default();
        s.add("bedroom_0000", &[Semantics::Room, Semantics::Bedroom], vec![]);
        s.add("kitchen_0001", &[Semantics::Room, Semantics::Kitchen], vec![]);
        s.add(
            "table_0002",
            &[Semantics::Object, Semantics::Table],
            vec![RelationEdge::new(vocab::bottom_on_floor(), "kitchen_0001")],
        );
        s.add(
            "painting_0003",
            &[Semantics::Object, Semantics::WallDecoration],
            vec![RelationEdge::new(vocab::back_against_wall(), "bedroom_0000")],
        );
        s.add(
            "cup_0004",
            &[Semantics::Object, Semantics::Tableware],
            vec![RelationEdge::new(vocab::bottom_on_top(), "table_0002")],
        );
        s
    }

    #[test]
    fn test_negated_clause_is_complement() {
        let s = scene();
        let base = vocab::all_obj();
        let with = base.with_relation(vocab::on_floor(), &vocab::all_room());
        let without = base.without_relation(vocab::on_floor(), &vocab::all_room());

        let all: BTreeSet<_> = base.matching_keys(&s).into_iter().collect();
        let a: BTreeSet<_> = with.matching_keys(&s).into_iter().collect();
        let b: BTreeSet<_> = without.matching_keys(&s).into_iter().collect();

        assert!(a.is_disjoint(&b));
        assert_eq!(a.union(&b).cloned().collect::<BTreeSet<_>>(), all);
        assert_eq!(a.into_iter().collect::<Vec<_>>(), vec![EntityKey::new("table_0002")]);
    }

    #[test]
    fn test_absent_relation_differs_from_negative_target() {
        let s = scene();
        let kitchen = vocab::all_room().with_tags(Semantics::Kitchen);

        // No floor edge into a kitchen: everything but the table.
        let absent = vocab::all_obj().without_relation(vocab::on_floor(), &kitchen);
        // Some floor edge into something that is not a kitchen: nothing here.
        let elsewhere = vocab::all_obj().with_relation(vocab::on_floor(), &-kitchen);

        assert_eq!(absent.matching_keys(&s).len(), 2);
        assert!(elsewhere.matching_keys(&s).is_empty());
    }

    #[test]
    fn test_negated_domain_composes_with_tags() {
        let s = scene();
        let not_room = (-Domain::new(Semantics::Room)).with_tags(Semantics::Object);
        assert_eq!(not_room.matching_keys(&s).len(), 3);
    }

    #[test]
    fn test_specific_object_restricts_match() {
        let s = scene();
        let d = vocab::all_room().with_tags(Tag::SpecificObject(EntityKey::new("kitchen_0001")));
        assert_eq!(d.matching_keys(&s), vec![EntityKey::new("kitchen_0001")]);
    }

    #[test]
    fn test_matching_terminates_on_cyclic_edges() {
        let mut s = MiniScene::default();
        s.add(
            "a",
            &[Semantics::Object],
            vec![RelationEdge::new(Relation::Touching, "b")],
        );
        s.add(
            "b",
            &[Semantics::Object],
            vec![RelationEdge::new(Relation::Touching, "a")],
        );
        let inner = Domain::new(TagSet::of([Semantics::Object]));
        let d = inner
            .with_relation(Relation::Touching, &inner.with_relation(Relation::Touching, &inner));
        assert_eq!(d.matching_keys(&s).len(), 2);
        assert!(!Domain::new(Subpart::Wall).matches(&s, &EntityKey::new("a")));
    }
}
