//! # Witness Construction
//!
//! Builds the smallest entity graph that satisfies a domain's positive
//! requirements. Used by configuration checks to decide whether a domain is
//! satisfiable in principle, and to ask which stage a placement rule's objects
//! would fall into.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::Domain;
use crate::matching::SceneView;
use crate::relation::{Relation, RelationEdge};
use crate::tags::{EntityKey, Tag, TagSet};

/// A minimal example scene for one domain.
#[derive(Clone, Debug)]
pub struct Witness {
    tags: BTreeMap<EntityKey, BTreeSet<Tag>>,
    edges: BTreeMap<EntityKey, Vec<RelationEdge>>,
    root: EntityKey,
    next_id: usize,
}

impl Witness {
    /// Builds the witness graph of `domain`.
    #[must_use]
    pub fn of(domain: &Domain) -> Self {
        let mut witness = Self {
            tags: BTreeMap::new(),
            edges: BTreeMap::new(),
            root: EntityKey::new("witness_0"),
            next_id: 0,
        };
        witness.root = witness.build(domain);
        witness
    }

    fn build(&mut self, domain: &Domain) -> EntityKey {
        let key = if let Some(specific) = domain.tags().specific_object() {
            specific.clone()
        } else {
            let key = EntityKey::new(format!("witness_{}", self.next_id));
            self.next_id += 1;
            key
        };

        self.tags
            .entry(key.clone())
            .or_default()
            .extend(domain.tags().concrete().cloned());
        self.edges.entry(key.clone()).or_default();

        for clause in domain.positive_clauses() {
            let target = self.build(&clause.target);
            let edge = RelationEdge::new(fact_for(&clause.relation), target);
            if let Some(edges) = self.edges.get_mut(&key) {
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
        key
    }

    /// The entity standing for the domain itself.
    #[must_use]
    pub fn root(&self) -> &EntityKey {
        &self.root
    }

    /// Tags of the root entity.
    #[must_use]
    pub fn root_tags(&self) -> BTreeSet<Tag> {
        self.tags.get(&self.root).cloned().unwrap_or_default()
    }

    /// Returns true if the root entity matches `domain`.
    #[must_use]
    pub fn satisfies(&self, domain: &Domain) -> bool {
        domain.matches(self, &self.root)
    }

    /// Number of entities in the witness graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if the witness holds no entity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// The weakest stored edge that satisfies `predicate`.
fn fact_for(predicate: &Relation) -> Relation {
    match predicate.positive() {
        Relation::StableAgainst { child, parent } => Relation::StableAgainst {
            child: TagSet::of(child.included().iter().cloned()),
            parent: TagSet::of(parent.included().iter().cloned()),
        },
        _ => Relation::Touching,
    }
}

impl SceneView for Witness {
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

impl Domain {
    /// Builds the minimal witness graph of this domain.
    #[must_use]
    pub fn witness(&self) -> Witness {
        Witness::of(self)
    }

    /// Returns true if some entity graph satisfies this domain.
    ///
    /// Checked by construction: the minimal witness must match.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        self.validate().is_ok() && self.witness().satisfies(self)
    }
}
