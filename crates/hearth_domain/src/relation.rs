//! # Relations
//!
//! Relation predicates used in domain clauses, and the concrete relation
//! edges stored on scene entities.
//!
//! An edge is a fact ("my bottom rests on that floor"); a predicate is a
//! question about facts ("does any edge rest against a support surface?").
//! Both use the same `Relation` type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

use crate::tags::{EntityKey, TagSet};

/// A relation predicate between two entities.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Any (non-negated) relation at all.
    AnyRelation,
    /// The `child` faces of the entity rest against the `parent` faces of the target.
    StableAgainst {
        /// Faces of the related entity.
        child: TagSet,
        /// Faces of the target entity.
        parent: TagSet,
    },
    /// The two entities touch.
    Touching,
    /// The inverted predicate.
    Negated(Box<Relation>),
}

impl Relation {
    /// Creates a stable-against relation.
    #[must_use]
    pub fn stable_against(child: impl Into<TagSet>, parent: impl Into<TagSet>) -> Self {
        Self::StableAgainst {
            child: child.into(),
            parent: parent.into(),
        }
    }

    /// Returns the inverted predicate. Double negation cancels.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Negated(inner) => *inner,
            other => Self::Negated(Box::new(other)),
        }
    }

    /// Returns true if this predicate is negated.
    #[inline]
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        matches!(self, Self::Negated(_))
    }

    /// Strips any negation.
    #[must_use]
    pub fn positive(&self) -> &Self {
        match self {
            Self::Negated(inner) => inner.positive(),
            other => other,
        }
    }

    /// Returns true if an edge carrying `fact` satisfies this predicate.
    ///
    /// Negation is handled at clause level; a negated predicate is never
    /// satisfied by a single edge, and negated facts satisfy nothing.
    #[must_use]
    pub fn satisfied_by(&self, fact: &Self) -> bool {
        if fact.is_negated() {
            return false;
        }
        match self {
            Self::AnyRelation => true,
            Self::Touching => matches!(fact, Self::Touching | Self::StableAgainst { .. }),
            Self::StableAgainst { child, parent } => match fact {
                Self::StableAgainst {
                    child: fact_child,
                    parent: fact_parent,
                } => fact_child.implies(child) && fact_parent.implies(parent),
                _ => false,
            },
            Self::Negated(_) => false,
        }
    }

    /// Faces of the target used by this relation, if it is a support relation.
    #[must_use]
    pub fn parent_tags(&self) -> Option<&TagSet> {
        match self.positive() {
            Self::StableAgainst { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// Faces of the related entity used by this relation, if it is a support relation.
    #[must_use]
    pub fn child_tags(&self) -> Option<&TagSet> {
        match self.positive() {
            Self::StableAgainst { child, .. } => Some(child),
            _ => None,
        }
    }
}

impl Neg for Relation {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyRelation => f.write_str("AnyRelation"),
            Self::Touching => f.write_str("Touching"),
            Self::StableAgainst { child, parent } => write!(f, "StableAgainst({child}, {parent})"),
            Self::Negated(inner) => write!(f, "-{inner}"),
        }
    }
}

/// One stored relation from an entity to a target entity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationEdge {
    /// The relation fact.
    pub relation: Relation,
    /// The related entity.
    pub target: EntityKey,
}

impl RelationEdge {
    /// Creates an edge.
    #[must_use]
    pub fn new(relation: Relation, target: impl Into<EntityKey>) -> Self {
        Self {
            relation,
            target: target.into(),
        }
    }
}
