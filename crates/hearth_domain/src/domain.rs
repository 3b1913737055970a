//! # Domains
//!
//! Immutable predicates over scene entities.
//!
//! A `Domain` is a conjunction of:
//!
//! - a `TagSet` the entity must satisfy,
//! - relation clauses `(relation, target)`, each requiring (or, when the
//!   relation is negated, forbidding) an edge from the entity to some entity
//!   matching `target`,
//! - excluded domains the entity must NOT match.
//!
//! "Forbidden relation" and "relation to a non-matching entity" are different
//! predicates: `d.without_relation(p, &t)` holds when no `p`-edge reaches a
//! `t` entity, while `d.with_relation(p, &-t)` holds when some `p`-edge
//! reaches an entity outside `t`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Neg;

use crate::error::{DomainError, DomainResult};
use crate::relation::Relation;
use crate::tags::{EntityKey, TagSet, VariableTag};

/// Maximum nesting depth accepted by `Domain::validate`.
pub const MAX_DOMAIN_DEPTH: usize = 16;

/// One relation requirement of a domain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationClause {
    /// The predicate; a negated predicate forbids the relation.
    pub relation: Relation,
    /// Entities the relation must (or must not) reach.
    pub target: Domain,
}

impl RelationClause {
    /// Returns true if this clause forbids the relation.
    #[inline]
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.relation.is_negated()
    }
}

/// A predicate over scene entities.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Domain {
    tags: TagSet,
    relations: Vec<RelationClause>,
    excludes: Vec<Domain>,
}

impl Domain {
    /// Creates a leaf domain from a tag set.
    #[must_use]
    pub fn new(tags: impl Into<TagSet>) -> Self {
        Self {
            tags: tags.into(),
            relations: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Creates a leaf domain from required and excluded tags.
    #[must_use]
    pub fn from_tags<R, E>(required: R, excluded: E) -> Self
    where
        R: IntoIterator,
        R::Item: Into<crate::tags::Tag>,
        E: IntoIterator,
        E::Item: Into<crate::tags::Tag>,
    {
        let tags = excluded
            .into_iter()
            .fold(TagSet::of(required), |set, tag| set.without(tag));
        Self::new(tags)
    }

    /// Tag requirements of the root entity.
    #[must_use]
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Relation clauses, in declaration order.
    #[must_use]
    pub fn relations(&self) -> &[RelationClause] {
        &self.relations
    }

    /// Excluded domains.
    #[must_use]
    pub fn excludes(&self) -> &[Domain] {
        &self.excludes
    }

    /// Clauses requiring a relation.
    pub fn positive_clauses(&self) -> impl Iterator<Item = &RelationClause> + '_ {
        self.relations.iter().filter(|c| !c.is_negated())
    }

    /// Clauses forbidding a relation.
    pub fn negated_clauses(&self) -> impl Iterator<Item = &RelationClause> + '_ {
        self.relations.iter().filter(|c| c.is_negated())
    }

    /// Returns a domain additionally requiring `relation` to an entity of `target`.
    ///
    /// Passing a negated relation forbids it instead.
    #[must_use]
    pub fn with_relation(&self, relation: Relation, target: &Domain) -> Self {
        let mut out = self.clone();
        out.relations.push(RelationClause {
            relation,
            target: target.clone(),
        });
        out
    }

    /// Returns a domain forbidding `relation` to any entity of `target`.
    #[must_use]
    pub fn without_relation(&self, relation: Relation, target: &Domain) -> Self {
        self.with_relation(relation.negate(), target)
    }

    /// Returns a domain additionally requiring (and excluding) the given tags.
    #[must_use]
    pub fn with_tags(&self, tags: impl Into<TagSet>) -> Self {
        let mut out = self.clone();
        out.tags = out.tags.union(&tags.into());
        out
    }

    /// Returns the complement domain.
    #[must_use]
    pub fn negate(self) -> Self {
        if self.tags.is_empty() && self.relations.is_empty() && self.excludes.len() == 1 {
            let mut excludes = self.excludes;
            return excludes.pop().unwrap_or_default();
        }
        Self {
            tags: TagSet::new(),
            relations: Vec::new(),
            excludes: vec![self],
        }
    }

    /// Variables mentioned anywhere in the tree.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<VariableTag> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<VariableTag>) {
        out.extend(self.tags.variables());
        for clause in &self.relations {
            clause.target.collect_variables(out);
        }
        for excluded in &self.excludes {
            excluded.collect_variables(out);
        }
    }

    /// Returns true if any variable is still unresolved.
    #[must_use]
    pub fn is_greedy(&self) -> bool {
        !self.variables().is_empty()
    }

    /// Binds `var` to `key` everywhere in the tree.
    #[must_use]
    pub fn substitute(&self, var: VariableTag, key: &EntityKey) -> Self {
        Self {
            tags: self.tags.substitute(var, key),
            relations: self
                .relations
                .iter()
                .map(|c| RelationClause {
                    relation: c.relation.clone(),
                    target: c.target.substitute(var, key),
                })
                .collect(),
            excludes: self.excludes.iter().map(|d| d.substitute(var, key)).collect(),
        }
    }

    /// The first sub-domain (pre-order) whose own tags require `var`.
    #[must_use]
    pub fn carrier(&self, var: VariableTag) -> Option<&Domain> {
        if self.tags.carries(var) {
            return Some(self);
        }
        self.relations
            .iter()
            .find_map(|c| c.target.carrier(var))
            .or_else(|| self.excludes.iter().find_map(|d| d.carrier(var)))
    }

    /// Rewrites every sub-domain whose own tags require `var`.
    #[must_use]
    pub fn map_carrier<F>(&self, var: VariableTag, f: &F) -> Self
    where
        F: Fn(&Domain) -> Domain,
    {
        let mut out = Self {
            tags: self.tags.clone(),
            relations: self
                .relations
                .iter()
                .map(|c| RelationClause {
                    relation: c.relation.clone(),
                    target: c.target.map_carrier(var, f),
                })
                .collect(),
            excludes: self.excludes.iter().map(|d| d.map_carrier(var, f)).collect(),
        };
        if out.tags.carries(var) {
            out = f(&out);
        }
        out
    }

    /// Nesting depth; a leaf domain has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        let nested = self
            .relations
            .iter()
            .map(|c| c.target.depth())
            .chain(self.excludes.iter().map(Domain::depth))
            .max()
            .unwrap_or(0);
        nested + 1
    }

    /// Checks the domain for structural errors.
    ///
    /// # Errors
    ///
    /// Returns an error for over-deep nesting, a tag both required and
    /// excluded, or a relation both required and forbidden on one target.
    pub fn validate(&self) -> DomainResult<()> {
        let depth = self.depth();
        if depth > MAX_DOMAIN_DEPTH {
            return Err(DomainError::TooDeep {
                depth,
                limit: MAX_DOMAIN_DEPTH,
            });
        }
        self.validate_node()
    }

    fn validate_node(&self) -> DomainResult<()> {
        if let Some(tag) = self.tags.contradictions().into_iter().next() {
            return Err(DomainError::ContradictoryTag { tag });
        }
        for (i, a) in self.relations.iter().enumerate() {
            for b in &self.relations[i + 1..] {
                if a.is_negated() != b.is_negated()
                    && a.relation.positive() == b.relation.positive()
                    && a.target == b.target
                {
                    return Err(DomainError::ContradictoryRelation {
                        relation: a.relation.positive().to_string(),
                    });
                }
            }
        }
        for clause in &self.relations {
            clause.target.validate_node()?;
        }
        for excluded in &self.excludes {
            excluded.validate_node()?;
        }
        Ok(())
    }
}

impl Neg for Domain {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl From<TagSet> for Domain {
    fn from(value: TagSet) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Domain({}", self.tags)?;
        for clause in &self.relations {
            write!(f, ", {} -> {}", clause.relation, clause.target)?;
        }
        for excluded in &self.excludes {
            write!(f, ", not {excluded}")?;
        }
        f.write_str(")")
    }
}
