//! # Domain Error Types
//!
//! Errors raised while validating domains. Matching itself is infallible.

use thiserror::Error;

use crate::tags::Tag;

/// Errors that can occur when validating or parsing domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A tag is both required and excluded somewhere in the domain tree.
    #[error("tag {tag} is both required and excluded")]
    ContradictoryTag {
        /// The offending tag.
        tag: Tag,
    },

    /// The same relation clause is both required and forbidden on one domain.
    #[error("relation {relation} is both required and forbidden against the same target")]
    ContradictoryRelation {
        /// Display form of the relation.
        relation: String,
    },

    /// Domain nesting exceeds the evaluation limit.
    #[error("domain nesting depth {depth} exceeds limit {limit}")]
    TooDeep {
        /// Measured depth.
        depth: usize,
        /// Allowed depth.
        limit: usize,
    },

    /// A semantic tag name could not be parsed.
    #[error("unknown semantic tag `{0}`")]
    UnknownSemantics(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
