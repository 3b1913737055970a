//! # Constraint Vocabulary
//!
//! Named tag sets, relation predicates and base domains shared by stage
//! definitions and constraint programs.
//!
//! Predicates (`on_floor`, `on_wall`, ...) only constrain the parent faces and
//! are used in stage domains. Placement facts (`bottom_on_floor`, ...) also
//! name the child face and are what the solver stores on placed objects.

use crate::domain::Domain;
use crate::relation::Relation;
use crate::tags::{Semantics, Subpart, TagSet, VariableTag};

/// Faces things stand on.
#[must_use]
pub fn floor_tags() -> TagSet {
    TagSet::of([Subpart::SupportSurface])
}

/// Vertical room faces.
#[must_use]
pub fn wall_tags() -> TagSet {
    TagSet::of([Subpart::Wall]).without(Subpart::SupportSurface)
}

/// Ceiling faces.
#[must_use]
pub fn ceiling_tags() -> TagSet {
    TagSet::of([Subpart::Ceiling]).without(Subpart::SupportSurface)
}

/// Lateral object faces.
#[must_use]
pub fn side_tags() -> TagSet {
    TagSet::of([Subpart::Side]).without(Subpart::SupportSurface)
}

/// Stable against a floor.
#[must_use]
pub fn on_floor() -> Relation {
    Relation::stable_against(TagSet::new(), floor_tags())
}

/// Stable against a wall.
#[must_use]
pub fn on_wall() -> Relation {
    Relation::stable_against(TagSet::new(), wall_tags())
}

/// Stable against a ceiling.
#[must_use]
pub fn on_ceiling() -> Relation {
    Relation::stable_against(TagSet::new(), ceiling_tags())
}

/// Stable against the side of another object.
#[must_use]
pub fn side() -> Relation {
    Relation::stable_against(TagSet::new(), side_tags())
}

/// Bottom resting on any support surface.
#[must_use]
pub fn on() -> Relation {
    Relation::stable_against(Subpart::Bottom, Subpart::SupportSurface)
}

/// Bottom resting on the top of another object.
#[must_use]
pub fn ontop() -> Relation {
    Relation::stable_against(Subpart::Bottom, Subpart::Top)
}

/// Stored fact: bottom on a room floor.
#[must_use]
pub fn bottom_on_floor() -> Relation {
    Relation::stable_against(
        Subpart::Bottom,
        TagSet::of([Subpart::SupportSurface, Subpart::Floor]),
    )
}

/// Stored fact: back against a room wall.
#[must_use]
pub fn back_against_wall() -> Relation {
    Relation::stable_against(Subpart::Back, Subpart::Wall)
}

/// Stored fact: top against a room ceiling.
#[must_use]
pub fn top_on_ceiling() -> Relation {
    Relation::stable_against(Subpart::Top, Subpart::Ceiling)
}

/// Stored fact: back against the side of an object.
#[must_use]
pub fn back_against_side() -> Relation {
    Relation::stable_against(Subpart::Back, Subpart::Side)
}

/// Stored fact: bottom on the top face of an object.
#[must_use]
pub fn bottom_on_top() -> Relation {
    Relation::stable_against(Subpart::Bottom, Subpart::Top)
}

/// Stored fact: bottom on an internal support surface (shelf board, rack).
#[must_use]
pub fn bottom_on_support() -> Relation {
    Relation::stable_against(Subpart::Bottom, Subpart::SupportSurface)
}

/// "The room being furnished".
#[must_use]
pub fn variable_room() -> TagSet {
    TagSet::of([VariableTag::Room])
}

/// "The object being decorated".
#[must_use]
pub fn variable_obj() -> TagSet {
    TagSet::of([VariableTag::Object])
}

/// Every room.
#[must_use]
pub fn all_room() -> Domain {
    Domain::from_tags([Semantics::Room], [Semantics::Object])
}

/// Every placeable object.
#[must_use]
pub fn all_obj() -> Domain {
    Domain::from_tags([Semantics::Object], [Semantics::Room])
}

/// Rooms of one type.
#[must_use]
pub fn room_of(kind: Semantics) -> Domain {
    all_room().with_tags(kind)
}

/// Objects of one kind.
#[must_use]
pub fn obj_of(kind: Semantics) -> Domain {
    all_obj().with_tags(kind)
}
