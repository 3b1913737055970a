//! # Tags
//!
//! The closed tag vocabulary and the `TagSet` algebra built on it.
//!
//! ## Tag Kinds
//!
//! - **Semantics**: what an entity is (`Room`, `Bedroom`, `Table`, ...)
//! - **Subpart**: which face of an entity a relation uses (`Wall`, `Top`, ...)
//! - **Variable**: an unresolved greedy binding (`Room`, `Object`)
//! - **SpecificObject**: one concrete entity, produced by binding a variable
//!
//! A `TagSet` is a conjunction: every included tag must be present and no
//! excluded tag may be present.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Stable identity of one entity within a scene state.
///
/// Ordering is lexicographic on the key text; enumeration relies on it to
/// stay independent of storage insertion order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// Creates a key from any string-like value.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Semantic class of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Semantics {
    /// Any room shell.
    Room,
    /// Any placeable object.
    Object,
    /// Bedroom room type.
    Bedroom,
    /// Living room room type.
    LivingRoom,
    /// Kitchen room type.
    Kitchen,
    /// Bathroom room type.
    Bathroom,
    /// Dining room room type.
    DiningRoom,
    /// Hallway room type.
    Hallway,
    /// Closet room type.
    Closet,
    /// Garage room type.
    Garage,
    /// Office room type.
    Office,
    /// Table furniture.
    Table,
    /// Chair furniture.
    Chair,
    /// Bed furniture.
    Bed,
    /// Sofa furniture.
    Sofa,
    /// Shelf furniture.
    Shelf,
    /// Storage furniture (cabinets, wardrobes).
    Storage,
    /// Desk furniture.
    Desk,
    /// Nightstand furniture.
    Nightstand,
    /// Free-standing or side lamp.
    Lamp,
    /// Ceiling-mounted light.
    CeilingLight,
    /// Wall-hung decoration.
    WallDecoration,
    /// Mirror.
    Mirror,
    /// Rug.
    Rug,
    /// Potted plant.
    Plant,
    /// Plates, cups, bowls.
    Tableware,
    /// Book.
    Book,
    /// Towel.
    Towel,
    /// Door between rooms.
    Door,
    /// Window in an exterior wall.
    Window,
    /// Staircase.
    Stairs,
    /// Anything offering a usable top surface.
    Surface,
    /// Bottle.
    Bottle,
    /// The object cameras should follow.
    FocusObject,
    /// Placeholder whose final asset is generated after its children are solved.
    AssetPlaceholderForChildren,
}

impl Semantics {
    /// Every semantic tag, in declaration order.
    pub const ALL: [Self; 35] = [
        Self::Room,
        Self::Object,
        Self::Bedroom,
        Self::LivingRoom,
        Self::Kitchen,
        Self::Bathroom,
        Self::DiningRoom,
        Self::Hallway,
        Self::Closet,
        Self::Garage,
        Self::Office,
        Self::Table,
        Self::Chair,
        Self::Bed,
        Self::Sofa,
        Self::Shelf,
        Self::Storage,
        Self::Desk,
        Self::Nightstand,
        Self::Lamp,
        Self::CeilingLight,
        Self::WallDecoration,
        Self::Mirror,
        Self::Rug,
        Self::Plant,
        Self::Tableware,
        Self::Book,
        Self::Towel,
        Self::Door,
        Self::Window,
        Self::Stairs,
        Self::Surface,
        Self::Bottle,
        Self::FocusObject,
        Self::AssetPlaceholderForChildren,
    ];

    /// Room types that carry furniture programs in the default constraints.
    pub const SUPPORTED_ROOM_TYPES: [Self; 5] = [
        Self::Bedroom,
        Self::LivingRoom,
        Self::Kitchen,
        Self::Bathroom,
        Self::DiningRoom,
    ];

    /// Returns the tag name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Room => "Room",
            Self::Object => "Object",
            Self::Bedroom => "Bedroom",
            Self::LivingRoom => "LivingRoom",
            Self::Kitchen => "Kitchen",
            Self::Bathroom => "Bathroom",
            Self::DiningRoom => "DiningRoom",
            Self::Hallway => "Hallway",
            Self::Closet => "Closet",
            Self::Garage => "Garage",
            Self::Office => "Office",
            Self::Table => "Table",
            Self::Chair => "Chair",
            Self::Bed => "Bed",
            Self::Sofa => "Sofa",
            Self::Shelf => "Shelf",
            Self::Storage => "Storage",
            Self::Desk => "Desk",
            Self::Nightstand => "Nightstand",
            Self::Lamp => "Lamp",
            Self::CeilingLight => "CeilingLight",
            Self::WallDecoration => "WallDecoration",
            Self::Mirror => "Mirror",
            Self::Rug => "Rug",
            Self::Plant => "Plant",
            Self::Tableware => "Tableware",
            Self::Book => "Book",
            Self::Towel => "Towel",
            Self::Door => "Door",
            Self::Window => "Window",
            Self::Stairs => "Stairs",
            Self::Surface => "Surface",
            Self::Bottle => "Bottle",
            Self::FocusObject => "FocusObject",
            Self::AssetPlaceholderForChildren => "AssetPlaceholderForChildren",
        }
    }

    /// Returns true for room types (not the generic `Room` marker).
    #[must_use]
    pub const fn is_room_type(self) -> bool {
        matches!(
            self,
            Self::Bedroom
                | Self::LivingRoom
                | Self::Kitchen
                | Self::Bathroom
                | Self::DiningRoom
                | Self::Hallway
                | Self::Closet
                | Self::Garage
                | Self::Office
        )
    }
}

impl fmt::Display for Semantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Semantics {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::UnknownSemantics(wanted.to_string()))
    }
}

/// Face or part of an entity that a relation attaches to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subpart {
    /// Horizontal surface things can stand on.
    SupportSurface,
    /// Vertical room boundary.
    Wall,
    /// Room ceiling.
    Ceiling,
    /// Room floor.
    Floor,
    /// Upper face of an object.
    Top,
    /// Lower face of an object.
    Bottom,
    /// Rear face of an object.
    Back,
    /// Front face of an object.
    Front,
    /// Lateral face of an object.
    Side,
    /// Faces visible from inside the room.
    Visible,
    /// Interior (enclosed) faces.
    Interior,
}

impl fmt::Display for Subpart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Marker for an unresolved greedy binding.
///
/// A domain carrying one of these denotes one sub-problem per admissible
/// entity, not one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariableTag {
    /// "The room being furnished".
    Room,
    /// "The object being decorated".
    Object,
}

impl VariableTag {
    /// Returns the variable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Object => "obj",
        }
    }
}

impl fmt::Display for VariableTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var:{}", self.name())
    }
}

/// One tag of the closed vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// Semantic class.
    Semantics(Semantics),
    /// Entity face.
    Subpart(Subpart),
    /// Unresolved greedy variable.
    Variable(VariableTag),
    /// Exactly this entity.
    SpecificObject(EntityKey),
}

impl Tag {
    /// Returns true for tags an entity can physically carry.
    ///
    /// Variables and specific-object tags only appear in domains.
    #[inline]
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        matches!(self, Self::Semantics(_) | Self::Subpart(_))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantics(s) => write!(f, "{s}"),
            Self::Subpart(s) => write!(f, "Subpart.{s}"),
            Self::Variable(v) => write!(f, "{v}"),
            Self::SpecificObject(k) => write!(f, "obj:{k}"),
        }
    }
}

impl From<Semantics> for Tag {
    fn from(value: Semantics) -> Self {
        Self::Semantics(value)
    }
}

impl From<Subpart> for Tag {
    fn from(value: Subpart) -> Self {
        Self::Subpart(value)
    }
}

impl From<VariableTag> for Tag {
    fn from(value: VariableTag) -> Self {
        Self::Variable(value)
    }
}

impl From<EntityKey> for Tag {
    fn from(value: EntityKey) -> Self {
        Self::SpecificObject(value)
    }
}

/// Required and excluded tags, read as a conjunction.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagSet {
    include: BTreeSet<Tag>,
    exclude: BTreeSet<Tag>,
}

impl TagSet {
    /// Creates an empty tag set (admits everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tag set requiring every given tag.
    #[must_use]
    pub fn of<T: Into<Tag>>(tags: impl IntoIterator<Item = T>) -> Self {
        Self {
            include: tags.into_iter().map(Into::into).collect(),
            exclude: BTreeSet::new(),
        }
    }

    /// Adds a required tag.
    #[must_use]
    pub fn with(mut self, tag: impl Into<Tag>) -> Self {
        self.include.insert(tag.into());
        self
    }

    /// Adds an excluded tag.
    #[must_use]
    pub fn without(mut self, tag: impl Into<Tag>) -> Self {
        self.exclude.insert(tag.into());
        self
    }

    /// Required tags.
    #[must_use]
    pub fn included(&self) -> &BTreeSet<Tag> {
        &self.include
    }

    /// Excluded tags.
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<Tag> {
        &self.exclude
    }

    /// Returns true if `tag` is required.
    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.include.contains(tag)
    }

    /// Returns true if `tag` is excluded.
    #[must_use]
    pub fn excludes(&self, tag: &Tag) -> bool {
        self.exclude.contains(tag)
    }

    /// Returns true if nothing is required or excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Conjunction of two tag sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            include: self.include.union(&other.include).cloned().collect(),
            exclude: self.exclude.union(&other.exclude).cloned().collect(),
        }
    }

    /// Tags that are both required and excluded.
    #[must_use]
    pub fn contradictions(&self) -> Vec<Tag> {
        self.include.intersection(&self.exclude).cloned().collect()
    }

    /// Returns true if every entity described by `self` also satisfies `query`.
    ///
    /// `self` is read as facts: its required tags are what the entity has.
    #[must_use]
    pub fn implies(&self, query: &Self) -> bool {
        query.include.is_subset(&self.include) && query.exclude.is_disjoint(&self.include)
    }

    /// Returns true if an entity with this key and tags satisfies the set.
    ///
    /// Unresolved variables impose no constraint.
    #[must_use]
    pub fn admits(&self, key: &EntityKey, tags: &BTreeSet<Tag>) -> bool {
        let required = self.include.iter().all(|tag| match tag {
            Tag::Variable(_) => true,
            Tag::SpecificObject(k) => k == key,
            other => tags.contains(other),
        });
        required
            && self.exclude.iter().all(|tag| match tag {
                Tag::Variable(_) => true,
                Tag::SpecificObject(k) => k != key,
                other => !tags.contains(other),
            })
    }

    /// Variables mentioned by this set.
    pub fn variables(&self) -> impl Iterator<Item = VariableTag> + '_ {
        self.include.iter().chain(self.exclude.iter()).filter_map(|tag| match tag {
            Tag::Variable(v) => Some(*v),
            _ => None,
        })
    }

    /// Returns true if `var` is required by this set.
    #[must_use]
    pub fn carries(&self, var: VariableTag) -> bool {
        self.include.contains(&Tag::Variable(var))
    }

    /// The specific entity this set pins, if any.
    #[must_use]
    pub fn specific_object(&self) -> Option<&EntityKey> {
        self.include.iter().find_map(|tag| match tag {
            Tag::SpecificObject(k) => Some(k),
            _ => None,
        })
    }

    /// Required tags an entity can physically carry.
    pub fn concrete(&self) -> impl Iterator<Item = &Tag> + '_ {
        self.include.iter().filter(|tag| tag.is_concrete())
    }

    /// Replaces `var` with a specific entity.
    #[must_use]
    pub fn substitute(&self, var: VariableTag, key: &EntityKey) -> Self {
        let swap = |set: &BTreeSet<Tag>| {
            set.iter()
                .map(|tag| match tag {
                    Tag::Variable(v) if *v == var => Tag::SpecificObject(key.clone()),
                    other => other.clone(),
                })
                .collect()
        };
        Self {
            include: swap(&self.include),
            exclude: swap(&self.exclude),
        }
    }

    /// Drops `var` from the set without binding it.
    #[must_use]
    pub fn forget(&self, var: VariableTag) -> Self {
        let tag = Tag::Variable(var);
        let mut out = self.clone();
        out.include.remove(&tag);
        out.exclude.remove(&tag);
        out
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for tag in &self.include {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{tag}")?;
            first = false;
        }
        for tag in &self.exclude {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "-{tag}")?;
            first = false;
        }
        f.write_str("}")
    }
}

impl From<Tag> for TagSet {
    fn from(value: Tag) -> Self {
        Self::of([value])
    }
}

impl From<Semantics> for TagSet {
    fn from(value: Semantics) -> Self {
        Self::of([value])
    }
}

impl From<Subpart> for TagSet {
    fn from(value: Subpart) -> Self {
        Self::of([value])
    }
}

impl From<VariableTag> for TagSet {
    fn from(value: VariableTag) -> Self {
        Self::of([value])
    }
}
