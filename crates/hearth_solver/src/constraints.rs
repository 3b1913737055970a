//! # Constraint Graph
//!
//! What a house should contain: which rooms, and which objects against which
//! faces of which parents.
//!
//! ## Placement Rules
//!
//! A placement rule's object domain carries exactly one positive support
//! clause. Its relation is the fact stored on placed objects and its target
//! is the parent domain, e.g.
//!
//! ```rust,ignore
//! // 1..=4 cups on the top of any floor-standing table
//! PlacementRule::new(
//!     "table_tableware",
//!     obj_of(Semantics::Tableware).with_relation(bottom_on_top(), &floor_table),
//!     CountRange::new(1, 4),
//!     [0.25, 0.25, 0.1],
//! )
//! ```

use serde::{Deserialize, Serialize};

use hearth_domain::vocab::{
    all_room, back_against_side, back_against_wall, bottom_on_floor, bottom_on_support,
    bottom_on_top, obj_of, room_of, top_on_ceiling,
};
use hearth_domain::{Domain, Relation, RelationClause, Semantics, Subpart, Tag};
use hearth_state::BoundingBox;

/// Inclusive count bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Fewest acceptable.
    pub min: u32,
    /// Most acceptable.
    pub max: u32,
}

impl CountRange {
    /// Creates a range; `max` is raised to `min` if smaller.
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self {
            min,
            max: if max < min { min } else { max },
        }
    }

    /// Exactly `n`.
    #[must_use]
    pub const fn exactly(n: u32) -> Self {
        Self::new(n, n)
    }

    /// Returns true if `n` is within bounds.
    #[must_use]
    pub const fn contains(&self, n: u32) -> bool {
        n >= self.min && n <= self.max
    }

    /// Returns true unless `min` exceeds `max`, which only a hand-edited or
    /// deserialized range can do.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// How many rooms of one type, and how large.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomRule {
    /// Room type.
    pub kind: Semantics,
    /// Number of rooms.
    pub count: CountRange,
    /// Floor area bounds in square metres.
    pub area: (f64, f64),
}

impl RoomRule {
    /// Creates a room rule.
    #[must_use]
    pub const fn new(kind: Semantics, count: CountRange, area: (f64, f64)) -> Self {
        Self { kind, count, area }
    }

    /// Domain of rooms produced by this rule.
    #[must_use]
    pub fn domain(&self) -> Domain {
        room_of(self.kind)
    }
}

/// Which face of the parent a rule's objects occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurfaceKind {
    /// Room floor.
    Floor,
    /// Room walls.
    Wall,
    /// Room ceiling.
    Ceiling,
    /// Lateral faces of an object.
    Side,
    /// Top face of an object.
    Top,
    /// Internal support surfaces of an object (shelf boards).
    Support,
}

impl SurfaceKind {
    /// Classifies a support relation.
    #[must_use]
    pub fn of_relation(relation: &Relation) -> Option<Self> {
        let parent = relation.parent_tags()?;
        let has = |part: Subpart| parent.contains(&Tag::Subpart(part));
        let kind = if has(Subpart::Floor) {
            Self::Floor
        } else if has(Subpart::Wall) {
            Self::Wall
        } else if has(Subpart::Ceiling) {
            Self::Ceiling
        } else if has(Subpart::Side) {
            Self::Side
        } else if has(Subpart::Top) {
            Self::Top
        } else if has(Subpart::SupportSurface) {
            Self::Support
        } else {
            return None;
        };
        Some(kind)
    }

    /// Usable amount of this face on a parent with bounding box `b`.
    ///
    /// Area for horizontal faces, perimeter times height for walls, and
    /// twice depth times height for the sides of an object.
    #[must_use]
    pub fn capacity(self, b: &BoundingBox) -> f64 {
        let [x, y, z] = b.size();
        match self {
            Self::Floor | Self::Ceiling | Self::Top | Self::Support => x * y,
            Self::Wall => b.perimeter_xy() * z,
            Self::Side => 2.0 * y * z,
        }
    }

    /// Amount of this face an object of `size` occupies.
    #[must_use]
    pub fn footprint(self, size: [f64; 3]) -> f64 {
        match self {
            Self::Floor | Self::Ceiling | Self::Top | Self::Support => size[0] * size[1],
            Self::Wall | Self::Side => size[0] * size[2],
        }
    }
}

/// How many objects of one kind go against which face of which parents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementRule {
    /// Rule name; also the key prefix of placed objects.
    pub name: String,
    /// Domain of placed objects, carrying the support clause.
    pub object: Domain,
    /// Objects per parent.
    pub count: CountRange,
    /// Object size in metres (width, depth, height).
    pub size: [f64; 3],
}

impl PlacementRule {
    /// Creates a placement rule.
    #[must_use]
    pub fn new(name: &str, object: Domain, count: CountRange, size: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            object,
            count,
            size,
        }
    }

    /// The positive support clause, if the rule has exactly one.
    #[must_use]
    pub fn support_clause(&self) -> Option<&RelationClause> {
        let mut positive = self.object.positive_clauses();
        match (positive.next(), positive.next()) {
            (Some(clause), None) => Some(clause),
            _ => None,
        }
    }

    /// Parent domain of the support clause.
    #[must_use]
    pub fn parent(&self) -> Option<&Domain> {
        self.support_clause().map(|c| &c.target)
    }

    /// Face of the parent the objects occupy.
    #[must_use]
    pub fn surface(&self) -> Option<SurfaceKind> {
        self.support_clause()
            .and_then(|c| SurfaceKind::of_relation(&c.relation))
    }

    /// Tags given to placed objects.
    #[must_use]
    pub fn object_tags(&self) -> Vec<Tag> {
        self.object.tags().concrete().cloned().collect()
    }
}

/// Rooms and placements of one generation program.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintGraph {
    /// Room rules.
    pub rooms: Vec<RoomRule>,
    /// Placement rules.
    pub placements: Vec<PlacementRule>,
}

impl ConstraintGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a room rule.
    #[must_use]
    pub fn with_room(mut self, rule: RoomRule) -> Self {
        self.rooms.push(rule);
        self
    }

    /// Adds a placement rule.
    #[must_use]
    pub fn with_placement(mut self, rule: PlacementRule) -> Self {
        self.placements.push(rule);
        self
    }

    /// Keeps only placement rules whose name contains one of `filters`.
    #[must_use]
    pub fn filter_placements(&self, filters: &[String]) -> Self {
        Self {
            rooms: self.rooms.clone(),
            placements: self
                .placements
                .iter()
                .filter(|rule| filters.iter().any(|f| rule.name.contains(f.as_str())))
                .cloned()
                .collect(),
        }
    }

    /// Looks up a placement rule by name.
    #[must_use]
    pub fn placement(&self, name: &str) -> Option<&PlacementRule> {
        self.placements.iter().find(|rule| rule.name == name)
    }
}

/// Floor-standing objects of `kind` in rooms of `room`.
fn floor_obj(kind: Semantics, room: &Domain) -> Domain {
    obj_of(kind).with_relation(bottom_on_floor(), room)
}

/// The default household program.
#[must_use]
pub fn home_constraints() -> ConstraintGraph {
    let any_room = all_room();
    let bedroom = room_of(Semantics::Bedroom);
    let living = room_of(Semantics::LivingRoom);
    let kitchen = room_of(Semantics::Kitchen);
    let bathroom = room_of(Semantics::Bathroom);
    let dining = room_of(Semantics::DiningRoom);

    let any_table = floor_obj(Semantics::Table, &any_room);
    let dining_table = floor_obj(Semantics::Table, &dining);
    let kitchen_table = floor_obj(Semantics::Table, &kitchen);
    let nightstand = floor_obj(Semantics::Nightstand, &bedroom);
    let living_shelf = floor_obj(Semantics::Shelf, &living);
    let kitchen_storage = floor_obj(Semantics::Storage, &kitchen);
    let bathroom_storage = floor_obj(Semantics::Storage, &bathroom);

    let range = CountRange::new;

    ConstraintGraph::new()
        .with_room(RoomRule::new(Semantics::Bedroom, range(1, 2), (9.0, 16.0)))
        .with_room(RoomRule::new(Semantics::LivingRoom, range(1, 1), (16.0, 28.0)))
        .with_room(RoomRule::new(Semantics::Kitchen, range(1, 1), (9.0, 16.0)))
        .with_room(RoomRule::new(Semantics::Bathroom, range(1, 1), (4.0, 8.0)))
        .with_room(RoomRule::new(Semantics::DiningRoom, range(0, 1), (9.0, 14.0)))
        .with_room(RoomRule::new(Semantics::Hallway, range(0, 1), (4.0, 8.0)))
        // on the floor
        .with_placement(PlacementRule::new(
            "bedroom_bed",
            floor_obj(Semantics::Bed, &bedroom),
            range(1, 1),
            [1.6, 2.0, 0.6],
        ))
        .with_placement(PlacementRule::new(
            "bedroom_nightstand",
            floor_obj(Semantics::Nightstand, &bedroom),
            range(1, 2),
            [0.5, 0.4, 0.55],
        ))
        .with_placement(PlacementRule::new(
            "bedroom_storage",
            floor_obj(Semantics::Storage, &bedroom),
            range(0, 1),
            [1.2, 0.6, 2.0],
        ))
        .with_placement(PlacementRule::new(
            "living_sofa",
            floor_obj(Semantics::Sofa, &living),
            range(1, 2),
            [2.0, 0.9, 0.85],
        ))
        .with_placement(PlacementRule::new(
            "living_table",
            floor_obj(Semantics::Table, &living).with_tags(Semantics::Surface),
            range(1, 1),
            [1.2, 0.6, 0.45],
        ))
        .with_placement(PlacementRule::new(
            "living_shelf",
            floor_obj(Semantics::Shelf, &living),
            range(0, 2),
            [0.9, 0.35, 1.8],
        ))
        .with_placement(PlacementRule::new(
            "living_rug",
            floor_obj(Semantics::Rug, &living),
            range(0, 1),
            [2.0, 1.4, 0.01],
        ))
        .with_placement(PlacementRule::new(
            "kitchen_table",
            floor_obj(Semantics::Table, &kitchen),
            range(1, 1),
            [1.4, 0.8, 0.75],
        ))
        .with_placement(PlacementRule::new(
            "kitchen_storage",
            floor_obj(Semantics::Storage, &kitchen),
            range(1, 3),
            [0.8, 0.6, 0.9],
        ))
        .with_placement(PlacementRule::new(
            "dining_table",
            floor_obj(Semantics::Table, &dining),
            range(1, 1),
            [1.8, 0.9, 0.75],
        ))
        .with_placement(PlacementRule::new(
            "bathroom_storage",
            floor_obj(Semantics::Storage, &bathroom),
            range(0, 1),
            [0.6, 0.4, 0.8],
        ))
        .with_placement(PlacementRule::new(
            "room_plant",
            floor_obj(Semantics::Plant, &any_room),
            range(0, 2),
            [0.4, 0.4, 0.9],
        ))
        // on the walls
        .with_placement(PlacementRule::new(
            "wall_decoration",
            obj_of(Semantics::WallDecoration).with_relation(back_against_wall(), &any_room),
            range(0, 3),
            [0.8, 0.05, 0.6],
        ))
        .with_placement(PlacementRule::new(
            "bathroom_mirror",
            obj_of(Semantics::Mirror).with_relation(back_against_wall(), &bathroom),
            range(1, 1),
            [0.6, 0.04, 0.8],
        ))
        // on the ceiling
        .with_placement(PlacementRule::new(
            "ceiling_light",
            obj_of(Semantics::CeilingLight).with_relation(top_on_ceiling(), &any_room),
            range(1, 1),
            [0.4, 0.4, 0.2],
        ))
        // beside furniture
        .with_placement(PlacementRule::new(
            "dining_chair",
            obj_of(Semantics::Chair).with_relation(back_against_side(), &dining_table),
            range(2, 6),
            [0.45, 0.5, 0.9],
        ))
        .with_placement(PlacementRule::new(
            "kitchen_chair",
            obj_of(Semantics::Chair).with_relation(back_against_side(), &kitchen_table),
            range(0, 4),
            [0.45, 0.5, 0.9],
        ))
        // on top of furniture
        .with_placement(PlacementRule::new(
            "table_tableware",
            obj_of(Semantics::Tableware).with_relation(bottom_on_top(), &any_table),
            range(0, 4),
            [0.25, 0.25, 0.1],
        ))
        .with_placement(PlacementRule::new(
            "nightstand_lamp",
            obj_of(Semantics::Lamp).with_relation(bottom_on_top(), &nightstand),
            range(0, 1),
            [0.3, 0.3, 0.5],
        ))
        // on internal support surfaces
        .with_placement(PlacementRule::new(
            "shelf_books",
            obj_of(Semantics::Book).with_relation(bottom_on_support(), &living_shelf),
            range(1, 8),
            [0.2, 0.15, 0.25],
        ))
        .with_placement(PlacementRule::new(
            "kitchen_storage_tableware",
            obj_of(Semantics::Tableware).with_relation(bottom_on_support(), &kitchen_storage),
            range(0, 4),
            [0.25, 0.25, 0.1],
        ))
        .with_placement(PlacementRule::new(
            "bathroom_towel",
            obj_of(Semantics::Towel).with_relation(bottom_on_support(), &bathroom_storage),
            range(0, 2),
            [0.4, 0.3, 0.1],
        ))
}
