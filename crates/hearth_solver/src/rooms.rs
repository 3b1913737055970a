//! # Room Layout
//!
//! Turns room rules into room shells laid out in a row along +x, joined by
//! doors between neighbours, with one window per room.

use hearth_domain::vocab::all_room;
use hearth_domain::{Domain, EntityKey, Relation, Semantics};
use hearth_state::{BoundingBox, GeometryBackend, ObjectSpec, SceneState};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::constraints::{ConstraintGraph, RoomRule};
use crate::error::{SolveError, SolveResult};

/// Floor-to-ceiling height of every room, in metres.
pub const WALL_HEIGHT: f64 = 2.8;

/// Door leaf size (width, depth, height).
const DOOR_SIZE: [f64; 3] = [0.9, 0.1, 2.1];

/// Window size (width, depth, height).
const WINDOW_SIZE: [f64; 3] = [1.2, 0.1, 1.2];

/// Sill height of windows.
const WINDOW_SILL: f64 = 0.9;

fn corner_box(min: [f64; 3], size: [f64; 3]) -> BoundingBox {
    BoundingBox::new(min, [min[0] + size[0], min[1] + size[1], min[2] + size[2]])
}

/// Room rules whose rooms `rooms_domain` admits.
#[must_use]
pub fn admitted_rules<'a>(graph: &'a ConstraintGraph, rooms_domain: &Domain) -> Vec<&'a RoomRule> {
    graph
        .rooms
        .iter()
        .filter(|rule| rule.domain().witness().satisfies(rooms_domain))
        .collect()
}

/// Key prefix of rooms of `kind`, e.g. `living_room`.
fn key_prefix(kind: Semantics) -> String {
    let name = kind.name();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Draws room counts and sizes, then commits rooms, doors and windows.
///
/// Returns the room keys in layout order.
///
/// # Errors
///
/// Returns `Configuration` if no room rule is admitted by `rooms_domain`,
/// or `State` if a key collides.
pub fn layout_rooms<G, R>(
    backend: &mut G,
    state: &mut SceneState,
    graph: &ConstraintGraph,
    rooms_domain: &Domain,
    rng: &mut R,
) -> SolveResult<Vec<EntityKey>>
where
    G: GeometryBackend + ?Sized,
    R: Rng + ?Sized,
{
    let rules = admitted_rules(graph, rooms_domain);
    if rules.is_empty() {
        return Err(SolveError::Configuration(vec![format!(
            "no room rule is admitted by {rooms_domain}"
        )]));
    }

    let mut plan: Vec<(Semantics, f64)> = Vec::new();
    for rule in &rules {
        let n = rng.gen_range(rule.count.min..=rule.count.max.max(rule.count.min));
        for _ in 0..n {
            let (lo, hi) = rule.area;
            let area = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
            plan.push((rule.kind, area));
        }
    }
    if plan.is_empty() {
        // Every admitted rule allows zero rooms; a house still needs one.
        let rule = rules[rng.gen_range(0..rules.len())];
        plan.push((rule.kind, rule.area.0.max(1.0)));
    }
    plan.shuffle(rng);

    let mut keys = Vec::with_capacity(plan.len());
    let mut boxes = Vec::with_capacity(plan.len());
    let mut x = 0.0;
    for (kind, area) in plan {
        let aspect = rng.gen_range(0.75..1.33);
        let width = (area * aspect).sqrt();
        let depth = area / width;
        let bbox = corner_box([x, 0.0, 0.0], [width, depth, WALL_HEIGHT]);
        x += width;

        let key = state.next_key(&key_prefix(kind));
        let handle = backend.spawn_box(key.as_str(), bbox);
        state.insert(
            key.clone(),
            ObjectSpec::new()
                .with_geometry(handle)
                .with_tags([Semantics::Room, kind]),
        )?;
        debug!(key = %key, kind = %kind, area, "placed room");
        keys.push(key);
        boxes.push(bbox);
    }

    for (pair, b) in keys.windows(2).zip(&boxes) {
        let door = state.next_key("door");
        let y = b.min[1] + (b.size()[1] - DOOR_SIZE[0]).max(0.0) / 2.0;
        let bbox = corner_box(
            [b.max[0] - DOOR_SIZE[1] / 2.0, y, 0.0],
            [DOOR_SIZE[1], DOOR_SIZE[0], DOOR_SIZE[2]],
        );
        let handle = backend.spawn_box(door.as_str(), bbox);
        state.insert(
            door,
            ObjectSpec::new()
                .with_geometry(handle)
                .with_tags([Semantics::Door])
                .with_relation(Relation::Touching, pair[0].clone())
                .with_relation(Relation::Touching, pair[1].clone()),
        )?;
    }

    for (room, b) in keys.iter().zip(&boxes) {
        let window = state.next_key("window");
        let x = b.min[0] + (b.size()[0] - WINDOW_SIZE[0]).max(0.0) / 2.0;
        let bbox = corner_box(
            [x, b.min[1] - WINDOW_SIZE[1] / 2.0, WINDOW_SILL],
            WINDOW_SIZE,
        );
        let handle = backend.spawn_box(window.as_str(), bbox);
        state.insert(
            window,
            ObjectSpec::new()
                .with_geometry(handle)
                .with_tags([Semantics::Window])
                .with_relation(Relation::Touching, room.clone()),
        )?;
    }

    info!(rooms = keys.len(), "laid out rooms");
    Ok(keys)
}

/// Rooms committed in `state`, in key order.
#[must_use]
pub fn room_keys(state: &SceneState) -> Vec<EntityKey> {
    state.all_matching(&all_room())
}
