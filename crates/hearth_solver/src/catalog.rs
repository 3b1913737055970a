//! # Stage Catalog
//!
//! The fixed, ordered set of greedy stages. Each stage is a domain; a domain
//! carrying variable tags is solved once per admissible binding.
//!
//! ## Stages
//!
//! | Stage | Covers |
//! |---|---|
//! | `rooms` | every room |
//! | `on_floor` | primary objects standing on a room floor |
//! | `on_wall` | primary objects against a wall, not floor or ceiling supported |
//! | `on_ceiling` | primary objects on a ceiling, not floor or wall supported |
//! | `side_obj` | secondary objects against the side of a primary object |
//! | `obj_ontop_obj` | secondary objects on the top of a primary object |
//! | `obj_on_support` | secondary objects on an inner support surface |
//!
//! Primary objects relate to a room and to no object; secondary objects
//! relate to a primary object.

use hearth_domain::vocab::{
    all_obj, all_room, on, on_ceiling, on_floor, on_wall, ontop, side, variable_obj,
    variable_room,
};
use hearth_domain::{Domain, Relation, VariableTag};

use crate::error::{SolveError, SolveResult};

/// Room shells.
pub const ROOMS: &str = "rooms";
/// Floor-standing primary objects.
pub const ON_FLOOR: &str = "on_floor";
/// Wall-mounted primary objects.
pub const ON_WALL: &str = "on_wall";
/// Ceiling-mounted primary objects.
pub const ON_CEILING: &str = "on_ceiling";
/// Secondary objects beside a primary object.
pub const SIDE_OBJ: &str = "side_obj";
/// Secondary objects on top of a primary object.
pub const OBJ_ONTOP_OBJ: &str = "obj_ontop_obj";
/// Secondary objects on an inner support surface.
pub const OBJ_ON_SUPPORT: &str = "obj_on_support";

/// Every variable used by the default stages.
pub const ALL_VARS: [VariableTag; 2] = [VariableTag::Room, VariableTag::Object];

/// Named stage domains in solve order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageCatalog {
    stages: Vec<(String, Domain)>,
}

impl StageCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stage, or replaces the domain of an existing one in place.
    pub fn insert(&mut self, name: &str, domain: Domain) {
        if let Some(slot) = self.stages.iter_mut().find(|(n, _)| n == name) {
            slot.1 = domain;
        } else {
            self.stages.push((name.to_string(), domain));
        }
    }

    /// Domain of stage `name`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStage` if the catalog has no such stage.
    pub fn get(&self, name: &str) -> SolveResult<&Domain> {
        self.stages
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
            .ok_or_else(|| SolveError::UnknownStage(name.to_string()))
    }

    /// Stages in solve order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Domain)> + '_ {
        self.stages.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Stage names in solve order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.stages.iter().map(|(n, _)| n.as_str())
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if there are no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Rewrites every stage domain.
    pub fn map_domains<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &Domain) -> Domain,
    {
        for (name, domain) in &mut self.stages {
            *domain = f(name, domain);
        }
    }
}

/// Builds the default greedy stages.
#[must_use]
pub fn default_greedy_stages() -> StageCatalog {
    let all_room = all_room();
    let all_obj = all_obj();

    let all_obj_in_room =
        all_obj.with_relation(Relation::AnyRelation, &all_room.with_tags(variable_room()));
    let primary = all_obj_in_room.without_relation(Relation::AnyRelation, &all_obj);

    let mut catalog = StageCatalog::new();
    catalog.insert(ROOMS, all_room.clone());
    catalog.insert(ON_FLOOR, primary.with_relation(on_floor(), &all_room));
    catalog.insert(
        ON_WALL,
        primary
            .without_relation(on_floor(), &all_room)
            .without_relation(on_ceiling(), &all_room)
            .with_relation(on_wall(), &all_room),
    );
    catalog.insert(
        ON_CEILING,
        primary
            .without_relation(on_floor(), &all_room)
            .with_relation(on_ceiling(), &all_room)
            .without_relation(on_wall(), &all_room),
    );

    let secondary = all_obj.with_relation(Relation::AnyRelation, &primary.with_tags(variable_obj()));
    catalog.insert(SIDE_OBJ, secondary.with_relation(side(), &all_obj));

    let nonside = secondary.without_relation(side(), &all_obj);
    catalog.insert(
        OBJ_ONTOP_OBJ,
        nonside
            .with_relation(ontop(), &all_obj)
            .without_relation(on(), &all_obj),
    );
    catalog.insert(
        OBJ_ON_SUPPORT,
        nonside
            .with_relation(on(), &all_obj)
            .without_relation(ontop(), &all_obj),
    );
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let catalog = default_greedy_stages();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(
            names,
            vec![ROOMS, ON_FLOOR, ON_WALL, ON_CEILING, SIDE_OBJ, OBJ_ONTOP_OBJ, OBJ_ON_SUPPORT]
        );
    }

    #[test]
    fn test_greedy_variables() {
        let catalog = default_greedy_stages();
        assert!(!catalog.get(ROOMS).unwrap().is_greedy());
        assert_eq!(
            catalog.get(ON_FLOOR).unwrap().variables().into_iter().collect::<Vec<_>>(),
            vec![VariableTag::Room]
        );
        assert_eq!(
            catalog.get(SIDE_OBJ).unwrap().variables().into_iter().collect::<Vec<_>>(),
            ALL_VARS.to_vec()
        );
    }

    #[test]
    fn test_unknown_stage() {
        let catalog = default_greedy_stages();
        assert!(matches!(catalog.get("tertiary"), Err(SolveError::UnknownStage(_))));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut catalog = default_greedy_stages();
        catalog.insert(ON_WALL, all_obj());
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog.get(ON_WALL).unwrap(), &all_obj());
        assert_eq!(catalog.names().nth(2), Some(ON_WALL));
    }
}
