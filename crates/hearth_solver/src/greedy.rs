//! # Greedy Assignments
//!
//! A greedy stage is solved once per binding of its variables. Variables
//! are bound in dependency order (a room before the objects in it); each
//! variable's candidates are the committed entities matching its carrier
//! domain under the bindings made so far.
//!
//! Enumeration runs eagerly against the state as it is when called, so
//! entities committed while the assignments are being solved never show up
//! as later candidates.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use hearth_domain::{Domain, EntityKey, SceneView, TagSet, VariableTag};
use rand::seq::index;
use rand::Rng;
use tracing::{debug, info};

use crate::catalog::StageCatalog;
use crate::checks::variable_order;
use crate::constraints::ConstraintGraph;
use crate::error::SolveResult;

/// Cap on candidates per variable. Variables without a cap enumerate all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentLimits {
    per_variable: BTreeMap<VariableTag, usize>,
}

impl AssignmentLimits {
    /// No caps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps `var` at `limit` candidates.
    #[must_use]
    pub fn with_limit(mut self, var: VariableTag, limit: usize) -> Self {
        self.per_variable.insert(var, limit);
        self
    }

    /// Cap of `var`, if any.
    #[must_use]
    pub fn limit(&self, var: VariableTag) -> Option<usize> {
        self.per_variable.get(&var).copied()
    }
}

/// One binding of variables to committed entities.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Assignment(BTreeMap<VariableTag, EntityKey>);

impl Assignment {
    /// The empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the binding with `var` bound to `key`.
    #[must_use]
    pub fn bind(mut self, var: VariableTag, key: impl Into<EntityKey>) -> Self {
        self.0.insert(var, key.into());
        self
    }

    /// Entity bound to `var`.
    #[must_use]
    pub fn get(&self, var: VariableTag) -> Option<&EntityKey> {
        self.0.get(&var)
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Substitutes every binding into `domain`.
    #[must_use]
    pub fn apply(&self, domain: &Domain) -> Domain {
        self.0
            .iter()
            .fold(domain.clone(), |d, (var, key)| d.substitute(*var, key))
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, key)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var}={key}")?;
        }
        write!(f, "}}")
    }
}

/// Snapshot of every assignment of one stage, cheap to clone and restart.
#[derive(Clone, Debug)]
pub struct Assignments {
    items: Arc<[Assignment]>,
    cursor: usize,
}

impl Assignments {
    fn new(items: Vec<Assignment>) -> Self {
        Self {
            items: items.into(),
            cursor: 0,
        }
    }

    /// Every assignment, including those already yielded.
    #[must_use]
    pub fn as_slice(&self) -> &[Assignment] {
        &self.items
    }

    /// Rewinds to the first assignment.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for Assignments {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.items.len() - self.cursor;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Assignments {}

/// Enumerates the bindings of `vars` in `domain` against `view`.
///
/// Candidates are visited in key order. A capped variable keeps a random
/// subset of its candidates, still in key order. When a variable has no
/// candidates, the branch yields nothing if `nonempty`, else the variable is
/// left unbound.
///
/// # Errors
///
/// Returns `Configuration` if the variables depend on each other cyclically.
pub fn iterate_assignments<R: Rng + ?Sized>(
    domain: &Domain,
    view: &dyn SceneView,
    vars: &[VariableTag],
    limits: &AssignmentLimits,
    nonempty: bool,
    rng: &mut R,
) -> SolveResult<Assignments> {
    let present = domain.variables();
    let wanted: Vec<VariableTag> = vars.iter().copied().filter(|v| present.contains(v)).collect();
    let order = variable_order([domain], &wanted)?;

    let mut out = Vec::new();
    let mut walk = Walk {
        view,
        order: &order,
        limits,
        nonempty,
        rng,
    };
    walk.visit(domain, 0, &mut Assignment::new(), &mut out);

    debug!(count = out.len(), vars = order.len(), "enumerated assignments");
    Ok(Assignments::new(out))
}

struct Walk<'a, R: ?Sized> {
    view: &'a dyn SceneView,
    order: &'a [VariableTag],
    limits: &'a AssignmentLimits,
    nonempty: bool,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Walk<'_, R> {
    fn visit(
        &mut self,
        domain: &Domain,
        depth: usize,
        current: &mut Assignment,
        out: &mut Vec<Assignment>,
    ) {
        let Some(&var) = self.order.get(depth) else {
            out.push(current.clone());
            return;
        };
        let Some(carrier) = domain.carrier(var) else {
            self.visit(domain, depth + 1, current, out);
            return;
        };

        let mut candidates = carrier.matching_keys(self.view);
        if let Some(cap) = self.limits.limit(var) {
            if candidates.len() > cap {
                let mut picked = index::sample(&mut *self.rng, candidates.len(), cap).into_vec();
                picked.sort_unstable();
                candidates = picked.into_iter().map(|i| candidates[i].clone()).collect();
            }
        }

        if candidates.is_empty() {
            if !self.nonempty {
                self.visit(domain, depth + 1, current, out);
            }
            return;
        }

        for key in candidates {
            let bound = domain.substitute(var, &key);
            current.0.insert(var, key);
            self.visit(&bound, depth + 1, current, out);
            current.0.remove(&var);
        }
    }
}

/// Narrows every carrier of `var` in the catalog to entities also carrying
/// `tags`.
pub fn apply_greedy_restriction(catalog: &mut StageCatalog, tags: &TagSet, var: VariableTag) {
    info!(var = %var, tags = %tags, "restricting greedy variable");
    let narrow = |carrier: &Domain| carrier.with_tags(tags.clone());
    catalog.map_domains(|_, domain| domain.map_carrier(var, &narrow));
}

/// Narrowing applied before solving, for debugging and partial runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Restrictions {
    /// Only furnish rooms carrying these tags.
    pub parent_rooms: Option<TagSet>,
    /// Only decorate parent objects carrying these tags.
    pub parent_objs: Option<TagSet>,
    /// Furnish at most this many rooms per stage.
    pub max_rooms: Option<usize>,
    /// Decorate at most this many parent objects per room.
    pub max_parent_objs: Option<usize>,
    /// Only keep placement rules whose name contains one of these.
    pub placement_filters: Option<Vec<String>>,
}

/// Applies `restrictions` to the catalog and constraint graph, and returns
/// the assignment caps they imply.
#[must_use]
pub fn restrict_solving(
    mut catalog: StageCatalog,
    graph: ConstraintGraph,
    restrictions: &Restrictions,
) -> (StageCatalog, ConstraintGraph, AssignmentLimits) {
    if let Some(tags) = &restrictions.parent_rooms {
        apply_greedy_restriction(&mut catalog, tags, VariableTag::Room);
    }
    if let Some(tags) = &restrictions.parent_objs {
        apply_greedy_restriction(&mut catalog, tags, VariableTag::Object);
    }

    let mut limits = AssignmentLimits::new();
    if let Some(n) = restrictions.max_rooms {
        limits = limits.with_limit(VariableTag::Room, n);
    }
    if let Some(n) = restrictions.max_parent_objs {
        limits = limits.with_limit(VariableTag::Object, n);
    }

    let graph = match &restrictions.placement_filters {
        Some(filters) => {
            let filtered = graph.filter_placements(filters);
            info!(
                kept = filtered.placements.len(),
                total = graph.placements.len(),
                "filtered placement rules"
            );
            filtered
        }
        None => graph,
    };
    (catalog, graph, limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{default_greedy_stages, ALL_VARS, ON_FLOOR, SIDE_OBJ};
    use crate::constraints::home_constraints;
    use hearth_domain::vocab::bottom_on_floor;
    use hearth_domain::Semantics;
    use hearth_state::{ObjectSpec, SceneState};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;

    fn house() -> SceneState {
        let mut state = SceneState::new();
        for (key, kind) in [
            ("bedroom_0000", Semantics::Bedroom),
            ("kitchen_0001", Semantics::Kitchen),
            ("living_room_0002", Semantics::LivingRoom),
        ] {
            state
                .insert(key.into(), ObjectSpec::new().with_tags([Semantics::Room, kind]))
                .unwrap();
        }
        state
            .insert(
                "table_0003".into(),
                ObjectSpec::new()
                    .with_tags([Semantics::Object, Semantics::Table])
                    .with_relation(bottom_on_floor(), "kitchen_0001"),
            )
            .unwrap();
        state
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0)
    }

    #[test]
    fn test_rooms_in_key_order() {
        let state = house();
        let catalog = default_greedy_stages();
        let domain = catalog.get(ON_FLOOR).unwrap();
        let got: Vec<String> = iterate_assignments(
            domain,
            &state,
            &ALL_VARS,
            &AssignmentLimits::new(),
            false,
            &mut rng(),
        )
        .unwrap()
        .map(|a| a.to_string())
        .collect();
        assert_eq!(
            got,
            vec![
                "{var:room=bedroom_0000}",
                "{var:room=kitchen_0001}",
                "{var:room=living_room_0002}"
            ]
        );
    }

    #[test]
    fn test_object_bound_inside_room() {
        let state = house();
        let catalog = default_greedy_stages();
        let all: Vec<Assignment> = iterate_assignments(
            catalog.get(SIDE_OBJ).unwrap(),
            &state,
            &ALL_VARS,
            &AssignmentLimits::new(),
            true,
            &mut rng(),
        )
        .unwrap()
        .collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get(VariableTag::Room).map(EntityKey::as_str), Some("kitchen_0001"));
        assert_eq!(all[0].get(VariableTag::Object).map(EntityKey::as_str), Some("table_0003"));
    }

    #[test]
    fn test_empty_candidates_without_nonempty() {
        let state = house();
        let catalog = default_greedy_stages();
        let all: Vec<Assignment> = iterate_assignments(
            catalog.get(SIDE_OBJ).unwrap(),
            &state,
            &ALL_VARS,
            &AssignmentLimits::new(),
            false,
            &mut rng(),
        )
        .unwrap()
        .collect();
        // Bedroom and living room have no objects; the object stays unbound.
        assert_eq!(all.len(), 3);
        assert!(all.iter().filter(|a| a.len() == 1).count() == 2);
    }

    #[test]
    fn test_limit_keeps_subset_in_key_order() {
        let state = house();
        let catalog = default_greedy_stages();
        let limits = AssignmentLimits::new().with_limit(VariableTag::Room, 2);
        let rooms: Vec<EntityKey> = iterate_assignments(
            catalog.get(ON_FLOOR).unwrap(),
            &state,
            &ALL_VARS,
            &limits,
            true,
            &mut rng(),
        )
        .unwrap()
        .filter_map(|a| a.get(VariableTag::Room).cloned())
        .collect();
        assert_eq!(rooms.len(), 2);
        assert!(rooms[0] < rooms[1]);
    }

    #[test]
    fn test_capped_sample_follows_seed() {
        let state = house();
        let catalog = default_greedy_stages();
        let limits = AssignmentLimits::new().with_limit(VariableTag::Room, 2);
        let sample = |seed: u64| -> Vec<Assignment> {
            iterate_assignments(
                catalog.get(ON_FLOOR).unwrap(),
                &state,
                &ALL_VARS,
                &limits,
                true,
                &mut ChaCha8Rng::seed_from_u64(seed),
            )
            .unwrap()
            .collect()
        };

        assert_eq!(sample(7), sample(7));
        assert_eq!(sample(7).len(), 2);

        let subsets: BTreeSet<Vec<String>> = (0..32)
            .map(|seed| sample(seed).iter().map(ToString::to_string).collect())
            .collect();
        assert!(subsets.len() > 1);
    }

    #[test]
    fn test_snapshot_restarts() {
        let state = house();
        let catalog = default_greedy_stages();
        let mut it = iterate_assignments(
            catalog.get(ON_FLOOR).unwrap(),
            &state,
            &ALL_VARS,
            &AssignmentLimits::new(),
            true,
            &mut rng(),
        )
        .unwrap();
        assert_eq!(it.len(), 3);
        let first = it.next();
        it.by_ref().for_each(drop);
        it.restart();
        assert_eq!(it.next(), first);
    }

    #[test]
    fn test_restrict_solving() {
        let restrictions = Restrictions {
            parent_rooms: Some(TagSet::of([Semantics::Kitchen])),
            max_parent_objs: Some(1),
            placement_filters: Some(vec!["kitchen".to_string()]),
            ..Restrictions::default()
        };
        let (catalog, graph, limits) =
            restrict_solving(default_greedy_stages(), home_constraints(), &restrictions);

        let state = house();
        let rooms: Vec<Assignment> = iterate_assignments(
            catalog.get(ON_FLOOR).unwrap(),
            &state,
            &ALL_VARS,
            &limits,
            true,
            &mut rng(),
        )
        .unwrap()
        .collect();
        assert_eq!(rooms.len(), 1);
        assert_eq!(limits.limit(VariableTag::Object), Some(1));
        assert_eq!(limits.limit(VariableTag::Room), None);
        assert!(graph.placements.iter().all(|r| r.name.contains("kitchen")));
    }
}
