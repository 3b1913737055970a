//! # Configuration Checks
//!
//! Run once, after the catalog is built and before anything is solved.
//! Every problem found is collected into one `SolveError::Configuration`.
//!
//! ## Checks
//!
//! 1. Every stage domain is well formed and satisfiable in principle
//! 2. Every declared variable appears in at least one stage
//! 3. The variable dependency graph is acyclic
//! 4. Every placement rule has exactly one positive support clause
//! 5. Every placement rule's objects fall into exactly one greedy stage
//! 6. Every greedy stage is reached by some rule, and `rooms` admits a room rule

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hearth_domain::{Domain, EntityKey, VariableTag};
use hearth_state::SceneState;
use tracing::{info, warn};

use crate::catalog::{StageCatalog, ROOMS};
use crate::constraints::ConstraintGraph;
use crate::error::{SolveError, SolveResult};

/// "Variable A is bound before variable B" edges.
///
/// A variable depends on every other variable nested in its carrier domain:
/// its candidates can only be enumerated once those are bound.
#[derive(Clone, Debug, Default)]
pub struct VariableGraph {
    nodes: BTreeSet<VariableTag>,
    edges: BTreeMap<VariableTag, BTreeSet<VariableTag>>,
}

impl VariableGraph {
    /// Builds the graph of `vars` over every domain.
    pub fn build<'a>(domains: impl IntoIterator<Item = &'a Domain>, vars: &[VariableTag]) -> Self {
        let nodes: BTreeSet<VariableTag> = vars.iter().copied().collect();
        let mut edges: BTreeMap<VariableTag, BTreeSet<VariableTag>> = BTreeMap::new();

        for domain in domains {
            for var in domain.variables() {
                if !nodes.contains(&var) {
                    continue;
                }
                let Some(carrier) = domain.carrier(var) else {
                    continue;
                };
                for inner in carrier.variables() {
                    if inner != var && nodes.contains(&inner) {
                        edges.entry(inner).or_default().insert(var);
                    }
                }
            }
        }
        Self { nodes, edges }
    }

    /// Binding order (Kahn's algorithm), or a cycle if there is none.
    ///
    /// # Errors
    ///
    /// Returns the variables of one cycle, first variable repeated at the end.
    pub fn order(&self) -> Result<Vec<VariableTag>, Vec<VariableTag>> {
        let mut in_degree: BTreeMap<VariableTag, usize> =
            self.nodes.iter().map(|v| (*v, 0)).collect();
        for targets in self.edges.values() {
            for t in targets {
                *in_degree.entry(*t).or_insert(0) += 1;
            }
        }

        let mut queue: VecDeque<VariableTag> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&v, _)| v)
            .collect();
        let mut sorted = Vec::with_capacity(self.nodes.len());

        while let Some(var) = queue.pop_front() {
            sorted.push(var);
            if let Some(targets) = self.edges.get(&var) {
                for t in targets {
                    if let Some(deg) = in_degree.get_mut(t) {
                        *deg -= 1;
                        if *deg == 0 {
                            queue.push_back(*t);
                        }
                    }
                }
            }
        }

        if sorted.len() == self.nodes.len() {
            Ok(sorted)
        } else {
            Err(self.find_cycle().unwrap_or_default())
        }
    }

    /// One dependency cycle, if any.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<VariableTag>> {
        let mut visited = BTreeSet::new();
        let mut on_stack = BTreeSet::new();
        let mut path = Vec::new();
        for &start in &self.nodes {
            if !visited.contains(&start) {
                if let Some(cycle) = self.dfs(start, &mut visited, &mut on_stack, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn dfs(
        &self,
        var: VariableTag,
        visited: &mut BTreeSet<VariableTag>,
        on_stack: &mut BTreeSet<VariableTag>,
        path: &mut Vec<VariableTag>,
    ) -> Option<Vec<VariableTag>> {
        visited.insert(var);
        on_stack.insert(var);
        path.push(var);

        for &next in self.edges.get(&var).into_iter().flatten() {
            if !visited.contains(&next) {
                if let Some(cycle) = self.dfs(next, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack.contains(&next) {
                let start = path.iter().position(|v| *v == next).unwrap_or(0);
                let mut cycle = path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
        }

        path.pop();
        on_stack.remove(&var);
        None
    }
}

/// Binding order of `vars` within the given domains.
///
/// # Errors
///
/// Returns `Configuration` if the variables depend on each other cyclically.
pub fn variable_order<'a>(
    domains: impl IntoIterator<Item = &'a Domain>,
    vars: &[VariableTag],
) -> SolveResult<Vec<VariableTag>> {
    VariableGraph::build(domains, vars)
        .order()
        .map_err(|cycle| SolveError::Configuration(vec![cycle_message(&cycle)]))
}

fn cycle_message(cycle: &[VariableTag]) -> String {
    let path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
    format!("cyclic variable dependency: {}", path.join(" -> "))
}

/// Runs every configuration check.
///
/// # Errors
///
/// Returns `Configuration` listing every problem found.
pub fn check_all(
    graph: &ConstraintGraph,
    catalog: &StageCatalog,
    vars: &[VariableTag],
) -> SolveResult<()> {
    let mut problems = Vec::new();

    for (name, domain) in catalog.iter() {
        if let Err(err) = domain.validate() {
            problems.push(format!("stage `{name}`: {err}"));
        } else if !domain.is_satisfiable() {
            problems.push(format!("stage `{name}` can never match any entity"));
        }
    }

    for var in vars {
        if !catalog.iter().any(|(_, d)| d.variables().contains(var)) {
            problems.push(format!("variable {var} is not used by any stage"));
        }
    }

    if let Err(cycle) = VariableGraph::build(catalog.iter().map(|(_, d)| d), vars).order() {
        problems.push(cycle_message(&cycle));
    }

    for rule in &graph.rooms {
        if !rule.count.is_ordered() {
            problems.push(format!(
                "room rule {} has count {}..={}",
                rule.kind, rule.count.min, rule.count.max
            ));
        }
    }

    let mut reached: BTreeSet<&str> = BTreeSet::new();
    for rule in &graph.placements {
        if !rule.count.is_ordered() {
            problems.push(format!(
                "placement `{}` has count {}..={}",
                rule.name, rule.count.min, rule.count.max
            ));
        }
        if rule.support_clause().is_none() {
            let n = rule.object.positive_clauses().count();
            problems.push(format!(
                "placement `{}` has {n} positive support clauses, expected 1",
                rule.name
            ));
            continue;
        }
        if let Err(err) = rule.object.validate() {
            problems.push(format!("placement `{}`: {err}", rule.name));
            continue;
        }
        if rule.surface().is_none() {
            problems.push(format!("placement `{}` does not rest against any face", rule.name));
        }

        let witness = rule.object.witness();
        let stages: Vec<&str> = catalog
            .iter()
            .filter(|(_, d)| d.is_greedy() && witness.satisfies(d))
            .map(|(n, _)| n)
            .collect();
        match stages.as_slice() {
            [one] => {
                reached.insert(one);
            }
            [] => problems.push(format!("placement `{}` is covered by no stage", rule.name)),
            many => problems.push(format!(
                "placement `{}` is covered by several stages: {}",
                rule.name,
                many.join(", ")
            )),
        }
    }

    for (name, domain) in catalog.iter() {
        if name == ROOMS {
            let admitted = graph
                .rooms
                .iter()
                .any(|rule| rule.domain().witness().satisfies(domain));
            if !admitted {
                problems.push(format!("stage `{ROOMS}` admits no room rule"));
            }
        } else if domain.is_greedy() && !reached.contains(name) {
            problems.push(format!("stage `{name}` is reached by no placement rule"));
        }
    }

    if problems.is_empty() {
        info!(
            stages = catalog.len(),
            rooms = graph.rooms.len(),
            placements = graph.placements.len(),
            "configuration checks passed"
        );
        Ok(())
    } else {
        for p in &problems {
            warn!(problem = %p, "configuration check failed");
        }
        Err(SolveError::Configuration(problems))
    }
}

/// Non-room objects left without any relation to a committed entity.
#[must_use]
pub fn check_resolved(state: &SceneState) -> Vec<EntityKey> {
    let unresolved = state.unresolved_objects();
    for key in &unresolved {
        warn!(key = %key, "object has no resolved relation");
    }
    unresolved
}
