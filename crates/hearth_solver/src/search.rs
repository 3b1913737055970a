//! # Bounded Improvement Search
//!
//! Picks how many objects go into each slot (one placement rule on one
//! parent). Counts start at each rule's minimum; every step nudges one
//! random slot up or down by one and keeps the move unless it scores worse.
//!
//! ## Scoring
//!
//! Scores compare lexicographically, hard violations first:
//!
//! - **hard**: objects missing below a rule minimum, plus parent faces whose
//!   occupied footprint exceeds their capacity
//! - **soft**: total distance of every count from its seeded target

use std::fmt;

use hearth_domain::EntityKey;
use rand::Rng;

use crate::constraints::SurfaceKind;

/// Slack below which a face still counts as fitting.
const CAPACITY_EPSILON: f64 = 1e-9;

/// One face of one parent, shared by every slot placing against it.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    /// Parent entity.
    pub parent: EntityKey,
    /// Face of the parent.
    pub surface: SurfaceKind,
    /// Free capacity, net of already committed children.
    pub capacity: f64,
}

/// Objects of one rule on one parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    /// Placement rule name.
    pub rule: String,
    /// Index into the group list.
    pub group: usize,
    /// Fewest acceptable.
    pub min: u32,
    /// Most acceptable.
    pub max: u32,
    /// Preferred count, drawn once per solve call.
    pub target: u32,
    /// Capacity used per object.
    pub footprint: f64,
}

/// Hard and soft violation totals; lower is better.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score {
    /// Violations that make a placement unacceptable.
    pub hard: u32,
    /// Distance from preferred counts.
    pub soft: u32,
}

impl Score {
    /// Returns true if no hard constraint is violated.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.hard == 0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hard={} soft={}", self.hard, self.soft)
    }
}

/// Best counts found by `search`.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    /// Count per slot, in slot order.
    pub counts: Vec<u32>,
    /// Score of `counts`.
    pub score: Score,
    /// Steps actually taken.
    pub steps: usize,
}

fn used(slots: &[Slot], groups: &[Group], counts: &[u32]) -> Vec<f64> {
    let mut used = vec![0.0; groups.len()];
    for (slot, &n) in slots.iter().zip(counts) {
        used[slot.group] += f64::from(n) * slot.footprint;
    }
    used
}

/// Scores one choice of counts.
#[must_use]
pub fn score(slots: &[Slot], groups: &[Group], counts: &[u32]) -> Score {
    let deficit: u32 = slots
        .iter()
        .zip(counts)
        .map(|(slot, &n)| slot.min.saturating_sub(n))
        .sum();
    let overflowing = used(slots, groups, counts)
        .iter()
        .zip(groups)
        .filter(|(u, g)| **u > g.capacity + CAPACITY_EPSILON)
        .count();
    let soft = slots
        .iter()
        .zip(counts)
        .map(|(slot, &n)| slot.target.abs_diff(n))
        .sum();
    Score {
        hard: deficit + u32::try_from(overflowing).unwrap_or(u32::MAX),
        soft,
    }
}

/// Describes every hard violation of `counts`.
#[must_use]
pub fn violations(slots: &[Slot], groups: &[Group], counts: &[u32]) -> Vec<String> {
    let mut out = Vec::new();
    for (slot, &n) in slots.iter().zip(counts) {
        if n < slot.min {
            let parent = &groups[slot.group].parent;
            out.push(format!(
                "`{}` on {parent}: {n} placed, at least {} required",
                slot.rule, slot.min
            ));
        }
    }
    for (u, g) in used(slots, groups, counts).iter().zip(groups) {
        if *u > g.capacity + CAPACITY_EPSILON {
            out.push(format!(
                "{:?} of {} overfull: {u:.2} used, {:.2} available",
                g.surface, g.parent, g.capacity
            ));
        }
    }
    out
}

/// Hill-climbs slot counts for at most `n_steps` steps.
pub fn search<R: Rng + ?Sized>(
    slots: &[Slot],
    groups: &[Group],
    n_steps: usize,
    rng: &mut R,
) -> SearchOutcome {
    let mut counts: Vec<u32> = slots.iter().map(|s| s.min).collect();
    let mut current = score(slots, groups, &counts);
    let mut best = SearchOutcome {
        counts: counts.clone(),
        score: current,
        steps: 0,
    };
    if slots.is_empty() {
        return best;
    }

    let mut steps = 0;
    while steps < n_steps && best.score != Score::default() {
        steps += 1;
        let i = rng.gen_range(0..slots.len());
        let old = counts[i];
        let new = if rng.gen_bool(0.5) {
            old.checked_add(1).filter(|n| *n <= slots[i].max)
        } else {
            old.checked_sub(1)
        };
        let Some(new) = new else {
            continue;
        };

        counts[i] = new;
        let candidate = score(slots, groups, &counts);
        if candidate <= current {
            current = candidate;
            if candidate < best.score {
                best.counts.clone_from(&counts);
                best.score = candidate;
            }
        } else {
            counts[i] = old;
        }
    }
    best.steps = steps;
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn group(capacity: f64) -> Group {
        Group {
            parent: "kitchen_0000".into(),
            surface: SurfaceKind::Floor,
            capacity,
        }
    }

    fn slot(min: u32, max: u32, target: u32, footprint: f64) -> Slot {
        Slot {
            rule: "kitchen_storage".to_string(),
            group: 0,
            min,
            max,
            target,
            footprint,
        }
    }

    #[test]
    fn test_reaches_target_when_it_fits() {
        let slots = [slot(1, 5, 4, 1.0)];
        let groups = [group(10.0)];
        let out = search(&slots, &groups, 200, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(out.counts, vec![4]);
        assert_eq!(out.score, Score::default());
        assert!(out.steps < 200);
    }

    #[test]
    fn test_capacity_caps_count() {
        let slots = [slot(0, 5, 5, 1.0)];
        let groups = [group(2.5)];
        let out = search(&slots, &groups, 500, &mut ChaCha8Rng::seed_from_u64(2));
        assert_eq!(out.counts, vec![2]);
        assert!(out.score.is_satisfied());
        assert_eq!(out.score.soft, 3);
    }

    #[test]
    fn test_overflowing_minimum_is_hard() {
        let slots = [slot(3, 3, 3, 1.0)];
        let groups = [group(1.0)];
        let out = search(&slots, &groups, 100, &mut ChaCha8Rng::seed_from_u64(3));
        assert!(!out.score.is_satisfied());
        let v = violations(&slots, &groups, &out.counts);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_zero_steps_keeps_minimums() {
        let slots = [slot(2, 5, 5, 0.1)];
        let out = search(&slots, &[group(10.0)], 0, &mut ChaCha8Rng::seed_from_u64(4));
        assert_eq!(out.counts, vec![2]);
        assert_eq!(out.steps, 0);
    }

    #[test]
    fn test_score_order_is_hard_first() {
        let a = Score { hard: 0, soft: 9 };
        let b = Score { hard: 1, soft: 0 };
        assert!(a < b);
    }
}
