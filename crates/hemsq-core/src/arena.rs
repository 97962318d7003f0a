// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of HemsQ.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Flat arena of binary variables for one window.
//!
//! Layout of the id space:
//! - decisions `x`: `slot * total + item`
//! - slack `y1` (level <= capacity): offset `total * step`, then `slot * y_n + bit`
//! - slack `y2` (level >= 0): offset `(total + y_n) * step`, then `slot * y_n + bit`
//!
//! Decision variables can be fixed to a constant before the objective is
//! built; fixed variables never appear in the polynomial.

use hemsq_types::ItemKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a binary variable in the solver's flat namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// A decision variable as seen by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Fixed(bool),
    Var(VarId),
}

/// Variable metadata handed to the solver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    /// Value the core uses regardless of the solver's answer
    pub fixed: Option<bool>,
}

/// Number of slack bits per slot for a battery of `b_max` units
///
/// `floor(log2(b_max - 1)) + 1`, requires `b_max >= 2`.
pub fn slack_bits(b_max: i64) -> usize {
    assert!(b_max >= 2, "battery must hold at least 2 units, got {b_max}");
    ((b_max - 1).ilog2() + 1) as usize
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableArena {
    step: usize,
    total: usize,
    y_n: usize,
    fixed: Vec<Option<bool>>,
}

impl VariableArena {
    pub fn new(step: usize, total: usize, y_n: usize) -> Self {
        Self {
            step,
            total,
            y_n,
            fixed: vec![None; step * total],
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Items per slot
    pub fn total(&self) -> usize {
        self.total
    }

    /// Slack bits per slot
    pub fn y_n(&self) -> usize {
        self.y_n
    }

    pub fn decision_count(&self) -> usize {
        self.step * self.total
    }

    /// Total number of variables, decisions and both slack arrays
    pub fn len(&self) -> usize {
        self.decision_count() + 2 * self.y_n * self.step
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn decision_index(&self, slot: usize, item: usize) -> usize {
        debug_assert!(slot < self.step && item < self.total);
        slot * self.total + item
    }

    pub fn x(&self, slot: usize, item: usize) -> VarId {
        VarId(self.decision_index(slot, item))
    }

    pub fn y1(&self, slot: usize, bit: usize) -> VarId {
        debug_assert!(slot < self.step && bit < self.y_n);
        VarId(self.decision_count() + slot * self.y_n + bit)
    }

    pub fn y2(&self, slot: usize, bit: usize) -> VarId {
        debug_assert!(slot < self.step && bit < self.y_n);
        VarId(self.decision_count() + (self.step + slot) * self.y_n + bit)
    }

    /// Fix a decision variable by flat index
    pub fn fix(&mut self, index: usize, value: bool) {
        self.fixed[index] = Some(value);
    }

    pub fn fixed_value(&self, slot: usize, item: usize) -> Option<bool> {
        self.fixed[self.decision_index(slot, item)]
    }

    pub fn fixed_count(&self) -> usize {
        self.fixed.iter().filter(|f| f.is_some()).count()
    }

    /// Decision variable as a builder term
    pub fn decision(&self, slot: usize, item: usize) -> Term {
        match self.fixed_value(slot, item) {
            Some(value) => Term::Fixed(value),
            None => Term::Var(self.x(slot, item)),
        }
    }

    /// Value of a decision in a sample, preferring the arena's fixed value
    pub fn decision_value(&self, slot: usize, item: usize, sampled: impl Fn(VarId) -> bool) -> bool {
        self.fixed_value(slot, item)
            .unwrap_or_else(|| sampled(self.x(slot, item)))
    }

    /// First slot where every item is fixed to 0
    pub fn first_dead_slot(&self) -> Option<usize> {
        (0..self.step).find(|slot| {
            (0..self.total).all(|item| self.fixed_value(*slot, item) == Some(false))
        })
    }

    /// Names and fixed values for every variable, indexed by `VarId`
    pub fn describe(&self, kinds: &[ItemKind]) -> Vec<VariableInfo> {
        debug_assert_eq!(kinds.len(), self.total);
        let mut variables = Vec::with_capacity(self.len());
        for slot in 0..self.step {
            for (item, kind) in kinds.iter().enumerate() {
                variables.push(VariableInfo {
                    name: format!("x[{slot}][{}]", kind.label()),
                    fixed: self.fixed_value(slot, item),
                });
            }
        }
        for prefix in ["y1", "y2"] {
            for slot in 0..self.step {
                for bit in 0..self.y_n {
                    variables.push(VariableInfo {
                        name: format!("{prefix}[{slot}][{bit}]"),
                        fixed: None,
                    });
                }
            }
        }
        variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_bits() {
        assert_eq!(slack_bits(2), 1);
        assert_eq!(slack_bits(3), 2);
        assert_eq!(slack_bits(9), 4);
        assert_eq!(slack_bits(10), 4);
        assert_eq!(slack_bits(17), 5);
    }

    #[test]
    #[should_panic(expected = "at least 2 units")]
    fn test_slack_bits_rejects_tiny_battery() {
        let _ = slack_bits(1);
    }

    #[test]
    fn test_index_layout_is_dense_and_disjoint() {
        let arena = VariableArena::new(3, 4, 2);
        assert_eq!(arena.len(), 3 * 4 + 2 * 2 * 3);

        let mut ids: Vec<usize> = Vec::new();
        for slot in 0..3 {
            for item in 0..4 {
                ids.push(arena.x(slot, item).0);
            }
        }
        for slot in 0..3 {
            for bit in 0..2 {
                ids.push(arena.y1(slot, bit).0);
            }
        }
        for slot in 0..3 {
            for bit in 0..2 {
                ids.push(arena.y2(slot, bit).0);
            }
        }
        let expected: Vec<usize> = (0..arena.len()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_fixed_decisions_become_constants() {
        let mut arena = VariableArena::new(2, 2, 1);
        arena.fix(arena.decision_index(1, 0), false);

        assert_eq!(arena.decision(0, 0), Term::Var(VarId(0)));
        assert_eq!(arena.decision(1, 0), Term::Fixed(false));
        assert_eq!(arena.fixed_count(), 1);

        // Solver says 1, arena says 0
        assert!(!arena.decision_value(1, 0, |_| true));
        assert!(arena.decision_value(1, 1, |_| true));
    }

    #[test]
    fn test_first_dead_slot() {
        let mut arena = VariableArena::new(3, 2, 1);
        assert_eq!(arena.first_dead_slot(), None);

        arena.fix(arena.decision_index(2, 0), false);
        assert_eq!(arena.first_dead_slot(), None);
        arena.fix(arena.decision_index(2, 1), false);
        assert_eq!(arena.first_dead_slot(), Some(2));
    }

    #[test]
    fn test_describe_names_follow_ids() {
        let mut arena = VariableArena::new(2, 2, 1);
        arena.fix(arena.decision_index(0, 1), false);
        let vars = arena.describe(&[ItemKind::Buy, ItemKind::Discharge]);

        assert_eq!(vars.len(), arena.len());
        assert_eq!(vars[arena.x(1, 0).0].name, "x[1][buy]");
        assert_eq!(vars[arena.x(0, 1).0].fixed, Some(false));
        assert_eq!(vars[arena.y1(1, 0).0].name, "y1[1][0]");
        assert_eq!(vars[arena.y2(0, 0).0].name, "y2[0][0]");
    }
}
