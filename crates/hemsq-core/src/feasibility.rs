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

//! Decoding of solver samples and the hard-constraint check that decides
//! whether a weight combination is accepted.

use hemsq_types::SlotPlan;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::arena::VariableArena;
use crate::builder::WindowModel;
use crate::series::WindowInputs;
use crate::solver::Sample;

/// Item chosen per slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Every slot has exactly one item
    pub satisfied: bool,
    /// Item index per slot, None when zero or several were selected
    pub assignment: Vec<Option<usize>>,
}

/// Read the per-slot selection out of a sample
pub fn check_alloc(arena: &VariableArena, sample: &Sample) -> Allocation {
    let assignment: Vec<Option<usize>> = (0..arena.step())
        .map(|slot| {
            let mut selected =
                (0..arena.total()).filter(|item| arena.decision_value(slot, *item, |v| sample.value(v)));
            match (selected.next(), selected.next()) {
                (Some(item), None) => Some(item),
                _ => None,
            }
        })
        .collect();
    Allocation {
        satisfied: assignment.iter().all(Option::is_some),
        assignment,
    }
}

/// Physical plan per slot with the running battery level
pub fn make_schedule(allocation: &Allocation, model: &WindowModel) -> Vec<SlotPlan> {
    let mut level = model.b0;
    allocation
        .assignment
        .iter()
        .enumerate()
        .map(|(slot, selected)| match selected {
            Some(item) => {
                let action = model.action(slot, *item);
                level += action.battery_delta();
                SlotPlan {
                    item: Some(model.catalog.kind(*item)),
                    buy: action.buy,
                    sell: action.sell,
                    charge: action.charge,
                    discharge: action.discharge,
                    solar_used: action.solar_used,
                    solar_curtailed: action.solar_curtailed,
                    battery_level: level,
                }
            }
            None => SlotPlan {
                battery_level: level,
                ..SlotPlan::default()
            },
        })
        .collect()
}

/// A hard constraint a decoded plan does not meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "constraint", rename_all = "snake_case")]
pub enum BrokenConstraint {
    OneHot,
    ChargeDischargeOverlap { slot: usize },
    BatteryOverCapacity { slot: usize },
    BatteryBelowZero { slot: usize },
    SolarBalance { slot: usize },
    DemandBalance { slot: usize },
}

impl fmt::Display for BrokenConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneHot => write!(f, "one-hot"),
            Self::ChargeDischargeOverlap { slot } => write!(f, "charge/discharge overlap at slot {slot}"),
            Self::BatteryOverCapacity { slot } => write!(f, "battery over capacity at slot {slot}"),
            Self::BatteryBelowZero { slot } => write!(f, "battery below zero at slot {slot}"),
            Self::SolarBalance { slot } => write!(f, "solar balance at slot {slot}"),
            Self::DemandBalance { slot } => write!(f, "demand balance at slot {slot}"),
        }
    }
}

/// Every hard constraint the plans break; empty means feasible
pub fn broken_constraints(
    plans: &[SlotPlan],
    window: &WindowInputs,
    b_max: i64,
    alloc_satisfied: bool,
) -> Vec<BrokenConstraint> {
    let mut broken = Vec::new();
    if !alloc_satisfied {
        broken.push(BrokenConstraint::OneHot);
    }
    for (slot, plan) in plans.iter().enumerate() {
        if plan.charge > 0 && plan.discharge > 0 {
            broken.push(BrokenConstraint::ChargeDischargeOverlap { slot });
        }
        if plan.battery_level > b_max {
            broken.push(BrokenConstraint::BatteryOverCapacity { slot });
        }
        if plan.battery_level < 0 {
            broken.push(BrokenConstraint::BatteryBelowZero { slot });
        }
        if plan.solar_total() != window.solar[slot] {
            broken.push(BrokenConstraint::SolarBalance { slot });
        }
        if plan.supply() != window.demand[slot] {
            broken.push(BrokenConstraint::DemandBalance { slot });
        }
    }
    broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemCatalog, PlantLimits};
    use hemsq_types::ItemKind;

    fn model() -> WindowModel {
        let window = WindowInputs {
            start_hour: 0,
            demand: vec![2, 2, 2, 2],
            solar: vec![0, 0, 4, 0],
            purchase_price: vec![0.1; 4],
            sell_price: vec![0.04; 4],
        };
        let catalog = ItemCatalog::new([
            ItemKind::Buy,
            ItemKind::Sell,
            ItemKind::ChargeFromSolar,
            ItemKind::Discharge,
        ]);
        let limits = PlantLimits {
            b_max: 10,
            charge_limit: 2,
            discharge_limit: 2,
            rated_output: 6,
            eta: 1.0,
        };
        WindowModel::new(window, catalog, limits, 5).with_unusable_fixed()
    }

    fn sample(model: &WindowModel, picks: &[(usize, usize)]) -> Sample {
        let mut sample = Sample::default();
        for (slot, item) in picks {
            sample.values.insert(model.arena.x(*slot, *item), true);
        }
        sample
    }

    #[test]
    fn test_scenario_decodes_to_expected_levels() {
        let model = model();
        let alloc = check_alloc(&model.arena, &sample(&model, &[(0, 0), (1, 0), (2, 2), (3, 3)]));
        assert!(alloc.satisfied);

        let plans = make_schedule(&alloc, &model);
        let levels: Vec<i64> = plans.iter().map(|p| p.battery_level).collect();
        assert_eq!(levels, vec![5, 5, 7, 5]);
        assert_eq!(plans[2].item, Some(ItemKind::ChargeFromSolar));
        assert!(broken_constraints(&plans, &model.window, 10, alloc.satisfied).is_empty());
    }

    #[test]
    fn test_missing_and_double_selection_break_one_hot() {
        let model = model();
        // Slot 1 empty, slot 3 double
        let alloc = check_alloc(
            &model.arena,
            &sample(&model, &[(0, 0), (2, 2), (3, 0), (3, 3)]),
        );
        assert!(!alloc.satisfied);
        assert_eq!(alloc.assignment, vec![Some(0), None, Some(2), None]);

        let plans = make_schedule(&alloc, &model);
        assert_eq!(plans[1].item, None);
        assert_eq!(plans[1].battery_level, 5);
        assert_eq!(plans[3].battery_level, 7);

        let broken = broken_constraints(&plans, &model.window, 10, alloc.satisfied);
        assert_eq!(broken[0], BrokenConstraint::OneHot);
        assert!(broken.contains(&BrokenConstraint::DemandBalance { slot: 1 }));
    }

    #[test]
    fn test_solver_values_for_fixed_variables_are_ignored() {
        let model = model();
        // Sell at slot 0 is fixed to 0; a solver claiming it must not count
        let alloc = check_alloc(
            &model.arena,
            &sample(&model, &[(0, 0), (0, 1), (1, 0), (2, 2), (3, 3)]),
        );
        assert!(alloc.satisfied);
        assert_eq!(alloc.assignment[0], Some(0));
    }

    #[test]
    fn test_foreign_sample_entries_do_not_panic() {
        let model = model();
        let mut sample = Sample::default();
        sample.values.insert(crate::arena::VarId(10_000), true);
        let alloc = check_alloc(&model.arena, &sample);
        assert!(!alloc.satisfied);
        assert!(alloc.assignment.iter().all(Option::is_none));
    }

    #[test]
    fn test_battery_bounds_are_checked() {
        let window = WindowInputs {
            start_hour: 0,
            demand: vec![1, 1],
            solar: vec![0, 0],
            purchase_price: vec![0.1; 2],
            sell_price: vec![0.04; 2],
        };
        let plans = vec![
            SlotPlan {
                item: Some(ItemKind::ChargeFromGrid),
                buy: 3,
                charge: 2,
                battery_level: 11,
                ..SlotPlan::default()
            },
            SlotPlan {
                item: Some(ItemKind::Discharge),
                discharge: 1,
                battery_level: -1,
                ..SlotPlan::default()
            },
        ];
        assert_eq!(
            broken_constraints(&plans, &window, 10, true),
            vec![
                BrokenConstraint::BatteryOverCapacity { slot: 0 },
                BrokenConstraint::BatteryBelowZero { slot: 1 },
            ]
        );
    }

    #[test]
    fn test_broken_constraint_display() {
        assert_eq!(
            BrokenConstraint::BatteryBelowZero { slot: 3 }.to_string(),
            "battery below zero at slot 3"
        );
    }
}
