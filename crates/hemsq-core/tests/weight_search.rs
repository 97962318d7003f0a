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

mod common;

use common::{ScriptedSolver, init_tracing, per_slot_sample, sample_with, single};
use hemsq_core::{
    AttemptOutcome, BrokenConstraint, CostParams, ItemCatalog, PlantLimits, SearchConfig,
    SearchOutcome, SolverResult, WeightGrid, WeightRange, WeightSearch, WindowInputs, WindowModel,
};
use hemsq_types::ItemKind;
use std::time::Duration;

fn cost() -> CostParams {
    CostParams {
        cost_ratio: 0.5,
        conv_eff: 0.95,
        c_env: 0.05,
    }
}

fn limits() -> PlantLimits {
    PlantLimits {
        b_max: 10,
        charge_limit: 2,
        discharge_limit: 2,
        rated_output: 6,
        eta: 1.0,
    }
}

/// Demand 2 every hour, 4 units of sun in the third hour, half-full battery
fn scenario() -> WindowModel {
    let window = WindowInputs {
        start_hour: 0,
        demand: vec![2, 2, 2, 2],
        solar: vec![0, 0, 4, 0],
        purchase_price: vec![0.1, 0.1, 0.13, 0.17],
        sell_price: vec![0.04; 4],
    };
    let catalog = ItemCatalog::new([
        ItemKind::Buy,
        ItemKind::Sell,
        ItemKind::ChargeFromSolar,
        ItemKind::Discharge,
    ]);
    WindowModel::new(window, catalog, limits(), 5).with_unusable_fixed()
}

fn scenario_choice(slot: usize) -> &'static str {
    match slot {
        2 => "charge_from_solar",
        3 => "discharge",
        _ => "buy",
    }
}

fn single_tuple_grid() -> WeightGrid {
    WeightGrid {
        w_p: WeightRange::new(4.0, 3.95, -0.1),
        w_ineq1: WeightRange::new(1.1, 1.15, 0.1),
        w_ineq2: WeightRange::new(1.1, 1.15, 0.1),
    }
}

#[tokio::test]
async fn test_scenario_is_accepted_with_expected_levels() {
    init_tracing();
    let model = scenario();
    let solver = ScriptedSolver::new(|m, _| single(per_slot_sample(m, |_, slot| scenario_choice(slot))));
    let config = SearchConfig::default();

    let outcome = WeightSearch::new(&solver, &config).run(&model, &cost()).await;
    let SearchOutcome::Found(accepted) = outcome else {
        panic!("expected an accepted window");
    };

    let levels: Vec<i64> = accepted.plans.iter().map(|p| p.battery_level).collect();
    assert_eq!(levels, vec![5, 5, 7, 5]);
    assert_eq!(accepted.attempts.len(), 1);
    assert_eq!(solver.calls(), 1);
    assert_eq!(Some(accepted.weights), WeightGrid::default().iter().next());
    assert!(
        accepted
            .plans
            .iter()
            .all(|p| !(p.charge > 0 && p.discharge > 0) && (0..=10).contains(&p.battery_level))
    );
}

#[tokio::test]
async fn test_first_feasible_combination_wins() {
    let model = scenario();
    let k = 7;
    let solver = ScriptedSolver::new(move |m, call| {
        if call + 1 == k {
            single(per_slot_sample(m, |_, slot| scenario_choice(slot)))
        } else {
            // Nothing selected anywhere
            single(sample_with(m, &[]))
        }
    });
    let config = SearchConfig::default();

    let SearchOutcome::Found(accepted) = WeightSearch::new(&solver, &config).run(&model, &cost()).await
    else {
        panic!("expected an accepted window");
    };

    assert_eq!(solver.calls(), k);
    assert_eq!(accepted.attempts.len(), k);
    assert_eq!(Some(accepted.weights), config.grid.iter().nth(k - 1));
    assert!(accepted.attempts[..k - 1].iter().all(|a| matches!(
        &a.outcome,
        AttemptOutcome::ConstraintViolation { broken, .. } if broken.first() == Some(&BrokenConstraint::OneHot)
    )));
    assert!(matches!(
        accepted.attempts[k - 1].outcome,
        AttemptOutcome::Feasible { .. }
    ));
}

#[tokio::test]
async fn test_unsatisfiable_window_exhausts_the_grid() {
    // Only discharging is allowed but the battery cannot deliver 3 units
    let window = WindowInputs {
        start_hour: 0,
        demand: vec![3, 3],
        solar: vec![0, 0],
        purchase_price: vec![0.1; 2],
        sell_price: vec![0.04; 2],
    };
    let model = WindowModel::new(window, ItemCatalog::new([ItemKind::Discharge]), limits(), 5)
        .with_unusable_fixed();
    assert_eq!(model.arena.first_dead_slot(), None);

    let solver = ScriptedSolver::new(|m, _| single(per_slot_sample(m, |_, _| "discharge")));
    let config = SearchConfig::default();
    let outcome = WeightSearch::new(&solver, &config).run(&model, &cost()).await;

    let SearchOutcome::Exhausted { attempts } = outcome else {
        panic!("window must not be accepted");
    };
    assert_eq!(attempts.len(), 375);
    assert_eq!(solver.calls(), 375);
    assert!(attempts.iter().all(|a| matches!(
        &a.outcome,
        AttemptOutcome::ConstraintViolation { broken, .. }
            if broken.contains(&BrokenConstraint::DemandBalance { slot: 0 })
    )));
}

#[tokio::test]
async fn test_solver_failures_move_on_to_next_weights() {
    let model = scenario();
    let solver = ScriptedSolver::new(|m, call| match call {
        0 => Err(anyhow::anyhow!("quota exceeded")),
        1 => Ok(SolverResult::default()),
        _ => single(per_slot_sample(m, |_, slot| scenario_choice(slot))),
    });
    let config = SearchConfig::default();

    let SearchOutcome::Found(accepted) = WeightSearch::new(&solver, &config).run(&model, &cost()).await
    else {
        panic!("expected an accepted window");
    };

    assert_eq!(accepted.attempts.len(), 3);
    assert!(matches!(
        &accepted.attempts[0].outcome,
        AttemptOutcome::SolverUnavailable { reason } if reason.contains("quota exceeded")
    ));
    assert_eq!(accepted.attempts[1].outcome, AttemptOutcome::NoCandidates);
    assert_eq!(Some(accepted.weights), config.grid.iter().nth(2));
}

#[tokio::test]
async fn test_timeout_counts_as_failed_attempt() {
    let model = scenario();
    let solver = ScriptedSolver::new(|m, _| single(per_slot_sample(m, |_, slot| scenario_choice(slot))))
        .with_delay(1, Duration::from_millis(500));
    let config = SearchConfig {
        attempt_timeout: Duration::from_millis(20),
        ..SearchConfig::default()
    };

    let SearchOutcome::Found(accepted) = WeightSearch::new(&solver, &config).run(&model, &cost()).await
    else {
        panic!("expected an accepted window");
    };
    assert_eq!(accepted.attempts[0].outcome, AttemptOutcome::TimedOut);
    assert_eq!(accepted.attempts.len(), 2);
}

#[tokio::test]
async fn test_only_timeouts_exhaust_the_grid() {
    let model = scenario();
    let solver = ScriptedSolver::new(|m, _| single(per_slot_sample(m, |_, slot| scenario_choice(slot))))
        .with_delay(usize::MAX, Duration::from_millis(500));
    let config = SearchConfig {
        grid: single_tuple_grid(),
        attempt_timeout: Duration::from_millis(20),
        ..SearchConfig::default()
    };
    assert_eq!(config.grid.len(), 1);

    let SearchOutcome::Exhausted { attempts } = WeightSearch::new(&solver, &config).run(&model, &cost()).await
    else {
        panic!("timed out attempts must not be accepted");
    };
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].outcome.is_solver_failure());
}

#[tokio::test]
async fn test_solver_values_for_fixed_variables_are_ignored() {
    let model = scenario();
    // Also claims sell at slot 0, which has no surplus and is fixed to 0
    let solver = ScriptedSolver::new(|m, _| {
        let mut names: Vec<String> = (0..4)
            .map(|slot| format!("x[{slot}][{}]", scenario_choice(slot)))
            .collect();
        names.push("x[0][sell]".to_owned());
        single(sample_with(m, &names))
    });
    let config = SearchConfig::default();

    let SearchOutcome::Found(accepted) = WeightSearch::new(&solver, &config).run(&model, &cost()).await
    else {
        panic!("expected an accepted window");
    };
    assert_eq!(accepted.plans[0].item, Some(ItemKind::Buy));
    assert_eq!(accepted.plans[0].sell, 0);
}

#[test]
fn test_dead_slot_is_detected_before_solving() {
    // Selling is the only item but slot 1 has no surplus
    let window = WindowInputs {
        start_hour: 10,
        demand: vec![1, 2],
        solar: vec![3, 1],
        purchase_price: vec![0.1; 2],
        sell_price: vec![0.04; 2],
    };
    let model = WindowModel::new(window, ItemCatalog::new([ItemKind::Sell]), limits(), 5)
        .with_unusable_fixed();
    assert_eq!(model.arena.first_dead_slot(), Some(1));
}

#[test]
fn test_model_exposes_named_variables() {
    let model = scenario();
    let variables = model.variables();
    assert_eq!(variables.len(), model.arena.len());
    assert_eq!(variables[model.arena.x(2, 2).0].name, "x[2][charge_from_solar]");
    assert_eq!(variables[model.arena.x(0, 1).0].fixed, Some(false));
}
