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

//! QUBO construction for one scheduling window.
//!
//! The objective is `cost·w_cost + penalty·w_p + ineq1·w_ineq1 + ineq2·w_ineq2`.
//! The four terms do not depend on the weights, so they are built once per
//! window by [`ObjectiveTerms::build`] and recombined for every weight tuple.

use hemsq_types::{SituationParams, WeightTuple};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::arena::{VariableArena, VariableInfo, slack_bits};
use crate::items::{Action, ItemCatalog, PlantLimits, fixed_variables, item_action};
use crate::poly::{LinearExpr, QuboPoly};
use crate::series::{WindowInputs, price_factor};

/// Everything known about a window before solving
#[derive(Debug, Clone)]
pub struct WindowModel {
    pub window: WindowInputs,
    pub catalog: ItemCatalog,
    pub limits: PlantLimits,
    /// Battery level carried into the window (units)
    pub b0: i64,
    pub arena: VariableArena,
    actions: Vec<Action>,
}

impl WindowModel {
    pub fn new(window: WindowInputs, catalog: ItemCatalog, limits: PlantLimits, b0: i64) -> Self {
        let step = window.step();
        let total = catalog.total();
        let arena = VariableArena::new(step, total, slack_bits(limits.b_max));

        let mut actions = Vec::with_capacity(step * total);
        for slot in 0..step {
            for kind in catalog.kinds() {
                actions.push(item_action(
                    *kind,
                    window.demand[slot],
                    window.solar[slot],
                    &limits,
                ));
            }
        }

        Self {
            window,
            catalog,
            limits,
            b0,
            arena,
            actions,
        }
    }

    /// Fix decisions that can never be selected to 0
    #[must_use]
    pub fn with_unusable_fixed(mut self) -> Self {
        let fixed = fixed_variables(&self.catalog, &self.window, &self.limits, self.b0);
        for index in fixed {
            self.arena.fix(index, false);
        }
        self
    }

    pub fn step(&self) -> usize {
        self.window.step()
    }

    pub fn action(&self, slot: usize, item: usize) -> &Action {
        &self.actions[self.arena.decision_index(slot, item)]
    }

    /// Variable names and fixed values, shared by every solver call of the window
    pub fn variables(&self) -> Arc<[VariableInfo]> {
        self.arena.describe(self.catalog.kinds()).into()
    }

    /// `Σ_i x_{slot,i} · f(action)` with fixed decisions folded in
    fn weighted_sum(&self, slot: usize, f: impl Fn(&Action) -> f64) -> LinearExpr {
        let mut expr = LinearExpr::default();
        for item in 0..self.catalog.total() {
            expr.add(self.arena.decision(slot, item), f(self.action(slot, item)));
        }
        expr
    }
}

/// Coefficients of the economic and environmental cost
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    /// Economic share of the cost (0.0 to 1.0)
    pub cost_ratio: f64,
    pub conv_eff: f64,
    /// Environmental cost, normalized like the prices
    pub c_env: f64,
}

impl CostParams {
    pub fn from_params(params: &SituationParams) -> Self {
        Self {
            cost_ratio: params.cost_ratio,
            conv_eff: params.conv_eff,
            c_env: params.c_env * price_factor(params.unit),
        }
    }
}

/// Relative weights of the four penalty components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyWeights {
    /// One-hot
    pub w_a: f64,
    /// No simultaneous charge and discharge
    pub w_io: f64,
    /// Solar balance
    pub w_s: f64,
    /// Demand balance
    pub w_d: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            w_a: 1.0,
            w_io: 1.0,
            w_s: 1.0,
            w_d: 1.0,
        }
    }
}

/// Cost of the selected items over the window
pub fn cost_term(model: &WindowModel, cost: &CostParams) -> QuboPoly {
    let mut expr = LinearExpr::default();
    for slot in 0..model.step() {
        let price = model.window.purchase_price[slot];
        let sell_price = model.window.sell_price[slot];
        let slot_cost = model.weighted_sum(slot, |a| {
            let buy = a.buy as f64;
            let sell = a.sell as f64;
            cost.cost_ratio * (price * buy - cost.conv_eff * sell_price * sell)
                + (1.0 - cost.cost_ratio) * cost.c_env * buy
        });
        expr.constant += slot_cost.constant;
        expr.terms.extend(slot_cost.terms);
    }
    expr.to_poly()
}

/// One-hot, charge/discharge exclusion and the two balance penalties
pub fn penalty_term(model: &WindowModel, weights: &PenaltyWeights) -> QuboPoly {
    let mut poly = QuboPoly::new();
    for slot in 0..model.step() {
        let mut one_hot = model.weighted_sum(slot, |_| 1.0);
        one_hot.constant -= 1.0;
        poly.add_scaled(&one_hot.squared(), weights.w_a);

        let mut charging = LinearExpr::default();
        let mut discharging = LinearExpr::default();
        for (item, kind) in model.catalog.kinds().iter().enumerate() {
            let term = model.arena.decision(slot, item);
            if kind.charges_battery() {
                charging.add(term, 1.0);
            }
            if kind.discharges_battery() {
                discharging.add(term, 1.0);
            }
        }
        poly.add_scaled(&charging.product(&discharging), weights.w_io);

        let mut solar = model.weighted_sum(slot, |a| a.solar_accounted() as f64);
        solar.constant -= model.window.solar[slot] as f64;
        poly.add_scaled(&solar.squared(), weights.w_s);

        let mut demand = model.weighted_sum(slot, |a| a.supply() as f64);
        demand.constant -= model.window.demand[slot] as f64;
        poly.add_scaled(&demand.squared(), weights.w_d);
    }
    poly
}

/// Slack-encoded battery bounds: `(level <= b_max, level >= 0)`
pub fn ineq_terms(model: &WindowModel) -> (QuboPoly, QuboPoly) {
    let arena = &model.arena;
    let b_max = model.limits.b_max as f64;
    let mut level = LinearExpr::constant(model.b0 as f64);
    let mut upper = QuboPoly::new();
    let mut lower = QuboPoly::new();

    for slot in 0..model.step() {
        let delta = model.weighted_sum(slot, |a| a.battery_delta() as f64);
        level.constant += delta.constant;
        level.terms.extend(delta.terms);

        let mut headroom = level.scaled(-1.0);
        headroom.constant += b_max;
        let mut stored = level.clone();
        for bit in 0..arena.y_n() {
            let weight = f64::from(1u32 << bit);
            headroom.add_var(arena.y1(slot, bit), -weight);
            stored.add_var(arena.y2(slot, bit), -weight);
        }
        upper.add_scaled(&headroom.squared(), 1.0);
        lower.add_scaled(&stored.squared(), 1.0);
    }
    (upper, lower)
}

/// Weight-independent parts of a window's objective
#[derive(Debug, Clone)]
pub struct ObjectiveTerms {
    pub cost: QuboPoly,
    pub penalty: QuboPoly,
    pub ineq1: QuboPoly,
    pub ineq2: QuboPoly,
}

impl ObjectiveTerms {
    pub fn build(model: &WindowModel, cost: &CostParams, penalty: &PenaltyWeights) -> Self {
        let (ineq1, ineq2) = ineq_terms(model);
        Self {
            cost: cost_term(model, cost),
            penalty: penalty_term(model, penalty),
            ineq1,
            ineq2,
        }
    }

    pub fn combine(&self, weights: &WeightTuple, w_cost: f64) -> QuboPoly {
        let mut q = &self.cost * w_cost;
        q.add_scaled(&self.penalty, weights.w_p);
        q.add_scaled(&self.ineq1, weights.w_ineq1);
        q.add_scaled(&self.ineq2, weights.w_ineq2);
        q
    }
}
