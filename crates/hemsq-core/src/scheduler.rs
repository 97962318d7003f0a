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

//! Rolling-horizon orchestration.
//!
//! The output horizon is cut into windows of `step` slots that start every
//! `reschedule_span` slots. Each window is solved on its own, only its first
//! `reschedule_span` slots are kept, and the battery level after the last kept
//! slot seeds the next window. The last window keeps only what is left of the
//! horizon, so the output always has exactly `output_len` slots.

use chrono::Utc;
use hemsq_types::{ScheduleResult, SituationParams, SlotPlan, WindowSummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::builder::{CostParams, WindowModel};
use crate::error::{Result, SchedulerError};
use crate::items::{PlantLimits, classify};
use crate::postprocess::{descale, post_process, summarize_cost};
use crate::search::{SearchConfig, SearchOutcome, WeightSearch};
use crate::series::{PreparedSeries, quantize_amount, rotate_len, solar_by_weather};
use crate::solver::QuboSolver;

/// Where the scheduler is in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SchedulerPhase {
    Initializing,
    WindowSolving { window: usize },
    Advancing { window: usize },
    Done,
    /// `window` is None when the parameters were rejected
    Failed { window: Option<usize> },
}

/// Committed slots per window: `span` each, the last one takes the remainder
pub fn window_spans(output_len: usize, span: usize) -> Vec<usize> {
    if span == 0 {
        return Vec::new();
    }
    (0..output_len.div_ceil(span))
        .map(|t| span.min(output_len - t * span))
        .collect()
}

pub struct RollingScheduler {
    solver: Arc<dyn QuboSolver>,
    search: SearchConfig,
    phase: SchedulerPhase,
}

impl fmt::Debug for RollingScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingScheduler")
            .field("solver", &self.solver.name())
            .field("search", &self.search)
            .field("phase", &self.phase)
            .finish()
    }
}

impl RollingScheduler {
    pub fn new(solver: Arc<dyn QuboSolver>) -> Self {
        Self::with_search_config(solver, SearchConfig::default())
    }

    pub fn with_search_config(solver: Arc<dyn QuboSolver>, search: SearchConfig) -> Self {
        Self {
            solver,
            search,
            phase: SchedulerPhase::Initializing,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Run the whole horizon. Any failing window aborts the run.
    pub async fn solve(&mut self, params: &SituationParams) -> Result<ScheduleResult> {
        self.phase = SchedulerPhase::Initializing;

        let validation = params.validate_detailed();
        for warning in &validation.warnings {
            warn!("Parameter warning: {}", warning);
        }
        if !validation.valid {
            self.phase = SchedulerPhase::Failed { window: None };
            let messages: Vec<String> = validation.errors.iter().map(ToString::to_string).collect();
            return Err(SchedulerError::InvalidParams(messages.join("; ")));
        }

        let series = PreparedSeries::from_params(params);
        let limits = PlantLimits::from_params(params);
        let cost = CostParams::from_params(params);
        let span = params.reschedule_span;
        let spans = window_spans(params.output_len, span);
        let mut b0 = quantize_amount(params.initial_battery_amount, params.unit);

        info!(
            "Scheduling {} slots from hour {} in {} windows (step {}, span {}) with solver {}",
            params.output_len,
            params.start_time,
            spans.len(),
            params.step,
            span,
            self.solver.name()
        );

        let mut plans: Vec<SlotPlan> = Vec::with_capacity(params.output_len);
        let mut windows = Vec::with_capacity(spans.len());

        for (t, committed) in spans.iter().copied().enumerate() {
            self.phase = SchedulerPhase::WindowSolving { window: t };
            let resche_start = params.start_time + span * t;

            let inputs = series.window(resche_start, params.step);
            let catalog = classify(&inputs, &limits);
            let model = WindowModel::new(inputs, catalog, limits, b0).with_unusable_fixed();
            debug!(
                "Window {} (start {}): items [{}], {} of {} decisions fixed, B_0 = {}",
                t,
                resche_start,
                model
                    .catalog
                    .kinds()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                model.arena.fixed_count(),
                model.arena.decision_count(),
                b0
            );

            if let Some(slot) = model.arena.first_dead_slot() {
                warn!("Window {} (start {}): slot {} has no usable item", t, resche_start, slot);
                self.phase = SchedulerPhase::Failed { window: Some(t) };
                return Err(SchedulerError::StructuralInfeasibility {
                    window: t,
                    start_time: resche_start,
                    slot,
                });
            }

            let search = WeightSearch::new(self.solver.as_ref(), &self.search);
            let accepted = match search.run(&model, &cost).await {
                SearchOutcome::Found(accepted) => accepted,
                SearchOutcome::Exhausted { attempts } => {
                    let solver_failures = attempts.iter().filter(|a| a.outcome.is_solver_failure()).count();
                    warn!(
                        "Window {} (start {}): no feasible schedule in {} attempts ({} solver failures), aborting",
                        t,
                        resche_start,
                        attempts.len(),
                        solver_failures
                    );
                    self.phase = SchedulerPhase::Failed { window: Some(t) };
                    return Err(SchedulerError::GridExhausted {
                        window: t,
                        start_time: resche_start,
                        attempts: attempts.len(),
                        solver_failures,
                    });
                }
            };

            self.phase = SchedulerPhase::Advancing { window: t };
            let initial_battery = b0;
            let kept = &accepted.plans[..committed];
            if let Some(last) = kept.last() {
                b0 = last.battery_level;
            }
            plans.extend_from_slice(kept);

            info!(
                "Window {} (start {}): kept {} slots with {}, battery {} -> {}",
                t, resche_start, committed, accepted.weights, initial_battery, b0
            );
            windows.push(WindowSummary {
                index: t,
                start_time: resche_start,
                initial_battery,
                final_battery: b0,
                committed_slots: committed,
                weights: accepted.weights,
                attempts: accepted.attempts.len(),
            });
        }

        let result = build_result(params, &plans, windows);
        self.phase = SchedulerPhase::Done;
        info!(
            "Schedule complete: net cost {:.2}, savings {:.2} against no battery",
            result.cost.net_cost, result.cost.savings
        );
        Ok(result)
    }
}

fn build_result(params: &SituationParams, plans: &[SlotPlan], windows: Vec<WindowSummary>) -> ScheduleResult {
    let start = params.start_time;
    let len = params.output_len;

    let solar_day = solar_by_weather(&params.solar_profiles, &params.weather);
    let demand_wh = rotate_len(start, len, &params.demand);
    let solar_wh = rotate_len(start, len, &solar_day);
    let purchase_price = rotate_len(start, len, &params.ele_prices);
    let sell_price = vec![params.sell_price; len];

    let mut slots = descale(plans, params.unit, start);
    post_process(&mut slots, &solar_wh, &demand_wh);
    let cost = summarize_cost(
        &slots,
        &demand_wh,
        &solar_wh,
        &purchase_price,
        &sell_price,
        params,
    );

    ScheduleResult {
        params: params.clone(),
        generated_at: Utc::now(),
        demand_wh,
        solar_wh,
        purchase_price,
        sell_price,
        slots,
        windows,
        cost,
    }
}
