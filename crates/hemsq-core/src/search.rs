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

//! Adaptive penalty-weight search.
//!
//! Weight tuples are tried in a fixed order and the first one whose solver
//! sample decodes to a schedule without broken constraints is accepted.
//! Solver errors, timeouts and empty results count as failed attempts and the
//! search moves on to the next tuple.

use hemsq_types::{SlotPlan, WeightTuple};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::builder::{CostParams, ObjectiveTerms, PenaltyWeights, WindowModel};
use crate::feasibility::{BrokenConstraint, broken_constraints, check_alloc, make_schedule};
use crate::solver::{QuboModel, QuboSolver};

/// Arithmetic progression of weight values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRange {
    pub start: f64,
    /// Exclusive bound
    pub stop: f64,
    /// Signed increment
    pub step: f64,
}

impl WeightRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    pub fn len(&self) -> usize {
        if self.step == 0.0 {
            return 0;
        }
        let span = (self.stop - self.start) / self.step;
        // Tolerance keeps 0.5 / 0.1 from producing a sixth value
        (span - 1e-9).ceil().max(0.0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values computed as `start + k·step` so no error accumulates
    pub fn values(&self) -> impl Iterator<Item = f64> + use<> {
        let Self { start, step, .. } = *self;
        (0..self.len()).map(move |k| start + k as f64 * step)
    }
}

/// Cartesian product of the three weight ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightGrid {
    pub w_p: WeightRange,
    pub w_ineq1: WeightRange,
    pub w_ineq2: WeightRange,
}

impl Default for WeightGrid {
    fn default() -> Self {
        Self {
            w_p: WeightRange::new(4.0, 2.5, -0.1),
            w_ineq1: WeightRange::new(1.1, 1.6, 0.1),
            w_ineq2: WeightRange::new(1.1, 1.6, 0.1),
        }
    }
}

impl WeightGrid {
    pub fn len(&self) -> usize {
        self.w_p.len() * self.w_ineq1.len() * self.w_ineq2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tuples in search order: outer `w_p`, middle `w_ineq2`, inner `w_ineq1`
    pub fn iter(&self) -> impl Iterator<Item = WeightTuple> + use<> {
        let Self {
            w_p,
            w_ineq1,
            w_ineq2,
        } = *self;
        w_p.values().flat_map(move |w_p| {
            w_ineq2.values().flat_map(move |w_ineq2| {
                w_ineq1.values().map(move |w_ineq1| WeightTuple {
                    w_p,
                    w_ineq1,
                    w_ineq2,
                })
            })
        })
    }
}

/// Settings of the weight search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub grid: WeightGrid,
    /// Weight of the cost term
    pub w_cost: f64,
    pub penalty_weights: PenaltyWeights,
    /// Upper bound on a single solver call
    pub attempt_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            grid: WeightGrid::default(),
            w_cost: 1.0,
            penalty_weights: PenaltyWeights::default(),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

/// Result of one solver invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Feasible {
        energy: f64,
    },
    ConstraintViolation {
        broken: Vec<BrokenConstraint>,
        energy: f64,
    },
    /// Solver returned no samples
    NoCandidates,
    SolverUnavailable {
        reason: String,
    },
    TimedOut,
}

impl AttemptOutcome {
    /// The solver produced nothing usable
    pub fn is_solver_failure(&self) -> bool {
        matches!(
            self,
            Self::NoCandidates | Self::SolverUnavailable { .. } | Self::TimedOut
        )
    }
}

/// One weight tuple and what came of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAttempt {
    pub weights: WeightTuple,
    pub outcome: AttemptOutcome,
}

/// Schedule accepted for a window
#[derive(Debug, Clone)]
pub struct AcceptedWindow {
    pub weights: WeightTuple,
    pub plans: Vec<SlotPlan>,
    pub energy: f64,
    /// Every attempt up to and including the accepted one
    pub attempts: Vec<SearchAttempt>,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Found(AcceptedWindow),
    Exhausted { attempts: Vec<SearchAttempt> },
}

/// Drives the solver over the weight grid for one window
pub struct WeightSearch<'a> {
    solver: &'a dyn QuboSolver,
    config: &'a SearchConfig,
}

impl std::fmt::Debug for WeightSearch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightSearch")
            .field("solver", &self.solver.name())
            .field("config", self.config)
            .finish()
    }
}

impl<'a> WeightSearch<'a> {
    pub fn new(solver: &'a dyn QuboSolver, config: &'a SearchConfig) -> Self {
        Self { solver, config }
    }

    pub async fn run(&self, model: &WindowModel, cost: &CostParams) -> SearchOutcome {
        let terms = ObjectiveTerms::build(model, cost, &self.config.penalty_weights);
        let variables = model.variables();
        let mut attempts = Vec::new();

        for weights in self.config.grid.iter() {
            let qubo = QuboModel::new(
                terms.combine(&weights, self.config.w_cost),
                std::sync::Arc::clone(&variables),
            );
            let (outcome, plans) = self.attempt(model, &qubo).await;

            match &outcome {
                AttemptOutcome::Feasible { energy } => {
                    info!(
                        "Accepted weights {} after {} attempts (energy {:.4})",
                        weights,
                        attempts.len() + 1,
                        energy
                    );
                }
                AttemptOutcome::ConstraintViolation { broken, energy } => {
                    debug!(
                        "  Weights {} rejected (energy {:.4}): {}",
                        weights,
                        energy,
                        broken
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }
                AttemptOutcome::NoCandidates => {
                    warn!("Solver {} returned no samples for {}", self.solver.name(), weights);
                }
                AttemptOutcome::SolverUnavailable { reason } => {
                    warn!("Solver {} failed for {}: {}", self.solver.name(), weights, reason);
                }
                AttemptOutcome::TimedOut => {
                    warn!(
                        "Solver {} timed out after {:?} for {}",
                        self.solver.name(),
                        self.config.attempt_timeout,
                        weights
                    );
                }
            }

            let energy = match &outcome {
                AttemptOutcome::Feasible { energy } => Some(*energy),
                _ => None,
            };
            attempts.push(SearchAttempt { weights, outcome });

            if let (Some(energy), Some(plans)) = (energy, plans) {
                return SearchOutcome::Found(AcceptedWindow {
                    weights,
                    plans,
                    energy,
                    attempts,
                });
            }
        }

        SearchOutcome::Exhausted { attempts }
    }

    async fn attempt(&self, model: &WindowModel, qubo: &QuboModel) -> (AttemptOutcome, Option<Vec<SlotPlan>>) {
        let result = match timeout(self.config.attempt_timeout, self.solver.solve(qubo)).await {
            Err(_) => return (AttemptOutcome::TimedOut, None),
            Ok(Err(e)) => {
                return (
                    AttemptOutcome::SolverUnavailable {
                        reason: format!("{e:#}"),
                    },
                    None,
                );
            }
            Ok(Ok(result)) => result,
        };
        let Some(sample) = result.into_first() else {
            return (AttemptOutcome::NoCandidates, None);
        };

        let allocation = check_alloc(&model.arena, &sample);
        let plans = make_schedule(&allocation, model);
        let broken = broken_constraints(
            &plans,
            &model.window,
            model.limits.b_max,
            allocation.satisfied,
        );

        if broken.is_empty() {
            (
                AttemptOutcome::Feasible {
                    energy: sample.energy,
                },
                Some(plans),
            )
        } else {
            (
                AttemptOutcome::ConstraintViolation {
                    broken,
                    energy: sample.energy,
                },
                None,
            )
        }
    }
}
