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

//! Local simulated-annealing solver.
//!
//! Single-flip Metropolis sweeps over a geometric inverse-temperature
//! schedule. The schedule is derived from the polynomial: the hottest sweep
//! accepts the largest possible flip with probability 1/2, the coldest one
//! accepts the smallest coefficient with probability 1/100.
//!
//! Sampling runs on the blocking pool. Dropping the `solve` future (for
//! example on timeout) raises a cancel flag that the sweep loop checks, so
//! abandoned work stops after at most one sweep.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hemsq_core::{QuboModel, QuboPoly, QuboSolver, Sample, SolverResult, VarId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedAnnealingSolver {
    /// Independent restarts, each returning one sample
    pub reads: usize,
    /// Metropolis sweeps per read
    pub sweeps: usize,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulatedAnnealingSolver {
    fn default() -> Self {
        Self {
            reads: 16,
            sweeps: 1000,
            seed: None,
        }
    }
}

impl SimulatedAnnealingSolver {
    pub fn new(reads: usize, sweeps: usize) -> Self {
        Self {
            reads,
            sweeps,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn sample_model(&self, model: &QuboModel, cancel: &AtomicBool) -> Vec<Sample> {
        let dense = DenseQubo::from_poly(&model.poly);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut samples: Vec<Sample> = (0..self.reads)
            .take_while(|_| !cancel.load(Ordering::Relaxed))
            .map(|_| {
                let state = dense.anneal(self.sweeps, &mut rng, cancel);
                let mut values = BTreeMap::new();
                for (index, info) in model.variables.iter().enumerate() {
                    values.insert(VarId(index), info.fixed.unwrap_or(false));
                }
                for (local, id) in dense.ids.iter().enumerate() {
                    values.insert(*id, state[local]);
                }
                let energy = model
                    .poly
                    .energy(|id| values.get(&id).copied().unwrap_or(false));
                Sample { values, energy }
            })
            .collect();

        samples.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        samples
    }
}

/// Polynomial re-indexed to contiguous local variables
#[derive(Debug)]
struct DenseQubo {
    ids: Vec<VarId>,
    linear: Vec<f64>,
    neighbours: Vec<Vec<(usize, f64)>>,
    /// Largest possible |ΔE| of a single flip
    max_delta: f64,
    /// Smallest non-zero coefficient
    min_delta: f64,
}

impl DenseQubo {
    fn from_poly(poly: &QuboPoly) -> Self {
        let ids = poly.variables();
        let local: BTreeMap<VarId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut linear = vec![0.0; ids.len()];
        let mut neighbours = vec![Vec::new(); ids.len()];

        for (id, coef) in &poly.linear {
            linear[local[id]] += coef;
        }
        for ((a, b), coef) in &poly.quadratic {
            let (i, j) = (local[a], local[b]);
            neighbours[i].push((j, *coef));
            neighbours[j].push((i, *coef));
        }

        let max_delta = (0..ids.len())
            .map(|i| linear[i].abs() + neighbours[i].iter().map(|(_, c)| c.abs()).sum::<f64>())
            .fold(0.0, f64::max);
        let min_delta = poly
            .linear
            .values()
            .chain(poly.quadratic.values())
            .map(|c| c.abs())
            .filter(|c| *c > 1e-12)
            .fold(f64::INFINITY, f64::min);

        Self {
            ids,
            linear,
            neighbours,
            max_delta: if max_delta > 0.0 { max_delta } else { 1.0 },
            min_delta: if min_delta.is_finite() { min_delta } else { 1.0 },
        }
    }

    /// Energy change of setting variable `i` to 1 minus leaving it at 0
    fn field(&self, i: usize, state: &[bool]) -> f64 {
        self.linear[i]
            + self.neighbours[i]
                .iter()
                .filter(|(j, _)| state[*j])
                .map(|(_, c)| c)
                .sum::<f64>()
    }

    fn anneal(&self, sweeps: usize, rng: &mut StdRng, cancel: &AtomicBool) -> Vec<bool> {
        let n = self.ids.len();
        let mut state: Vec<bool> = (0..n).map(|_| rng.r#gen::<bool>()).collect();
        if n == 0 {
            return state;
        }

        let mut energy = 0.0;
        let mut best_energy = 0.0;
        let mut best = state.clone();
        let sweeps = sweeps.max(1);
        let beta_start = 2f64.ln() / self.max_delta;
        let beta_end = (100f64.ln() / self.min_delta).max(beta_start);
        let ratio = beta_end / beta_start;

        for sweep in 0..sweeps {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let progress = if sweeps > 1 {
                sweep as f64 / (sweeps - 1) as f64
            } else {
                1.0
            };
            let beta = beta_start * ratio.powf(progress);

            for i in 0..n {
                let field = self.field(i, &state);
                let delta = if state[i] { -field } else { field };
                if delta <= 0.0 || rng.r#gen::<f64>() < (-beta * delta).exp() {
                    state[i] = !state[i];
                    // Energy relative to the initial state
                    energy += delta;
                    if energy < best_energy {
                        best_energy = energy;
                        best.clone_from(&state);
                    }
                }
            }
        }
        best
    }
}

/// Raises the flag when dropped
#[derive(Debug)]
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[async_trait]
impl QuboSolver for SimulatedAnnealingSolver {
    async fn solve(&self, model: &QuboModel) -> Result<SolverResult> {
        let solver = self.clone();
        let model = model.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(Arc::clone(&cancel));
        let samples = tokio::task::spawn_blocking(move || solver.sample_model(&model, &cancel))
            .await
            .context("Annealing task failed")?;
        debug!(
            "Annealer returned {} samples, best energy {:?}",
            samples.len(),
            samples.first().map(|s| s.energy)
        );
        Ok(SolverResult { samples })
    }

    fn name(&self) -> &str {
        "simulated-annealing"
    }
}
