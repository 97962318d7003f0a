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

//! Scripted solvers for exercising the search and the rolling horizon

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use hemsq_core::{QuboModel, QuboSolver, Sample, SolverResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hemsq_core=debug")
        .with_test_writer()
        .try_init();
}

/// Number of slots in the model, read from the decision names
pub fn slot_count(model: &QuboModel) -> usize {
    (0..)
        .take_while(|slot| {
            model
                .variables
                .iter()
                .any(|v| v.name.starts_with(&format!("x[{slot}]")))
        })
        .count()
}

/// Whether a decision exists and is not fixed to 0
pub fn is_live(model: &QuboModel, name: &str) -> bool {
    model
        .find(name)
        .and_then(|id| model.variable(id))
        .is_some_and(|v| v.fixed != Some(false))
}

/// Sample with the named variables set to 1 and everything else 0
pub fn sample_with(model: &QuboModel, names: &[String]) -> Sample {
    let mut sample = Sample::default();
    for name in names {
        if let Some(id) = model.find(name) {
            sample.values.insert(id, true);
        }
    }
    sample.energy = model.poly.energy(|id| sample.value(id));
    sample
}

/// Picks one item per slot; `choose(model, slot)` returns the item label
pub fn per_slot_sample(model: &QuboModel, choose: impl Fn(&QuboModel, usize) -> &'static str) -> Sample {
    let names: Vec<String> = (0..slot_count(model))
        .map(|slot| format!("x[{slot}][{}]", choose(model, slot)))
        .collect();
    sample_with(model, &names)
}

type Script = dyn Fn(&QuboModel, usize) -> Result<SolverResult> + Send + Sync;

/// Solver whose answer depends on the model and the call number (0-based)
pub struct ScriptedSolver {
    script: Box<Script>,
    delay: Option<(usize, Duration)>,
    calls: AtomicUsize,
}

impl ScriptedSolver {
    pub fn new(
        script: impl Fn(&QuboModel, usize) -> Result<SolverResult> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering calls with number below `calls`
    pub fn with_delay(mut self, calls: usize, delay: Duration) -> Self {
        self.delay = Some((calls, delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuboSolver for ScriptedSolver {
    async fn solve(&self, model: &QuboModel) -> Result<SolverResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((slow_calls, delay)) = self.delay {
            if call < slow_calls {
                tokio::time::sleep(delay).await;
            }
        }
        (self.script)(model, call)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn single(sample: Sample) -> Result<SolverResult> {
    Ok(SolverResult {
        samples: vec![sample],
    })
}

/// Buy at every slot; feasible for any window
pub fn buy_everywhere(model: &QuboModel) -> Result<SolverResult> {
    single(per_slot_sample(model, |_, _| "buy"))
}
