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

//! HemsQ scheduler runner
//!
//! Wires the rolling-horizon scheduler from `hemsq-core` to a local
//! simulated-annealing QUBO solver and provides the `hemsq` command line.
//!
//! # Example
//!
//! ```ignore
//! use hemsq_core::RollingScheduler;
//! use hemsq_sim::SimulatedAnnealingSolver;
//! use hemsq_types::SituationParams;
//! use std::sync::Arc;
//!
//! let solver = Arc::new(SimulatedAnnealingSolver::default().with_seed(42));
//! let mut scheduler = RollingScheduler::new(solver);
//! let result = scheduler.solve(&SituationParams::default()).await?;
//! println!("net cost {:.2} yen", result.cost.net_cost);
//! ```

pub mod annealer;
pub mod cli;

pub use annealer::SimulatedAnnealingSolver;
