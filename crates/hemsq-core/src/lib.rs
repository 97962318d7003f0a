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

//! HemsQ core: QUBO formulation of home-energy scheduling, adaptive
//! penalty-weight search and the rolling horizon that ties windows together.

pub mod arena;
pub mod builder;
pub mod error;
pub mod feasibility;
pub mod items;
pub mod poly;
pub mod postprocess;
pub mod scheduler;
pub mod search;
pub mod series;
pub mod solver;

pub use arena::{Term, VarId, VariableArena, VariableInfo, slack_bits};
pub use builder::{CostParams, ObjectiveTerms, PenaltyWeights, WindowModel};
pub use error::{Result, SchedulerError};
pub use feasibility::{Allocation, BrokenConstraint, broken_constraints, check_alloc, make_schedule};
pub use items::{Action, ItemCatalog, PlantLimits, classify, fixed_variables, item_action};
pub use poly::{LinearExpr, QuboPoly};
pub use scheduler::{RollingScheduler, SchedulerPhase, window_spans};
pub use search::{
    AcceptedWindow, AttemptOutcome, SearchAttempt, SearchConfig, SearchOutcome, WeightGrid,
    WeightRange, WeightSearch,
};
pub use series::{PreparedSeries, WindowInputs};
pub use solver::{QuboModel, QuboSolver, Sample, SolverResult};
