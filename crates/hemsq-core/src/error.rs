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

//! Error types for the scheduler

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("window {window} (start {start_time}): slot {slot} has no usable item")]
    StructuralInfeasibility {
        window: usize,
        start_time: usize,
        slot: usize,
    },

    #[error(
        "window {window} (start {start_time}): no feasible schedule after {attempts} weight combinations ({solver_failures} solver failures)"
    )]
    GridExhausted {
        window: usize,
        start_time: usize,
        attempts: usize,
        solver_failures: usize,
    },
}

impl SchedulerError {
    /// Index of the window that failed, if any
    pub fn window(&self) -> Option<usize> {
        match self {
            Self::InvalidParams(_) => None,
            Self::StructuralInfeasibility { window, .. } | Self::GridExhausted { window, .. } => {
                Some(*window)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
