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

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::arena::{VarId, VariableInfo};
use crate::poly::QuboPoly;

// ============= Solver boundary =============

/// Polynomial plus variable metadata handed to a solver
#[derive(Debug, Clone)]
pub struct QuboModel {
    pub poly: QuboPoly,
    /// Indexed by `VarId`
    pub variables: Arc<[VariableInfo]>,
}

impl QuboModel {
    pub fn new(poly: QuboPoly, variables: impl Into<Arc<[VariableInfo]>>) -> Self {
        Self {
            poly,
            variables: variables.into(),
        }
    }

    pub fn variable(&self, id: VarId) -> Option<&VariableInfo> {
        self.variables.get(id.0)
    }

    /// Id of the variable with the given name
    pub fn find(&self, name: &str) -> Option<VarId> {
        self.variables.iter().position(|v| v.name == name).map(VarId)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }
}

/// One binary assignment returned by a solver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    /// Missing entries read as 0
    pub values: BTreeMap<VarId, bool>,
    pub energy: f64,
}

impl Sample {
    pub fn value(&self, id: VarId) -> bool {
        self.values.get(&id).copied().unwrap_or(false)
    }
}

/// Samples ordered best first; may be empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverResult {
    pub samples: Vec<Sample>,
}

impl SolverResult {
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn into_first(self) -> Option<Sample> {
        self.samples.into_iter().next()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// External combinatorial solver
#[async_trait]
pub trait QuboSolver: Send + Sync {
    /// Minimize the model's polynomial
    async fn solve(&self, model: &QuboModel) -> Result<SolverResult>;

    /// Solver name for logs
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sample_entries_read_as_zero() {
        let mut sample = Sample::default();
        sample.values.insert(VarId(2), true);
        assert!(sample.value(VarId(2)));
        assert!(!sample.value(VarId(7)));
    }

    #[test]
    fn test_empty_result_has_no_first_sample() {
        let result = SolverResult::default();
        assert!(result.is_empty());
        assert!(result.first().is_none());
        assert!(result.into_first().is_none());
    }

    #[test]
    fn test_model_lookup_by_name() {
        let model = QuboModel::new(
            QuboPoly::new(),
            vec![
                VariableInfo {
                    name: "x[0][buy]".to_owned(),
                    fixed: None,
                },
                VariableInfo {
                    name: "y1[0][0]".to_owned(),
                    fixed: None,
                },
            ],
        );
        assert_eq!(model.find("y1[0][0]"), Some(VarId(1)));
        assert_eq!(model.find("y2[0][0]"), None);
        assert_eq!(model.num_variables(), 2);
    }
}
