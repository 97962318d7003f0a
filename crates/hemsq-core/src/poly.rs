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

//! Quadratic pseudo-boolean polynomials.

use std::collections::BTreeMap;
use std::ops::{Add, Mul};

use crate::arena::{Term, VarId};

/// `constant + Σ linear[i]·x_i + Σ quadratic[(i, j)]·x_i·x_j` with `i < j`
///
/// Binary variables satisfy `x² = x`, so squares are stored as linear terms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuboPoly {
    pub constant: f64,
    pub linear: BTreeMap<VarId, f64>,
    pub quadratic: BTreeMap<(VarId, VarId), f64>,
}

impl QuboPoly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn add_linear(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            *self.linear.entry(var).or_insert(0.0) += coef;
        }
    }

    pub fn add_quadratic(&mut self, a: VarId, b: VarId, coef: f64) {
        if coef == 0.0 {
            return;
        }
        if a == b {
            self.add_linear(a, coef);
            return;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        *self.quadratic.entry(key).or_insert(0.0) += coef;
    }

    /// `self += other * scale`
    pub fn add_scaled(&mut self, other: &QuboPoly, scale: f64) {
        self.constant += other.constant * scale;
        for (var, coef) in &other.linear {
            self.add_linear(*var, coef * scale);
        }
        for ((a, b), coef) in &other.quadratic {
            self.add_quadratic(*a, *b, coef * scale);
        }
    }

    /// Every variable with a linear or quadratic coefficient, ascending
    pub fn variables(&self) -> Vec<VarId> {
        let mut vars: Vec<VarId> = self
            .linear
            .keys()
            .copied()
            .chain(self.quadratic.keys().flat_map(|(a, b)| [*a, *b]))
            .collect();
        vars.sort_unstable();
        vars.dedup();
        vars
    }

    /// Evaluate the polynomial for an assignment
    pub fn energy(&self, value: impl Fn(VarId) -> bool) -> f64 {
        let linear: f64 = self
            .linear
            .iter()
            .filter(|(var, _)| value(**var))
            .map(|(_, coef)| coef)
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .filter(|((a, b), _)| value(*a) && value(*b))
            .map(|(_, coef)| coef)
            .sum();
        self.constant + linear + quadratic
    }
}

impl Mul<f64> for &QuboPoly {
    type Output = QuboPoly;

    fn mul(self, scale: f64) -> QuboPoly {
        let mut out = QuboPoly::new();
        out.add_scaled(self, scale);
        out
    }
}

impl Add for QuboPoly {
    type Output = QuboPoly;

    fn add(mut self, other: QuboPoly) -> QuboPoly {
        self.add_scaled(&other, 1.0);
        self
    }
}

/// Affine expression `constant + Σ coef·x` over binary variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub constant: f64,
    pub terms: Vec<(VarId, f64)>,
}

impl LinearExpr {
    pub fn constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: Vec::new(),
        }
    }

    /// Add `coef · term`; fixed terms fold into the constant
    pub fn add(&mut self, term: Term, coef: f64) {
        match term {
            Term::Fixed(true) => self.constant += coef,
            Term::Fixed(false) => {}
            Term::Var(var) => self.add_var(var, coef),
        }
    }

    pub fn add_var(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            constant: self.constant * factor,
            terms: self.terms.iter().map(|(v, c)| (*v, c * factor)).collect(),
        }
    }

    /// Coefficients merged by variable
    fn merged(&self) -> Vec<(VarId, f64)> {
        let mut merged: BTreeMap<VarId, f64> = BTreeMap::new();
        for (var, coef) in &self.terms {
            *merged.entry(*var).or_insert(0.0) += coef;
        }
        merged.into_iter().filter(|(_, c)| *c != 0.0).collect()
    }

    pub fn to_poly(&self) -> QuboPoly {
        let mut poly = QuboPoly::new();
        poly.add_constant(self.constant);
        for (var, coef) in &self.terms {
            poly.add_linear(*var, *coef);
        }
        poly
    }

    /// Expand `(c + Σ a_i·x_i)²` using `x² = x`
    pub fn squared(&self) -> QuboPoly {
        let terms = self.merged();
        let c = self.constant;
        let mut poly = QuboPoly::new();
        poly.add_constant(c * c);
        for (var, a) in &terms {
            poly.add_linear(*var, 2.0 * c * a + a * a);
        }
        for (i, (vi, ai)) in terms.iter().enumerate() {
            for (vj, aj) in &terms[i + 1..] {
                poly.add_quadratic(*vi, *vj, 2.0 * ai * aj);
            }
        }
        poly
    }

    /// Expand `self · other`
    pub fn product(&self, other: &LinearExpr) -> QuboPoly {
        let mut poly = QuboPoly::new();
        poly.add_constant(self.constant * other.constant);
        for (var, coef) in &self.terms {
            poly.add_linear(*var, coef * other.constant);
        }
        for (var, coef) in &other.terms {
            poly.add_linear(*var, coef * self.constant);
        }
        for (va, ca) in &self.terms {
            for (vb, cb) in &other.terms {
                poly.add_quadratic(*va, *vb, ca * cb);
            }
        }
        poly
    }

    pub fn evaluate(&self, value: impl Fn(VarId) -> bool) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .filter(|(var, _)| value(*var))
                .map(|(_, coef)| coef)
                .sum::<f64>()
    }
}
