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

//! Item classification: which actions exist in a window and what each one
//! does to the energy flows of a slot.

use hemsq_types::{ItemKind, SituationParams};
use serde::{Deserialize, Serialize};

use crate::series::{WindowInputs, quantize_amount};

/// Plant limits in integer units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantLimits {
    /// Battery capacity
    pub b_max: i64,
    /// Maximum charge per slot
    pub charge_limit: i64,
    /// Maximum discharge per slot
    pub discharge_limit: i64,
    /// Inverter output per slot
    pub rated_output: i64,
    /// Battery efficiency
    pub eta: f64,
}

impl PlantLimits {
    pub fn from_params(params: &SituationParams) -> Self {
        Self {
            b_max: quantize_amount(params.battery_capacity, params.unit),
            charge_limit: quantize_amount(params.b_in, params.unit),
            discharge_limit: quantize_amount(params.b_out, params.unit),
            rated_output: quantize_amount(params.rated_output, params.unit),
            eta: params.eta,
        }
    }

    /// Energy that reaches the battery for a given charge input
    pub fn stored(&self, charge: i64) -> i64 {
        (charge as f64 * self.eta).round() as i64
    }
}

/// Energy flows of one item in one slot (units)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub buy: i64,
    pub sell: i64,
    pub charge: i64,
    /// Charge after battery losses
    pub stored: i64,
    pub discharge: i64,
    pub solar_used: i64,
    pub solar_curtailed: i64,
}

impl Action {
    /// Energy delivered to the load
    pub fn supply(&self) -> i64 {
        self.buy + self.solar_used + self.discharge - self.charge
    }

    /// Solar energy accounted for
    pub fn solar_accounted(&self) -> i64 {
        self.solar_used + self.solar_curtailed + self.sell
    }

    pub fn battery_delta(&self) -> i64 {
        self.stored - self.discharge
    }
}

/// Flows produced by `kind` for a slot with the given demand and solar
pub fn item_action(kind: ItemKind, demand: i64, solar: i64, limits: &PlantLimits) -> Action {
    let surplus = (solar - demand).max(0);
    let deficit = (demand - solar).max(0);
    let to_load = solar.min(demand).max(0);

    match kind {
        ItemKind::Buy => Action {
            buy: deficit,
            solar_used: to_load,
            solar_curtailed: surplus,
            ..Action::default()
        },
        ItemKind::Sell => {
            let sell = surplus.min(limits.rated_output.max(0));
            Action {
                sell,
                solar_used: to_load,
                solar_curtailed: surplus - sell,
                ..Action::default()
            }
        }
        ItemKind::ChargeFromSolar => {
            let charge = surplus.min(limits.charge_limit.max(0));
            Action {
                charge,
                stored: limits.stored(charge),
                solar_used: to_load + charge,
                solar_curtailed: surplus - charge,
                ..Action::default()
            }
        }
        ItemKind::ChargeFromGrid => {
            let charge = limits.charge_limit.max(0);
            Action {
                buy: deficit + charge,
                charge,
                stored: limits.stored(charge),
                solar_used: to_load,
                solar_curtailed: surplus,
                ..Action::default()
            }
        }
        ItemKind::Discharge => Action {
            discharge: deficit
                .min(limits.discharge_limit.max(0))
                .min(limits.rated_output.max(0)),
            solar_used: to_load,
            solar_curtailed: surplus,
            ..Action::default()
        },
    }
}

/// Ordered set of items available in a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCatalog {
    kinds: Vec<ItemKind>,
}

impl ItemCatalog {
    /// Catalog with explicit kinds, deduplicated in first-seen order
    pub fn new(kinds: impl IntoIterator<Item = ItemKind>) -> Self {
        let mut unique = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        Self { kinds: unique }
    }

    /// Number of items per slot
    pub fn total(&self) -> usize {
        self.kinds.len()
    }

    pub fn kinds(&self) -> &[ItemKind] {
        &self.kinds
    }

    pub fn kind(&self, index: usize) -> ItemKind {
        self.kinds[index]
    }

    pub fn index_of(&self, kind: ItemKind) -> Option<usize> {
        self.kinds.iter().position(|k| *k == kind)
    }
}

/// Item set for a window given its demand and solar
pub fn classify(window: &WindowInputs, limits: &PlantLimits) -> ItemCatalog {
    let step = window.step();
    let any_surplus = (0..step).any(|t| window.surplus(t) > 0);
    let any_deficit = (0..step).any(|t| window.deficit(t) > 0);

    let kinds = ItemKind::all().iter().copied().filter(|kind| match kind {
        ItemKind::Buy => true,
        ItemKind::Sell => any_surplus && limits.rated_output > 0,
        ItemKind::ChargeFromSolar => any_surplus && limits.charge_limit > 0,
        ItemKind::ChargeFromGrid => limits.charge_limit > 0,
        ItemKind::Discharge => {
            any_deficit && limits.discharge_limit > 0 && limits.rated_output > 0
        }
    });
    ItemCatalog::new(kinds)
}

/// Flat indices (`slot * total + item`) of decisions that can never be 1
pub fn fixed_variables(
    catalog: &ItemCatalog,
    window: &WindowInputs,
    limits: &PlantLimits,
    b0: i64,
) -> Vec<usize> {
    let total = catalog.total();
    let mut fixed = Vec::new();

    for slot in 0..window.step() {
        for (item, kind) in catalog.kinds().iter().enumerate() {
            let action = item_action(
                *kind,
                window.demand[slot],
                window.solar[slot],
                limits,
            );
            let unusable = match kind {
                ItemKind::Buy => false,
                ItemKind::Sell | ItemKind::ChargeFromSolar => window.surplus(slot) == 0,
                ItemKind::ChargeFromGrid => false,
                ItemKind::Discharge => window.deficit(slot) == 0,
            };
            // Slot 0 starts from a known level
            let infeasible_from_start = slot == 0
                && ((kind.discharges_battery() && b0 < action.discharge)
                    || (kind.charges_battery() && b0 + action.stored > limits.b_max));

            if unusable || infeasible_from_start {
                fixed.push(slot * total + item);
            }
        }
    }
    fixed
}
