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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SituationParams;

// ============= Schedulable items =============

/// Action category available at a time slot (komoku)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Grid covers the deficit, surplus solar is curtailed
    Buy,
    /// Surplus solar is exported
    Sell,
    /// Surplus solar charges the battery
    ChargeFromSolar,
    /// Grid covers the deficit and charges the battery
    ChargeFromGrid,
    /// Battery covers the deficit
    Discharge,
}

impl ItemKind {
    /// All kinds in catalog order
    pub fn all() -> &'static [ItemKind] {
        &[
            Self::Buy,
            Self::Sell,
            Self::ChargeFromSolar,
            Self::ChargeFromGrid,
            Self::Discharge,
        ]
    }

    /// Stable identifier used in variable names and CSV output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::ChargeFromSolar => "charge_from_solar",
            Self::ChargeFromGrid => "charge_from_grid",
            Self::Discharge => "discharge",
        }
    }

    pub fn charges_battery(&self) -> bool {
        matches!(self, Self::ChargeFromSolar | Self::ChargeFromGrid)
    }

    pub fn discharges_battery(&self) -> bool {
        matches!(self, Self::Discharge)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============= Window schedules (integer units) =============

/// Decoded physical plan for one slot, in multiples of the unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPlan {
    /// Selected item, None when the slot had no unique selection
    pub item: Option<ItemKind>,
    pub buy: i64,
    pub sell: i64,
    /// Energy fed into the battery before losses
    pub charge: i64,
    pub discharge: i64,
    /// Solar consumed by the load or the battery
    pub solar_used: i64,
    pub solar_curtailed: i64,
    /// Battery level after the slot
    pub battery_level: i64,
}

impl SlotPlan {
    /// Energy delivered to the load
    pub fn supply(&self) -> i64 {
        self.buy + self.solar_used + self.discharge - self.charge
    }

    /// Solar energy accounted for by the plan
    pub fn solar_total(&self) -> i64 {
        self.solar_used + self.solar_curtailed + self.sell
    }
}

/// Penalty weights accepted for a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTuple {
    /// Constraint penalty weight
    pub w_p: f64,
    /// Weight of the "level <= capacity" inequality
    pub w_ineq1: f64,
    /// Weight of the "level >= 0" inequality
    pub w_ineq2: f64,
}

impl fmt::Display for WeightTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[w_p={:.1}, w_ineq1={:.1}, w_ineq2={:.1}]",
            self.w_p, self.w_ineq1, self.w_ineq2
        )
    }
}

// ============= Final result (actual energies) =============

/// One output slot in actual energy (Wh)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSlot {
    /// Hour of day (0-23)
    pub hour: usize,
    pub item: Option<ItemKind>,
    pub buy_wh: f64,
    pub sell_wh: f64,
    pub charge_wh: f64,
    pub discharge_wh: f64,
    pub solar_used_wh: f64,
    pub solar_curtailed_wh: f64,
    pub battery_level_wh: f64,
}

impl ScheduledSlot {
    pub fn supply_wh(&self) -> f64 {
        self.buy_wh + self.solar_used_wh + self.discharge_wh - self.charge_wh
    }

    pub fn solar_total_wh(&self) -> f64 {
        self.solar_used_wh + self.solar_curtailed_wh + self.sell_wh
    }
}

/// What happened in one rolling-horizon window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub index: usize,
    /// Absolute start slot (`start_time + reschedule_span * index`)
    pub start_time: usize,
    /// Battery level carried into the window (units)
    pub initial_battery: i64,
    /// Battery level after the last committed slot (units)
    pub final_battery: i64,
    /// Slots committed to the output
    pub committed_slots: usize,
    pub weights: WeightTuple,
    /// Solver invocations before the accepted one, inclusive
    pub attempts: usize,
}

/// Cost figures for a finished schedule (yen)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub purchase_cost: f64,
    pub sell_revenue: f64,
    pub environmental_cost: f64,
    /// Purchase cost minus sell revenue
    pub net_cost: f64,
    /// Net cost without a battery (deficit bought, surplus sold)
    pub baseline_cost: f64,
    pub savings: f64,
}

/// Output of a successful rolling-horizon run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub params: SituationParams,
    pub generated_at: DateTime<Utc>,
    /// Demand aligned with the output slots (Wh)
    pub demand_wh: Vec<f64>,
    /// Solar generation aligned with the output slots (Wh)
    pub solar_wh: Vec<f64>,
    /// Purchase price aligned with the output slots (yen/kWh)
    pub purchase_price: Vec<f64>,
    /// Sell price aligned with the output slots (yen/kWh)
    pub sell_price: Vec<f64>,
    pub slots: Vec<ScheduledSlot>,
    pub windows: Vec<WindowSummary>,
    pub cost: CostSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_flags() {
        assert!(ItemKind::ChargeFromSolar.charges_battery());
        assert!(ItemKind::ChargeFromGrid.charges_battery());
        assert!(!ItemKind::Buy.charges_battery());
        assert!(ItemKind::Discharge.discharges_battery());
        assert!(!ItemKind::Sell.discharges_battery());
        assert_eq!(ItemKind::all().len(), 5);
    }

    #[test]
    fn test_item_kind_serializes_as_label() {
        for kind in ItemKind::all() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
        }
    }

    #[test]
    fn test_slot_plan_balances() {
        let plan = SlotPlan {
            item: Some(ItemKind::ChargeFromSolar),
            buy: 0,
            sell: 0,
            charge: 2,
            discharge: 0,
            solar_used: 4,
            solar_curtailed: 1,
            battery_level: 7,
        };
        assert_eq!(plan.supply(), 2);
        assert_eq!(plan.solar_total(), 5);
    }

    #[test]
    fn test_weight_tuple_display() {
        let weights = WeightTuple {
            w_p: 3.9000000000000004,
            w_ineq1: 1.2,
            w_ineq2: 1.1,
        };
        assert_eq!(weights.to_string(), "[w_p=3.9, w_ineq1=1.2, w_ineq2=1.1]");
    }
}
