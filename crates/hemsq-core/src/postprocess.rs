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

//! Conversion of unit schedules back to energy and reconciliation with the
//! unquantized series.

use hemsq_types::{CostSummary, HOURS_PER_DAY, ScheduledSlot, SituationParams, SlotPlan};

const EPSILON_WH: f64 = 1e-6;

/// Integer-unit plans to Wh, labelled with the hour of day
pub fn descale(plans: &[SlotPlan], unit: f64, start_hour: usize) -> Vec<ScheduledSlot> {
    plans
        .iter()
        .enumerate()
        .map(|(i, plan)| ScheduledSlot {
            hour: (start_hour + i) % HOURS_PER_DAY,
            item: plan.item,
            buy_wh: plan.buy as f64 * unit,
            sell_wh: plan.sell as f64 * unit,
            charge_wh: plan.charge as f64 * unit,
            discharge_wh: plan.discharge as f64 * unit,
            solar_used_wh: plan.solar_used as f64 * unit,
            solar_curtailed_wh: plan.solar_curtailed as f64 * unit,
            battery_level_wh: plan.battery_level as f64 * unit,
        })
        .collect()
}

/// Take up to `amount` out of `value`, returning what is still missing
fn take(value: &mut f64, amount: f64) -> f64 {
    let taken = value.min(amount).max(0.0);
    *value -= taken;
    amount - taken
}

/// Absorb the quantization residue so each slot matches the actual series
///
/// Solar is reconciled first through curtailment, then export, then use.
/// Demand is reconciled through unused solar and grid purchase.
pub fn post_process(slots: &mut [ScheduledSlot], actual_solar: &[f64], actual_demand: &[f64]) {
    for (i, slot) in slots.iter_mut().enumerate() {
        let solar_residual = actual_solar[i] - slot.solar_total_wh();
        if solar_residual > EPSILON_WH {
            slot.solar_curtailed_wh += solar_residual;
        } else if solar_residual < -EPSILON_WH {
            let mut missing = -solar_residual;
            missing = take(&mut slot.solar_curtailed_wh, missing);
            missing = take(&mut slot.sell_wh, missing);
            take(&mut slot.solar_used_wh, missing);
        }

        let demand_residual = actual_demand[i] - slot.supply_wh();
        if demand_residual > EPSILON_WH {
            let moved = slot.solar_curtailed_wh.min(demand_residual);
            slot.solar_curtailed_wh -= moved;
            slot.solar_used_wh += moved;
            slot.buy_wh += demand_residual - moved;
        } else if demand_residual < -EPSILON_WH {
            let excess = take(&mut slot.buy_wh, -demand_residual);
            let moved = slot.solar_used_wh.min(excess);
            slot.solar_used_wh -= moved;
            slot.solar_curtailed_wh += moved;
        }
    }
}

/// Money and environmental figures of a schedule against the no-battery baseline
pub fn summarize_cost(
    slots: &[ScheduledSlot],
    demand_wh: &[f64],
    solar_wh: &[f64],
    purchase_price: &[f64],
    sell_price: &[f64],
    params: &SituationParams,
) -> CostSummary {
    let mut summary = CostSummary::default();
    let mut baseline = 0.0;

    for (i, slot) in slots.iter().enumerate() {
        let buy_kwh = slot.buy_wh / 1000.0;
        let sell_kwh = slot.sell_wh / 1000.0;
        summary.purchase_cost += buy_kwh * purchase_price[i];
        summary.sell_revenue += sell_kwh * sell_price[i] * params.conv_eff;
        summary.environmental_cost += buy_kwh * params.c_env;

        let deficit_kwh = (demand_wh[i] - solar_wh[i]).max(0.0) / 1000.0;
        let surplus_kwh = (solar_wh[i] - demand_wh[i]).max(0.0) / 1000.0;
        baseline += deficit_kwh * purchase_price[i] - surplus_kwh * sell_price[i] * params.conv_eff;
    }

    summary.net_cost = summary.purchase_cost - summary.sell_revenue;
    summary.baseline_cost = baseline;
    summary.savings = baseline - summary.net_cost;
    summary
}
