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

//! Output formatters for schedules.

use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use hemsq_types::{ScheduleResult, ScheduledSlot};
use std::io;
use std::path::Path;

/// Formatter for pretty tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for CSV export
#[derive(Debug)]
pub struct CsvFormatter;

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

fn item_label(slot: &ScheduledSlot) -> String {
    slot.item
        .map_or_else(|| "idle".to_owned(), |item| item.label().to_owned())
}

impl TableFormatter {
    /// Slot-by-slot schedule
    pub fn format_schedule(result: &ScheduleResult) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&[
            "Hour",
            "Item",
            "Demand\n(Wh)",
            "Solar\n(Wh)",
            "Buy\n(Wh)",
            "Sell\n(Wh)",
            "Charge\n(Wh)",
            "Discharge\n(Wh)",
            "Solar used\n(Wh)",
            "Curtailed\n(Wh)",
            "Battery\n(Wh)",
        ]));

        for (i, slot) in result.slots.iter().enumerate() {
            let item = Cell::new(item_label(slot));
            let item = match slot.item {
                Some(kind) if kind.charges_battery() => item.fg(Color::Green),
                Some(kind) if kind.discharges_battery() => item.fg(Color::Yellow),
                Some(_) => item,
                None => item.fg(Color::Red),
            };
            table.add_row(vec![
                Cell::new(format!("{:02}:00", slot.hour)),
                item,
                Cell::new(format!("{:.0}", result.demand_wh[i])),
                Cell::new(format!("{:.0}", result.solar_wh[i])),
                Cell::new(format!("{:.0}", slot.buy_wh)),
                Cell::new(format!("{:.0}", slot.sell_wh)),
                Cell::new(format!("{:.0}", slot.charge_wh)),
                Cell::new(format!("{:.0}", slot.discharge_wh)),
                Cell::new(format!("{:.0}", slot.solar_used_wh)),
                Cell::new(format!("{:.0}", slot.solar_curtailed_wh)),
                Cell::new(format!("{:.0}", slot.battery_level_wh)),
            ]);
        }

        let mut output = table.to_string();
        output.push('\n');
        output
    }

    /// Accepted weights and battery hand-over per window
    pub fn format_windows(result: &ScheduleResult) -> String {
        let unit = result.params.unit;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&[
            "Window",
            "Start",
            "Slots",
            "Battery in\n(Wh)",
            "Battery out\n(Wh)",
            "Weights",
            "Attempts",
        ]));

        for window in &result.windows {
            table.add_row(vec![
                Cell::new(window.index),
                Cell::new(window.start_time),
                Cell::new(window.committed_slots),
                Cell::new(format!("{:.0}", window.initial_battery as f64 * unit)),
                Cell::new(format!("{:.0}", window.final_battery as f64 * unit)),
                Cell::new(window.weights.to_string()),
                Cell::new(window.attempts),
            ]);
        }

        let mut output = table.to_string();
        output.push('\n');
        output
    }

    /// Cost summary against the no-battery baseline
    pub fn format_cost(result: &ScheduleResult) -> String {
        let cost = &result.cost;
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(header(&["Metric", "Value (yen)"]));

        let savings = Cell::new(format!("{:.2}", cost.savings));
        let savings = if cost.savings > 0.0 {
            savings.fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            savings
        };
        table.add_row(vec![Cell::new("Purchase cost"), Cell::new(format!("{:.2}", cost.purchase_cost))]);
        table.add_row(vec![Cell::new("Sell revenue"), Cell::new(format!("{:.2}", cost.sell_revenue))]);
        table.add_row(vec![Cell::new("Net cost"), Cell::new(format!("{:.2}", cost.net_cost))]);
        table.add_row(vec![
            Cell::new("Environmental cost"),
            Cell::new(format!("{:.2}", cost.environmental_cost)),
        ]);
        table.add_row(vec![
            Cell::new("Net cost without battery"),
            Cell::new(format!("{:.2}", cost.baseline_cost)),
        ]);
        table.add_row(vec![Cell::new("Savings"), savings]);

        let mut output = table.to_string();
        output.push('\n');
        output.push_str(&format!(
            "Schedule: {} slots from {:02}:00 | {} windows | generated {}\n",
            result.slots.len(),
            result.params.start_time,
            result.windows.len(),
            result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        output
    }
}

impl CsvFormatter {
    /// Write the schedule to a CSV file
    pub fn write_schedule(result: &ScheduleResult, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
        Self::write_to(result, file)
    }

    /// Write the schedule as CSV to any writer
    pub fn write_to<W: io::Write>(result: &ScheduleResult, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            "slot",
            "hour",
            "item",
            "demand_wh",
            "solar_wh",
            "purchase_price",
            "sell_price",
            "buy_wh",
            "sell_wh",
            "charge_wh",
            "discharge_wh",
            "solar_used_wh",
            "solar_curtailed_wh",
            "battery_level_wh",
        ])?;

        for (i, slot) in result.slots.iter().enumerate() {
            csv.write_record([
                i.to_string(),
                slot.hour.to_string(),
                item_label(slot),
                format!("{:.1}", result.demand_wh[i]),
                format!("{:.1}", result.solar_wh[i]),
                format!("{:.2}", result.purchase_price[i]),
                format!("{:.2}", result.sell_price[i]),
                format!("{:.1}", slot.buy_wh),
                format!("{:.1}", slot.sell_wh),
                format!("{:.1}", slot.charge_wh),
                format!("{:.1}", slot.discharge_wh),
                format!("{:.1}", slot.solar_used_wh),
                format!("{:.1}", slot.solar_curtailed_wh),
                format!("{:.1}", slot.battery_level_wh),
            ])?;
        }
        csv.flush().context("Failed to flush CSV output")?;
        Ok(())
    }
}
