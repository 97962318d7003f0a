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

//! Situation parameters for one scheduling run.
//!
//! Energies are in Wh per hourly slot, prices in yen/kWh. The scheduler
//! treats this object as read-only input.

use crate::validation::ValidationResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const HOURS_PER_DAY: usize = 24;

/// Weather for one hour of the day, selects the solar profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Sunny,
    Cloudy,
    Rainy,
}

/// Expected PV generation per hour (Wh) for each weather type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarProfiles {
    #[serde(default = "default_sunny_profile")]
    pub sunny: Vec<f64>,
    #[serde(default = "default_cloudy_profile")]
    pub cloudy: Vec<f64>,
    #[serde(default = "default_rainy_profile")]
    pub rainy: Vec<f64>,
}

impl SolarProfiles {
    pub fn profile(&self, weather: Weather) -> &[f64] {
        match weather {
            Weather::Sunny => &self.sunny,
            Weather::Cloudy => &self.cloudy,
            Weather::Rainy => &self.rainy,
        }
    }
}

impl Default for SolarProfiles {
    fn default() -> Self {
        Self {
            sunny: default_sunny_profile(),
            cloudy: default_cloudy_profile(),
            rainy: default_rainy_profile(),
        }
    }
}

/// All inputs of a rolling-horizon scheduling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationParams {
    /// Quantization unit (Wh); every energy quantity is a multiple of it
    #[serde(default = "default_unit")]
    pub unit: f64,

    /// Usable battery capacity (Wh)
    #[serde(default = "default_battery_capacity")]
    pub battery_capacity: f64,

    /// Battery charge at `start_time` (Wh)
    #[serde(default = "default_initial_battery_amount")]
    pub initial_battery_amount: f64,

    /// Maximum energy charged in one slot (Wh)
    #[serde(default = "default_b_in")]
    pub b_in: f64,

    /// Maximum energy discharged in one slot (Wh)
    #[serde(default = "default_b_out")]
    pub b_out: f64,

    /// Battery round-trip efficiency (0.0 to 1.0)
    #[serde(default = "default_eta")]
    pub eta: f64,

    /// Inverter conversion efficiency (0.0 to 1.0)
    #[serde(default = "default_conv_eff")]
    pub conv_eff: f64,

    /// Rated inverter output per slot (Wh)
    #[serde(default = "default_rated_output")]
    pub rated_output: f64,

    /// Weight of the economic cost against the environmental cost (0.0 to 1.0)
    #[serde(default = "default_cost_ratio")]
    pub cost_ratio: f64,

    /// Environmental cost of grid energy (yen/kWh equivalent)
    #[serde(default = "default_c_env")]
    pub c_env: f64,

    /// Price paid for exported energy (yen/kWh)
    #[serde(default = "default_sell_price")]
    pub sell_price: f64,

    /// Hour of day (0-23) of the first output slot
    #[serde(default)]
    pub start_time: usize,

    /// Slots per optimization window
    #[serde(default = "default_step")]
    pub step: usize,

    /// Number of output slots
    #[serde(default = "default_output_len")]
    pub output_len: usize,

    /// Leading slots of each window committed before re-optimizing
    #[serde(default = "default_reschedule_span")]
    pub reschedule_span: usize,

    /// Weather per hour of day (24 entries)
    #[serde(default = "default_weather")]
    pub weather: Vec<Weather>,

    /// Household demand per hour of day (Wh, 24 entries)
    #[serde(default = "default_demand")]
    pub demand: Vec<f64>,

    /// Grid purchase price per hour of day (yen/kWh, 24 entries)
    #[serde(default = "default_ele_prices")]
    pub ele_prices: Vec<f64>,

    /// PV generation profiles per weather type
    #[serde(default)]
    pub solar_profiles: SolarProfiles,
}

fn default_unit() -> f64 {
    500.0
}

fn default_battery_capacity() -> f64 {
    5000.0
}

fn default_initial_battery_amount() -> f64 {
    2500.0
}

fn default_b_in() -> f64 {
    1000.0
}

fn default_b_out() -> f64 {
    1000.0
}

fn default_eta() -> f64 {
    0.9
}

fn default_conv_eff() -> f64 {
    0.95
}

fn default_rated_output() -> f64 {
    3000.0
}

fn default_cost_ratio() -> f64 {
    0.5
}

fn default_c_env() -> f64 {
    10.0
}

fn default_sell_price() -> f64 {
    8.0
}

fn default_step() -> usize {
    8
}

fn default_output_len() -> usize {
    24
}

fn default_reschedule_span() -> usize {
    4
}

fn default_weather() -> Vec<Weather> {
    vec![Weather::Sunny; HOURS_PER_DAY]
}

fn default_demand() -> Vec<f64> {
    vec![
        300.0, 250.0, 250.0, 250.0, 250.0, 300.0, 500.0, 800.0, 700.0, 500.0, 400.0, 400.0, 500.0,
        400.0, 400.0, 400.0, 500.0, 700.0, 900.0, 1000.0, 900.0, 700.0, 500.0, 400.0,
    ]
}

fn default_ele_prices() -> Vec<f64> {
    // Time-of-use tariff: cheap night, day rate, evening peak
    let mut prices = vec![26.0; HOURS_PER_DAY];
    for hour in (0..7).chain(23..HOURS_PER_DAY) {
        prices[hour] = 17.0;
    }
    for price in &mut prices[17..21] {
        *price = 35.0;
    }
    prices
}

fn default_sunny_profile() -> Vec<f64> {
    vec![
        0.0, 0.0, 0.0, 0.0, 0.0, 50.0, 300.0, 700.0, 1200.0, 1700.0, 2100.0, 2400.0, 2500.0,
        2400.0, 2100.0, 1700.0, 1200.0, 700.0, 300.0, 50.0, 0.0, 0.0, 0.0, 0.0,
    ]
}

fn default_cloudy_profile() -> Vec<f64> {
    default_sunny_profile().iter().map(|wh| wh * 0.4).collect()
}

fn default_rainy_profile() -> Vec<f64> {
    default_sunny_profile().iter().map(|wh| wh * 0.1).collect()
}

impl Default for SituationParams {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            battery_capacity: default_battery_capacity(),
            initial_battery_amount: default_initial_battery_amount(),
            b_in: default_b_in(),
            b_out: default_b_out(),
            eta: default_eta(),
            conv_eff: default_conv_eff(),
            rated_output: default_rated_output(),
            cost_ratio: default_cost_ratio(),
            c_env: default_c_env(),
            sell_price: default_sell_price(),
            start_time: 0,
            step: default_step(),
            output_len: default_output_len(),
            reschedule_span: default_reschedule_span(),
            weather: default_weather(),
            demand: default_demand(),
            ele_prices: default_ele_prices(),
            solar_profiles: SolarProfiles::default(),
        }
    }
}

impl SituationParams {
    /// Load parameters from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameter file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse parameter file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let params: SituationParams = toml::from_str(content)?;
        Ok(params)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of whole units the battery holds
    pub fn battery_units(&self) -> i64 {
        (self.battery_capacity / self.unit).trunc() as i64
    }

    /// Validate with field-level detail
    pub fn validate_detailed(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        if !(self.unit > 0.0) {
            result.add_error("unit", "Unit must be greater than 0");
            // Every other check depends on the unit
            return result;
        }

        if self.battery_units() < 2 {
            result.add_error(
                "battery_capacity",
                format!(
                    "Battery capacity must hold at least 2 units ({} Wh)",
                    self.unit * 2.0
                ),
            );
        }
        if self.initial_battery_amount < 0.0 || self.initial_battery_amount > self.battery_capacity
        {
            result.add_error(
                "initial_battery_amount",
                "Initial battery amount must be between 0 and battery_capacity",
            );
        }
        if self.b_in < 0.0 {
            result.add_error("b_in", "Charge limit cannot be negative");
        } else if self.b_in < self.unit {
            result.add_warning("b_in", "Charge limit below one unit disables charging");
        }
        if self.b_out < 0.0 {
            result.add_error("b_out", "Discharge limit cannot be negative");
        } else if self.b_out < self.unit {
            result.add_warning("b_out", "Discharge limit below one unit disables discharging");
        }
        if !(self.eta > 0.0 && self.eta <= 1.0) {
            result.add_error("eta", "Round-trip efficiency must be in (0, 1]");
        }
        if !(self.conv_eff > 0.0 && self.conv_eff <= 1.0) {
            result.add_error("conv_eff", "Conversion efficiency must be in (0, 1]");
        }
        if self.rated_output < 0.0 {
            result.add_error("rated_output", "Rated output cannot be negative");
        }
        if !(0.0..=1.0).contains(&self.cost_ratio) {
            result.add_error("cost_ratio", "Cost ratio must be between 0 and 1");
        }
        if self.c_env < 0.0 {
            result.add_error("c_env", "Environmental cost cannot be negative");
        }
        if self.sell_price < 0.0 {
            result.add_warning("sell_price", "Negative sell price makes exporting a cost");
        }

        if self.start_time >= HOURS_PER_DAY {
            result.add_error("start_time", "Start time must be an hour between 0 and 23");
        }
        if self.step == 0 || self.step > HOURS_PER_DAY {
            result.add_error("step", "Window length must be between 1 and 24 slots");
        }
        if self.output_len == 0 {
            result.add_error("output_len", "Output length must be at least 1 slot");
        }
        if self.reschedule_span == 0 || self.reschedule_span > self.step {
            result.add_error(
                "reschedule_span",
                "Reschedule span must be between 1 and the window length (step)",
            );
        } else if self.output_len % self.reschedule_span != 0 {
            result.add_warning(
                "reschedule_span",
                "Output length is not a multiple of the reschedule span; the last window is partial",
            );
        }

        check_series(&mut result, "demand", &self.demand, false);
        check_series(&mut result, "ele_prices", &self.ele_prices, true);
        check_series(&mut result, "solar_profiles.sunny", &self.solar_profiles.sunny, false);
        check_series(&mut result, "solar_profiles.cloudy", &self.solar_profiles.cloudy, false);
        check_series(&mut result, "solar_profiles.rainy", &self.solar_profiles.rainy, false);
        if self.weather.len() != HOURS_PER_DAY {
            result.add_error(
                "weather",
                format!(
                    "Weather needs {HOURS_PER_DAY} hourly entries, got {}",
                    self.weather.len()
                ),
            );
        }

        result
    }

    /// Validate and fail on the first error set
    pub fn validate(&self) -> Result<()> {
        let result = self.validate_detailed();
        if result.has_errors() {
            let messages: Vec<String> = result.errors.iter().map(ToString::to_string).collect();
            anyhow::bail!("Invalid parameters: {}", messages.join("; "));
        }
        Ok(())
    }

    /// Example parameter file as TOML
    pub fn example_toml() -> String {
        r#"# HemsQ - Scheduling parameters
# Energies in Wh per hourly slot, prices in yen/kWh.

unit = 500.0
battery_capacity = 5000.0
initial_battery_amount = 2500.0
b_in = 1000.0
b_out = 1000.0
eta = 0.9
conv_eff = 0.95
rated_output = 3000.0
cost_ratio = 0.5
c_env = 10.0
sell_price = 8.0

start_time = 6       # first output hour
step = 8             # slots per optimization window
output_len = 24      # slots in the final schedule
reschedule_span = 4  # slots committed per window

weather = [
    "sunny", "sunny", "sunny", "sunny", "sunny", "sunny",
    "sunny", "sunny", "sunny", "cloudy", "cloudy", "cloudy",
    "cloudy", "sunny", "sunny", "sunny", "sunny", "sunny",
    "sunny", "sunny", "sunny", "sunny", "sunny", "sunny",
]

# Omitted series (demand, ele_prices, solar_profiles) use built-in profiles.
"#
        .to_owned()
    }
}

fn check_series(result: &mut ValidationResult, field: &str, series: &[f64], allow_negative: bool) {
    if series.len() != HOURS_PER_DAY {
        result.add_error(
            field,
            format!(
                "Expected {HOURS_PER_DAY} hourly values, got {}",
                series.len()
            ),
        );
        return;
    }
    if series.iter().any(|v| !v.is_finite()) {
        result.add_error(field, "Values must be finite numbers");
    } else if !allow_negative && series.iter().any(|v| *v < 0.0) {
        result.add_error(field, "Values cannot be negative");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_params_are_valid() {
        let params = SituationParams::default();
        let result = params.validate_detailed();
        assert!(result.valid, "unexpected errors: {:?}", result.errors);
        assert!(params.validate().is_ok());
        assert_eq!(params.battery_units(), 10);
    }

    #[test]
    fn test_example_toml_parses() {
        let params = SituationParams::from_toml_str(&SituationParams::example_toml()).unwrap();
        assert_eq!(params.start_time, 6);
        assert_eq!(params.weather[9], Weather::Cloudy);
        assert_eq!(params.demand.len(), HOURS_PER_DAY);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let params = SituationParams {
            start_time: 13,
            step: 6,
            reschedule_span: 3,
            ..SituationParams::default()
        };

        let toml_str = params.to_toml().unwrap();
        let parsed = SituationParams::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "unit = 250.0\nbattery_capacity = 3000.0\nstep = 6").unwrap();

        let params = SituationParams::from_file(file.path()).unwrap();
        assert_eq!(params.unit, 250.0);
        assert_eq!(params.battery_units(), 12);
        assert_eq!(params.step, 6);
        assert_eq!(params.output_len, 24);
    }

    #[test]
    fn test_from_missing_file_fails_with_context() {
        let err = SituationParams::from_file("/nonexistent/hemsq.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read parameter file"));
    }

    #[test]
    fn test_validation_rejects_span_longer_than_step() {
        let params = SituationParams {
            step: 4,
            reschedule_span: 6,
            ..SituationParams::default()
        };
        let result = params.validate_detailed();
        assert!(result.has_error_for("reschedule_span"));
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validation_warns_on_partial_last_window() {
        let params = SituationParams {
            output_len: 10,
            reschedule_span: 4,
            ..SituationParams::default()
        };
        let result = params.validate_detailed();
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.field == "reschedule_span"));
    }

    #[test]
    fn test_validation_rejects_tiny_battery_and_short_series() {
        let params = SituationParams {
            battery_capacity: 700.0,
            demand: vec![100.0; 12],
            weather: vec![Weather::Rainy; 3],
            ..SituationParams::default()
        };
        let result = params.validate_detailed();
        assert!(result.has_error_for("battery_capacity"));
        assert!(result.has_error_for("demand"));
        assert!(result.has_error_for("weather"));
    }

    #[test]
    fn test_validation_stops_on_zero_unit() {
        let params = SituationParams {
            unit: 0.0,
            ..SituationParams::default()
        };
        let result = params.validate_detailed();
        assert_eq!(result.errors.len(), 1);
        assert!(result.has_error_for("unit"));
    }

    #[test]
    fn test_profile_lookup() {
        let profiles = SolarProfiles::default();
        assert_eq!(profiles.profile(Weather::Sunny)[12], 2500.0);
        assert_eq!(profiles.profile(Weather::Cloudy)[12], 1000.0);
        assert_eq!(profiles.profile(Weather::Rainy)[12], 250.0);
    }
}
