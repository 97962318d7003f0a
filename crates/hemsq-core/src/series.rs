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

//! Time-series preprocessing: quantization, normalization and circular rotation.
//!
//! All transforms are pure. Indices outside the series are programming errors
//! and panic through slice indexing.

use hemsq_types::{HOURS_PER_DAY, SituationParams, SolarProfiles, Weather};

/// Scale applied to prices on top of the unit conversion to keep objective
/// magnitudes in the range the solver handles well
pub const NORMALIZE_RATE: f64 = 0.01;

/// Round a value to the nearest number of units
pub fn quantize_value(value: f64, unit: f64) -> i64 {
    (value / unit).round() as i64
}

/// Round every value of a series to the nearest number of units
pub fn quantize(series: &[f64], unit: f64) -> Vec<i64> {
    series.iter().map(|v| quantize_value(*v, unit)).collect()
}

/// Whole units contained in an amount (truncating), used for capacities and limits
pub fn quantize_amount(amount: f64, unit: f64) -> i64 {
    (amount / unit).trunc() as i64
}

/// Multiply every value by `factor`
pub fn normalize(series: &[f64], factor: f64) -> Vec<f64> {
    series.iter().map(|v| v * factor).collect()
}

/// Factor that turns a yen/kWh price into a normalized price per unit
pub fn price_factor(unit: f64) -> f64 {
    NORMALIZE_RATE * unit / 1000.0
}

/// Circular sub-sequence starting at `start` and ending at `end` (inclusive)
///
/// When `end < start` the sequence wraps across the end of the series.
pub fn rotate<T: Copy>(start: usize, end: usize, series: &[T]) -> Vec<T> {
    let n = series.len();
    assert!(start < n && end < n, "rotation range {start}..={end} outside series of {n}");
    let len = if end >= start {
        end - start + 1
    } else {
        n - start + end + 1
    };
    rotate_len(start, len, series)
}

/// Circular sub-sequence of `len` values starting at `start`
pub fn rotate_len<T: Copy>(start: usize, len: usize, series: &[T]) -> Vec<T> {
    let n = series.len();
    (0..len).map(|k| series[(start + k) % n]).collect()
}

/// Hourly PV generation given the weather of each hour
pub fn solar_by_weather(profiles: &SolarProfiles, weather: &[Weather]) -> Vec<f64> {
    weather
        .iter()
        .enumerate()
        .map(|(hour, w)| profiles.profile(*w)[hour])
        .collect()
}

/// Inputs of one scheduling window, aligned so index 0 is the window's first slot
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInputs {
    /// Hour of day of the first slot
    pub start_hour: usize,
    /// Demand per slot (units)
    pub demand: Vec<i64>,
    /// Solar generation per slot (units)
    pub solar: Vec<i64>,
    /// Normalized purchase price per slot
    pub purchase_price: Vec<f64>,
    /// Normalized sell price per slot
    pub sell_price: Vec<f64>,
}

impl WindowInputs {
    pub fn step(&self) -> usize {
        self.demand.len()
    }

    /// Solar left after covering demand
    pub fn surplus(&self, slot: usize) -> i64 {
        (self.solar[slot] - self.demand[slot]).max(0)
    }

    /// Demand left after using solar
    pub fn deficit(&self, slot: usize) -> i64 {
        (self.demand[slot] - self.solar[slot]).max(0)
    }
}

/// Day-long series quantized and normalized once per run
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub demand: Vec<i64>,
    pub solar: Vec<i64>,
    pub purchase_price: Vec<f64>,
    pub sell_price: Vec<f64>,
}

impl PreparedSeries {
    pub fn from_params(params: &SituationParams) -> Self {
        let factor = price_factor(params.unit);
        let solar = solar_by_weather(&params.solar_profiles, &params.weather);
        Self {
            demand: quantize(&params.demand, params.unit),
            solar: quantize(&solar, params.unit),
            purchase_price: normalize(&params.ele_prices, factor),
            sell_price: normalize(&[params.sell_price; HOURS_PER_DAY], factor),
        }
    }

    /// Slice `step` slots starting at absolute slot `resche_start`
    pub fn window(&self, resche_start: usize, step: usize) -> WindowInputs {
        let start = resche_start % HOURS_PER_DAY;
        let end = (resche_start + step - 1) % HOURS_PER_DAY;
        WindowInputs {
            start_hour: start,
            demand: rotate(start, end, &self.demand),
            solar: rotate(start, end, &self.solar),
            purchase_price: rotate(start, end, &self.purchase_price),
            sell_price: rotate(start, end, &self.sell_price),
        }
    }
}
