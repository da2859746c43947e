//! Historical rate tracking for sparklines and change indicators.

use std::collections::{HashMap, VecDeque};

use super::rates::{RateKey, RateReading};

/// Maximum number of samples to keep per rate.
const MAX_HISTORY_SIZE: usize = 60;

/// Tracks recent readings so the UI can draw trends.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Recent values per rate, oldest first.
    pub rates: HashMap<RateKey, VecDeque<f64>>,
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful reading.
    pub fn record(&mut self, reading: &RateReading) {
        for key in RateKey::ALL {
            let values = self.rates.entry(key).or_default();
            values.push_back(reading.get(key));
            if values.len() > MAX_HISTORY_SIZE {
                values.pop_front();
            }
        }
    }

    /// Number of samples recorded for a rate.
    pub fn len(&self, key: RateKey) -> usize {
        self.rates.get(&key).map_or(0, VecDeque::len)
    }

    /// Get sparkline levels (0-7 for 8 bar heights), scaled between the
    /// window's min and max.
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn sparkline(&self, key: RateKey) -> Vec<u8> {
        let Some(values) = self.rates.get(&key) else {
            return Vec::new();
        };

        if values.len() < 2 {
            return Vec::new();
        }

        let (min, max) = min_max(values);
        let range = max - min;

        values
            .iter()
            .map(|&v| {
                if range <= f64::EPSILON {
                    // Flat series sits mid-height
                    3
                } else {
                    (((v - min) / range) * 7.0).round().clamp(0.0, 7.0) as u8
                }
            })
            .collect()
    }

    /// Lowest and highest value in the window.
    pub fn range(&self, key: RateKey) -> Option<(f64, f64)> {
        let values = self.rates.get(&key)?;
        if values.is_empty() {
            return None;
        }
        Some(min_max(values))
    }

    /// Change between the last two samples.
    pub fn change(&self, key: RateKey) -> Option<f64> {
        let values = self.rates.get(&key)?;
        if values.len() < 2 {
            return None;
        }
        let current = *values.back()?;
        let previous = *values.get(values.len() - 2)?;
        Some(current - previous)
    }
}

fn min_max(values: &VecDeque<f64>) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
