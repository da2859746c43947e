//! Rate readings, thresholds and the worker-owned sample state.

use serde::{Deserialize, Serialize};

/// Lending term of a repo rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Horizon {
    OneDay,
    SevenDay,
}

impl Horizon {
    pub const ALL: [Horizon; 2] = [Horizon::OneDay, Horizon::SevenDay];

    /// Returns the panel title for this horizon.
    pub fn label(&self) -> &'static str {
        match self {
            Horizon::OneDay => "1 DAY",
            Horizon::SevenDay => "7 DAYS",
        }
    }
}

/// Currency a rate is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    Domestic,
    Foreign,
}

/// Identifies one of the four monitored rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RateKey {
    pub horizon: Horizon,
    pub currency: Currency,
}

impl RateKey {
    pub const DOMESTIC_1D: RateKey = RateKey::new(Horizon::OneDay, Currency::Domestic);
    pub const FOREIGN_1D: RateKey = RateKey::new(Horizon::OneDay, Currency::Foreign);
    pub const DOMESTIC_7D: RateKey = RateKey::new(Horizon::SevenDay, Currency::Domestic);
    pub const FOREIGN_7D: RateKey = RateKey::new(Horizon::SevenDay, Currency::Foreign);

    /// All keys in display order.
    pub const ALL: [RateKey; 4] = [
        RateKey::DOMESTIC_1D,
        RateKey::FOREIGN_1D,
        RateKey::DOMESTIC_7D,
        RateKey::FOREIGN_7D,
    ];

    pub const fn new(horizon: Horizon, currency: Currency) -> Self {
        Self { horizon, currency }
    }

    /// Short identifier used in logs and exports, e.g. `domestic_1d`.
    pub fn id(&self) -> &'static str {
        match (self.currency, self.horizon) {
            (Currency::Domestic, Horizon::OneDay) => "domestic_1d",
            (Currency::Foreign, Horizon::OneDay) => "foreign_1d",
            (Currency::Domestic, Horizon::SevenDay) => "domestic_7d",
            (Currency::Foreign, Horizon::SevenDay) => "foreign_7d",
        }
    }
}

/// The four rates extracted from one page, as percentages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateReading {
    pub domestic_1d: f64,
    pub foreign_1d: f64,
    pub domestic_7d: f64,
    pub foreign_7d: f64,
}

impl RateReading {
    pub fn get(&self, key: RateKey) -> f64 {
        match (key.currency, key.horizon) {
            (Currency::Domestic, Horizon::OneDay) => self.domestic_1d,
            (Currency::Foreign, Horizon::OneDay) => self.foreign_1d,
            (Currency::Domestic, Horizon::SevenDay) => self.domestic_7d,
            (Currency::Foreign, Horizon::SevenDay) => self.foreign_7d,
        }
    }

    /// Returns the (domestic, foreign) pair for a horizon.
    pub fn pair(&self, horizon: Horizon) -> (f64, f64) {
        (
            self.get(RateKey::new(horizon, Currency::Domestic)),
            self.get(RateKey::new(horizon, Currency::Foreign)),
        )
    }
}

/// Stress thresholds. A rate at or above its threshold counts as stressed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub domestic: f64,
    pub foreign: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            domestic: 50.0,
            foreign: 1.4,
        }
    }
}

impl Thresholds {
    pub fn is_stressed(&self, domestic: f64, foreign: f64) -> bool {
        domestic >= self.domestic || foreign >= self.foreign
    }

    /// Evaluates a whole horizon of a reading.
    pub fn horizon_stressed(&self, reading: &RateReading, horizon: Horizon) -> bool {
        let (domestic, foreign) = reading.pair(horizon);
        self.is_stressed(domestic, foreign)
    }
}

/// Direction of a rate relative to its own previous sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
    /// No previous sample to compare against.
    Unknown,
}

impl Trend {
    pub fn between(current: f64, previous: Option<f64>) -> Self {
        match previous {
            None => Trend::Unknown,
            Some(prev) if current > prev => Trend::Up,
            Some(prev) if current < prev => Trend::Down,
            Some(_) => Trend::Flat,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat | Trend::Unknown => "",
        }
    }
}

/// The most recently observed sample.
///
/// Replaced wholesale on every successful parse; a skipped cycle leaves it
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleState {
    pub reading: Option<RateReading>,
    pub stressed_1d: bool,
    pub stressed_7d: bool,
}

impl SampleState {
    pub fn stressed(&self, horizon: Horizon) -> bool {
        match horizon {
            Horizon::OneDay => self.stressed_1d,
            Horizon::SevenDay => self.stressed_7d,
        }
    }

    pub fn previous(&self, key: RateKey) -> Option<f64> {
        self.reading.map(|r| r.get(key))
    }
}
