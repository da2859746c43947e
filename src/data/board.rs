//! Display model shared between the worker and the TUI.
//!
//! The worker mutates a [`Board`] through a [`DisplaySink`](crate::sink::DisplaySink)
//! and publishes it over a watch channel; the TUI only ever reads it.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Deserialize;

use super::rates::{Currency, Horizon, RateKey, RateReading};

/// A labelled place on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// One of the four rate labels.
    Rate(RateKey),
    /// Per-horizon status line.
    Status(Horizon),
    /// Aggregate market status.
    Overall,
}

/// Semantic colour of a cell; the theme maps it to a terminal colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Domestic,
    Foreign,
    Ok,
    Stressed,
    Muted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

/// Alerts raised per horizon since start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertCounts {
    pub one_day: u64,
    pub seven_day: u64,
}

impl AlertCounts {
    pub fn get(&self, horizon: Horizon) -> u64 {
        match horizon {
            Horizon::OneDay => self.one_day,
            Horizon::SevenDay => self.seven_day,
        }
    }

    pub fn record(&mut self, horizon: Horizon) {
        match horizon {
            Horizon::OneDay => self.one_day += 1,
            Horizon::SevenDay => self.seven_day += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.one_day + self.seven_day
    }
}

/// Currency codes shown in rate labels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CurrencyCodes {
    pub domestic: String,
    pub foreign: String,
}

impl Default for CurrencyCodes {
    fn default() -> Self {
        Self {
            domestic: "ARS".to_string(),
            foreign: "USD".to_string(),
        }
    }
}

impl CurrencyCodes {
    pub fn code(&self, currency: Currency) -> &str {
        match currency {
            Currency::Domestic => &self.domestic,
            Currency::Foreign => &self.foreign,
        }
    }
}

/// Everything the presentation layer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Board {
    pub cells: BTreeMap<Slot, Cell>,
    pub latest: Option<RateReading>,
    /// Number of successful samples so far.
    pub samples: u64,
    /// Number of completed cycles, successful or not.
    pub cycles: u64,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    /// Set by the dead-man's switch after too many consecutive failures.
    pub stale: bool,
    /// Set when the worker is known to have ended.
    pub stopped: bool,
    pub alerts: AlertCounts,
    pub last_sample_at: Option<Instant>,
    pub last_sample_unix_ms: Option<u64>,
    pub next_refresh_at: Option<Instant>,
}

impl Board {
    /// Create the initial board shown before the first sample.
    pub fn new(codes: &CurrencyCodes) -> Self {
        let mut cells = BTreeMap::new();
        for key in RateKey::ALL {
            let tone = match key.currency {
                Currency::Domestic => Tone::Domestic,
                Currency::Foreign => Tone::Foreign,
            };
            cells.insert(
                Slot::Rate(key),
                Cell::new(format!("{}: --", codes.code(key.currency)), tone),
            );
        }
        for horizon in Horizon::ALL {
            cells.insert(Slot::Status(horizon), Cell::new("OK", Tone::Ok));
        }
        cells.insert(Slot::Overall, Cell::new("Waiting for data...", Tone::Muted));

        Self {
            cells,
            latest: None,
            samples: 0,
            cycles: 0,
            consecutive_failures: 0,
            last_error: None,
            stale: false,
            stopped: false,
            alerts: AlertCounts::default(),
            last_sample_at: None,
            last_sample_unix_ms: None,
            next_refresh_at: None,
        }
    }

    pub fn text(&self, slot: Slot) -> &str {
        self.cells.get(&slot).map(|c| c.text.as_str()).unwrap_or("")
    }

    pub fn tone(&self, slot: Slot) -> Tone {
        self.cells.get(&slot).map(|c| c.tone).unwrap_or(Tone::Neutral)
    }

    pub fn set_text(&mut self, slot: Slot, text: &str) {
        self.cells
            .entry(slot)
            .and_modify(|c| text.clone_into(&mut c.text))
            .or_insert_with(|| Cell::new(text, Tone::Neutral));
    }

    pub fn set_tone(&mut self, slot: Slot, tone: Tone) {
        self.cells
            .entry(slot)
            .and_modify(|c| c.tone = tone)
            .or_insert_with(|| Cell::new("", tone));
    }

    /// True when a horizon's status line currently shows stress.
    pub fn horizon_stressed(&self, horizon: Horizon) -> bool {
        self.tone(Slot::Status(horizon)) == Tone::Stressed
    }

    pub fn market_stressed(&self) -> bool {
        self.tone(Slot::Overall) == Tone::Stressed
    }

    /// Time since the last successful sample.
    pub fn sample_age(&self) -> Option<Duration> {
        self.last_sample_at.map(|t| t.elapsed())
    }

    /// Time left until the worker's next refresh, if one is scheduled.
    pub fn next_refresh_in(&self) -> Option<Duration> {
        self.next_refresh_at
            .map(|t| t.saturating_duration_since(Instant::now()))
    }
}
