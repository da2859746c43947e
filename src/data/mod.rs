//! Data models for rate monitoring.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing and formatting of cadence strings (e.g., "20s", "5m")
//! - [`rates`]: Rate keys, readings, thresholds and the worker's [`SampleState`]
//! - [`board`]: The [`Board`] display model published to the TUI
//! - [`history`]: Recent readings for sparklines
//!
//! ## Data Flow
//!
//! ```text
//! page text
//!    │  PageParser
//!    ▼
//! RateReading ──▶ RateMonitor (SampleState, Thresholds)
//!                      │ DisplaySink
//!                      ▼
//!                    Board ──watch──▶ App ──▶ History::record()
//! ```

pub mod board;
pub mod duration;
pub mod history;
pub mod rates;

pub use board::{AlertCounts, Board, Cell, CurrencyCodes, Slot, Tone};
pub use history::History;
pub use rates::{Currency, Horizon, RateKey, RateReading, SampleState, Thresholds, Trend};
