//! # rate-alarm
//!
//! A terminal alarm for liquidity stress in repo ("caución") rates.
//!
//! The alarm periodically refreshes a public quotes page, extracts the
//! domestic- and foreign-currency rates for the 1-day and 7-day terms,
//! compares them against stress thresholds and raises an audible alert when
//! a horizon enters stress.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────── worker task (tokio) ────────────────────────┐
//! │  PageFetcher ──text──▶ RateMonitor ──labels──▶ DisplaySink           │
//! │  (http | file)         (PageParser,            (BoardSink | LogSink) │
//! │                         SampleState)  ──edge──▶ Alerter              │
//! └────────────────────────────────────────────────┬────────────────────┘
//!                                                  │ watch<Board>
//! ┌──────────────────────── main thread ───────────▼────────────────────┐
//! │  App (history, bells, mute) ──▶ ui (ratatui) ──▶ Terminal           │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`monitor`]**: The per-cycle state machine: labels, stress flags,
//!   rising-edge alerts
//! - **[`parse`]**: [`PageParser`] strategies; the default picks
//!   percentages by position
//! - **[`source`]**: [`PageFetcher`] implementations for HTTP and local files
//! - **[`worker`]**: The fetch/settle/parse loop with backoff and a
//!   dead-man's switch
//! - **[`sink`]** and **[`alert`]**: Where labels and alerts go
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The terminal front end
//! - **[`config`]**: Layered settings (defaults, TOML file, environment)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch the default quotes page
//! rate-alarm
//!
//! # Replay a saved page without a terminal UI
//! rate-alarm --file cauciones.html --headless
//!
//! # One sample as JSON
//! rate-alarm --once
//! ```
//!
//! ### As a library
//!
//! ```
//! use rate_alarm::{CurrencyCodes, LogSink, PositionalParser, RateMonitor, Thresholds};
//! use rate_alarm::alert::BellAlerter;
//! use rate_alarm::data::Board;
//!
//! let mut monitor = RateMonitor::new(
//!     Box::new(PositionalParser::default()),
//!     Thresholds::default(),
//!     CurrencyCodes::default(),
//! );
//! let mut sink = LogSink::new(Board::new(&CurrencyCodes::default()));
//! let mut alerter = BellAlerter::new(Vec::new(), Default::default());
//!
//! let page = "51,20 % 0,50 % 1,00 % 2,00 % 3,00 % 4,00 % 5,00 % 1,00 % 40,00 % 6,00 %";
//! let outcome = monitor.process(page, &mut sink, &mut alerter);
//! assert!(outcome.is_updated());
//! assert!(monitor.state().stressed_1d);
//! ```

pub mod alert;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod monitor;
pub mod parse;
pub mod sink;
pub mod source;
pub mod ui;
pub mod worker;

// Re-export main types for convenience
pub use alert::{AlertConfig, Alerter, BellAlerter, BoardAlerter};
pub use app::App;
pub use config::Settings;
pub use data::{
    Board, CurrencyCodes, Horizon, RateKey, RateReading, SampleState, Slot, Thresholds, Tone,
};
pub use error::{CycleError, FetchError, ParseError};
pub use monitor::{CycleOutcome, RateMonitor};
pub use parse::{PageParser, PositionalParser, Positions};
pub use sink::{BoardSink, CycleReport, DisplaySink, LogSink};
pub use source::{FileFetcher, HttpFetcher, PageFetcher};
pub use worker::{Backoff, Cadence, Worker};
