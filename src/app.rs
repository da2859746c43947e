//! Application state for the terminal UI.
//!
//! The [`App`] owns the TUI side of the watch channel. It never touches the
//! monitor's state directly: it copies the latest [`Board`] each tick, keeps
//! sparkline history, and turns new alerts into terminal bells.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{watch, Notify};
use tracing::{info, warn};

use crate::alert::AlertConfig;
use crate::data::{AlertCounts, Board, History, Horizon, RateKey, Slot, Thresholds};
use crate::ui::Theme;

/// How long a status message stays in the status bar.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Data from the worker
    board_rx: watch::Receiver<Board>,
    pub board: Board,
    pub history: History,
    pub thresholds: Thresholds,
    source: String,

    // Controls shared with the worker
    wake: Arc<Notify>,

    // Alerting
    pub alert_config: AlertConfig,
    pub muted: bool,
    seen_alerts: AlertCounts,
    pending_bells: u8,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        board_rx: watch::Receiver<Board>,
        wake: Arc<Notify>,
        thresholds: Thresholds,
        alert_config: AlertConfig,
        source: impl Into<String>,
        theme: Theme,
    ) -> Self {
        let board = board_rx.borrow().clone();
        Self {
            running: true,
            show_help: false,
            seen_alerts: board.alerts,
            board_rx,
            board,
            history: History::new(),
            thresholds,
            source: source.into(),
            wake,
            alert_config,
            muted: false,
            pending_bells: 0,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the page source.
    pub fn source_description(&self) -> &str {
        &self.source
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Pull the latest board from the worker.
    ///
    /// Returns true if anything changed. A closed channel means the worker
    /// is gone; the board is then marked stopped so the display cannot be
    /// mistaken for a live one.
    pub fn poll_board(&mut self) -> bool {
        match self.board_rx.has_changed() {
            Ok(false) => false,
            Ok(true) => {
                let board = self.board_rx.borrow_and_update().clone();
                self.apply_board(board);
                true
            }
            Err(_) => {
                if self.board.stopped {
                    return false;
                }
                warn!("Worker channel closed");
                let mut board = self.board_rx.borrow().clone();
                board.stopped = true;
                self.apply_board(board);
                true
            }
        }
    }

    fn apply_board(&mut self, board: Board) {
        if board.samples > self.board.samples {
            if let Some(reading) = board.latest {
                self.history.record(&reading);
            }
        }

        let mut bells: u8 = 0;
        let mut fired = Vec::new();
        for horizon in Horizon::ALL {
            let new_alerts = board
                .alerts
                .get(horizon)
                .saturating_sub(self.seen_alerts.get(horizon));
            if new_alerts > 0 {
                let times = u8::try_from(new_alerts).unwrap_or(u8::MAX);
                let per_alert = self.alert_config.bells(horizon);
                bells = bells.saturating_add(per_alert.saturating_mul(times));
                fired.push(horizon.label());
            }
        }
        if !fired.is_empty() {
            if !self.muted {
                self.pending_bells = self.pending_bells.saturating_add(bells);
            }
            self.set_status_message(format!("Liquidity stress: {}", fired.join(", ")));
            self.seen_alerts = board.alerts;
        }

        self.board = board;
    }

    /// Number of bells to ring now; resets the count.
    pub fn take_bells(&mut self) -> u8 {
        std::mem::take(&mut self.pending_bells)
    }

    /// Ask the worker to refresh without waiting out its current delay.
    pub fn request_refresh(&mut self) {
        if self.board.stopped {
            self.set_status_message("Worker stopped, cannot refresh".to_string());
            return;
        }
        self.wake.notify_one();
        self.set_status_message("Refresh requested".to_string());
    }

    /// Toggle the audible alert.
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        if self.muted {
            self.pending_bells = 0;
        }
        info!(muted = self.muted, "Alert mute toggled");
        self.set_status_message(if self.muted {
            "Alerts muted".to_string()
        } else {
            "Alerts unmuted".to_string()
        });
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        use std::io::Write;

        let Some(reading) = self.board.latest else {
            anyhow::bail!("No data to export");
        };

        let mut export = serde_json::Map::new();
        export.insert("source".to_string(), serde_json::json!(self.source));
        export.insert(
            "sampled_at_unix_ms".to_string(),
            serde_json::json!(self.board.last_sample_unix_ms),
        );
        export.insert("reading".to_string(), serde_json::to_value(reading)?);
        export.insert(
            "thresholds".to_string(),
            serde_json::to_value(self.thresholds)?,
        );

        // Horizons
        let horizons: Vec<serde_json::Value> = Horizon::ALL
            .iter()
            .map(|&h| {
                serde_json::json!({
                    "horizon": h.label(),
                    "stressed": self.board.horizon_stressed(h),
                    "status": self.board.text(Slot::Status(h)),
                })
            })
            .collect();
        export.insert("horizons".to_string(), serde_json::Value::Array(horizons));

        // Labels as shown
        let mut labels = serde_json::Map::new();
        for key in RateKey::ALL {
            labels.insert(
                key.id().to_string(),
                serde_json::json!(self.board.text(Slot::Rate(key))),
            );
        }
        export.insert("labels".to_string(), serde_json::Value::Object(labels));

        // History
        let mut history = serde_json::Map::new();
        for key in RateKey::ALL {
            let values: Vec<f64> = self
                .history
                .rates
                .get(&key)
                .map(|v| v.iter().copied().collect())
                .unwrap_or_default();
            history.insert(key.id().to_string(), serde_json::json!(values));
        }
        export.insert("history".to_string(), serde_json::Value::Object(history));

        export.insert(
            "overall".to_string(),
            serde_json::json!({
                "text": self.board.text(Slot::Overall),
                "stressed": self.board.market_stressed(),
                "stale": self.board.stale,
            }),
        );
        export.insert(
            "monitor".to_string(),
            serde_json::json!({
                "samples": self.board.samples,
                "cycles": self.board.cycles,
                "consecutive_failures": self.board.consecutive_failures,
                "last_error": self.board.last_error,
                "alerts_1d": self.board.alerts.one_day,
                "alerts_7d": self.board.alerts.seven_day,
            }),
        );

        let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}
