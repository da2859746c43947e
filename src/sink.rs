//! Display sinks.
//!
//! The monitor core talks to the presentation layer only through
//! [`DisplaySink`], so it carries no dependency on the terminal UI.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::alert::BoardAlerter;
use crate::data::{Board, Horizon, RateKey, RateReading, Slot};

pub use crate::data::Tone;

/// Summary of one finished monitoring cycle, reported by the worker.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// The new reading, or `None` if the cycle was skipped.
    pub reading: Option<RateReading>,
    /// Why the cycle was skipped.
    pub error: Option<String>,
    pub consecutive_failures: u32,
    /// Dead-man's switch state after this cycle.
    pub stale: bool,
    /// Delay before the next refresh.
    pub next_delay: Duration,
}

/// Capability to update labels on some display.
pub trait DisplaySink: Send {
    fn set_text(&mut self, slot: Slot, text: &str);

    fn set_tone(&mut self, slot: Slot, tone: Tone);

    /// Called by the worker after every cycle, successful or not.
    fn cycle_finished(&mut self, _report: &CycleReport) {}
}

/// A label change waiting for the end of the cycle.
#[derive(Debug, Clone)]
enum Staged {
    Text(Slot, String),
    Tone(Slot, Tone),
}

/// Sink that publishes a [`Board`] to the TUI over a watch channel.
///
/// Label changes are staged and published together with the cycle summary,
/// so the TUI wakes at most once per cycle and never sees a half-updated
/// board.
#[derive(Debug)]
pub struct BoardSink {
    sender: Arc<watch::Sender<Board>>,
    staged: Vec<Staged>,
}

impl BoardSink {
    pub fn new(sender: Arc<watch::Sender<Board>>) -> Self {
        Self {
            sender,
            staged: Vec::new(),
        }
    }

    /// Create a sink together with the receiver the TUI polls.
    pub fn create(initial: Board) -> (Self, watch::Receiver<Board>) {
        let (tx, rx) = watch::channel(initial);
        (Self::new(Arc::new(tx)), rx)
    }

    /// An alerter that records alerts on the same board.
    pub fn alerter(&self) -> BoardAlerter {
        BoardAlerter::new(Arc::clone(&self.sender))
    }
}

impl DisplaySink for BoardSink {
    fn set_text(&mut self, slot: Slot, text: &str) {
        self.staged.push(Staged::Text(slot, text.to_string()));
    }

    fn set_tone(&mut self, slot: Slot, tone: Tone) {
        self.staged.push(Staged::Tone(slot, tone));
    }

    fn cycle_finished(&mut self, report: &CycleReport) {
        let staged = std::mem::take(&mut self.staged);
        self.sender.send_modify(|board| {
            for change in staged {
                match change {
                    Staged::Text(slot, text) => board.set_text(slot, &text),
                    Staged::Tone(slot, tone) => board.set_tone(slot, tone),
                }
            }
            board.cycles += 1;
            board.consecutive_failures = report.consecutive_failures;
            board.stale = report.stale;
            board.last_error = report.error.clone();
            board.next_refresh_at = Some(Instant::now() + report.next_delay);
            if let Some(reading) = report.reading {
                board.latest = Some(reading);
                board.samples += 1;
                board.last_sample_at = Some(Instant::now());
                board.last_sample_unix_ms = Some(unix_millis());
            }
        });
    }
}

/// Sink for headless runs: logs every label change.
#[derive(Debug)]
pub struct LogSink {
    board: Board,
}

impl LogSink {
    pub fn new(initial: Board) -> Self {
        Self { board: initial }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }
}

impl DisplaySink for LogSink {
    fn set_text(&mut self, slot: Slot, text: &str) {
        if self.board.text(slot) != text {
            debug!(?slot, text, "Label changed");
            self.board.set_text(slot, text);
        }
    }

    fn set_tone(&mut self, slot: Slot, tone: Tone) {
        self.board.set_tone(slot, tone);
    }

    fn cycle_finished(&mut self, report: &CycleReport) {
        if report.reading.is_some() {
            info!(
                one_day = %self.board.text(Slot::Status(Horizon::OneDay)),
                seven_day = %self.board.text(Slot::Status(Horizon::SevenDay)),
                overall = %self.board.text(Slot::Overall),
                "{} | {} | {} | {}",
                self.board.text(Slot::Rate(RateKey::DOMESTIC_1D)),
                self.board.text(Slot::Rate(RateKey::FOREIGN_1D)),
                self.board.text(Slot::Rate(RateKey::DOMESTIC_7D)),
                self.board.text(Slot::Rate(RateKey::FOREIGN_7D)),
            );
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::CurrencyCodes;

    /// Sink that records every call, for asserting on monitor output.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub texts: Vec<(Slot, String)>,
        pub tones: Vec<(Slot, Tone)>,
        pub reports: Vec<CycleReport>,
    }

    impl RecordingSink {
        pub fn last_text(&self, slot: Slot) -> Option<&str> {
            self.texts
                .iter()
                .rev()
                .find(|(s, _)| *s == slot)
                .map(|(_, t)| t.as_str())
        }

        pub fn last_tone(&self, slot: Slot) -> Option<Tone> {
            self.tones.iter().rev().find(|(s, _)| *s == slot).map(|(_, t)| *t)
        }
    }

    impl DisplaySink for RecordingSink {
        fn set_text(&mut self, slot: Slot, text: &str) {
            self.texts.push((slot, text.to_string()));
        }

        fn set_tone(&mut self, slot: Slot, tone: Tone) {
            self.tones.push((slot, tone));
        }

        fn cycle_finished(&mut self, report: &CycleReport) {
            self.reports.push(report.clone());
        }
    }

    fn report(reading: Option<RateReading>, failures: u32) -> CycleReport {
        CycleReport {
            reading,
            error: reading.is_none().then(|| "Request timed out".to_string()),
            consecutive_failures: failures,
            stale: failures >= 5,
            next_delay: Duration::from_secs(20),
        }
    }

    #[test]
    fn test_board_sink_publishes_once_per_cycle() {
        let (mut sink, mut rx) = BoardSink::create(Board::new(&CurrencyCodes::default()));
        rx.mark_unchanged();

        sink.set_text(Slot::Overall, "Market stressed");
        sink.set_tone(Slot::Overall, Tone::Stressed);
        sink.set_text(Slot::Status(Horizon::OneDay), "Liquidity stress");
        assert!(!rx.has_changed().unwrap());
        assert_eq!(rx.borrow().text(Slot::Overall), "Waiting for data...");

        sink.cycle_finished(&report(None, 1));
        assert!(rx.has_changed().unwrap());
        {
            let board = rx.borrow_and_update();
            assert_eq!(board.text(Slot::Overall), "Market stressed");
            assert!(board.market_stressed());
            assert_eq!(board.text(Slot::Status(Horizon::OneDay)), "Liquidity stress");
            assert_eq!(board.cycles, 1);
        }

        // Nothing staged is replayed on the next cycle
        sink.cycle_finished(&report(None, 2));
        assert_eq!(rx.borrow_and_update().cycles, 2);
    }

    #[test]
    fn test_board_sink_records_cycles() {
        let (mut sink, rx) = BoardSink::create(Board::new(&CurrencyCodes::default()));
        let reading = RateReading {
            domestic_1d: 40.0,
            foreign_1d: 1.0,
            domestic_7d: 41.0,
            foreign_7d: 1.1,
        };

        sink.cycle_finished(&report(Some(reading), 0));
        sink.cycle_finished(&report(None, 1));

        let board = rx.borrow();
        assert_eq!(board.cycles, 2);
        assert_eq!(board.samples, 1);
        assert_eq!(board.latest, Some(reading));
        assert_eq!(board.consecutive_failures, 1);
        assert_eq!(board.last_error.as_deref(), Some("Request timed out"));
        assert!(board.last_sample_at.is_some());
        assert!(!board.stale);
    }

    #[test]
    fn test_log_sink_tracks_board() {
        let mut sink = LogSink::new(Board::new(&CurrencyCodes::default()));
        sink.set_text(Slot::Status(Horizon::SevenDay), "Liquidity stress");
        sink.set_tone(Slot::Status(Horizon::SevenDay), Tone::Stressed);
        assert!(sink.board().horizon_stressed(Horizon::SevenDay));
    }
}
