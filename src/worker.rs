//! Background fetch/parse loop.
//!
//! Each cycle refreshes the page, waits for it to settle, feeds it to the
//! [`RateMonitor`] and reports the outcome to the display. Failed cycles
//! back off exponentially, and after enough of them in a row the display
//! is marked stale so a silent monitor cannot be mistaken for a calm market.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{info, warn};

use crate::alert::Alerter;
use crate::data::{RateReading, Slot, Tone};
use crate::error::CycleError;
use crate::monitor::{CycleOutcome, RateMonitor};
use crate::sink::{CycleReport, DisplaySink};
use crate::source::PageFetcher;

/// Text shown in the overall slot once the dead-man's switch trips.
pub const STALE_TEXT: &str = "No data: monitor stale";

/// Fixed waits around each refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// One-off wait before the first refresh.
    pub startup: Duration,
    /// Wait before each refresh.
    pub before_refresh: Duration,
    /// Wait after a refresh before the page is parsed.
    pub settle: Duration,
    /// Wait after a successful cycle.
    pub cycle: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            startup: Duration::from_secs(10),
            before_refresh: Duration::ZERO,
            settle: Duration::from_secs(6),
            cycle: Duration::from_secs(20),
        }
    }
}

/// Retry policy for failed cycles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Factor by which the delay grows after each consecutive failure.
    pub multiplier: f64,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Consecutive failures after which the display is marked stale.
    pub stale_after: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            multiplier: 2.0,
            max_delay: Duration::from_secs(300),
            stale_after: 5,
        }
    }
}

impl Backoff {
    /// Delay before the next cycle after `failures` consecutive failures.
    ///
    /// Zero failures (or one) waits the base cycle delay; each further
    /// failure multiplies it, clamped to `max_delay`.
    pub fn delay(&self, base: Duration, failures: u32) -> Duration {
        if failures <= 1 {
            return base;
        }
        let exponent = (failures - 1).min(32) as i32;
        let ms = base.as_millis() as f64 * self.multiplier.powi(exponent);
        let cap = self.max_delay.max(base);
        if ms >= cap.as_millis() as f64 {
            cap
        } else {
            Duration::from_millis(ms as u64)
        }
    }

    pub fn is_stale(&self, failures: u32) -> bool {
        failures >= self.stale_after
    }
}

/// Owns the monitor and drives it from a page source.
pub struct Worker {
    fetcher: Box<dyn PageFetcher>,
    monitor: RateMonitor,
    sink: Box<dyn DisplaySink>,
    alerter: Box<dyn Alerter>,
    cadence: Cadence,
    backoff: Backoff,
    wake: Arc<Notify>,
    failures: u32,
}

impl Worker {
    pub fn new(
        fetcher: Box<dyn PageFetcher>,
        monitor: RateMonitor,
        sink: Box<dyn DisplaySink>,
        alerter: Box<dyn Alerter>,
        cadence: Cadence,
        backoff: Backoff,
    ) -> Self {
        Self {
            fetcher,
            monitor,
            sink,
            alerter,
            cadence,
            backoff,
            wake: Arc::new(Notify::new()),
            failures: 0,
        }
    }

    /// Handle that cuts the current wait short, forcing an early refresh.
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    pub fn monitor(&self) -> &RateMonitor {
        &self.monitor
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Run forever. The task ends only when its runtime aborts it.
    pub async fn run(mut self) {
        info!(
            source = self.fetcher.description(),
            parser = self.monitor.parser_name(),
            "Worker starting"
        );
        pause(&self.wake, self.cadence.startup).await;

        loop {
            let delay = self.run_cycle().await;
            pause(&self.wake, delay).await;
        }
    }

    /// Run a single fetch/settle/parse cycle and return the delay before
    /// the next one.
    pub async fn run_cycle(&mut self) -> Duration {
        pause(&self.wake, self.cadence.before_refresh).await;

        let result = match self.fetcher.refresh().await {
            Ok(text) => {
                tokio::time::sleep(self.cadence.settle).await;
                match self
                    .monitor
                    .process(&text, self.sink.as_mut(), self.alerter.as_mut())
                {
                    CycleOutcome::Updated { reading, .. } => Ok(reading),
                    CycleOutcome::Skipped(e) => Err(CycleError::from(e)),
                }
            }
            Err(e) => Err(CycleError::from(e)),
        };

        self.finish_cycle(result)
    }

    fn finish_cycle(&mut self, result: Result<RateReading, CycleError>) -> Duration {
        let (reading, error) = match result {
            Ok(reading) => {
                if self.backoff.is_stale(self.failures) {
                    info!(failures = self.failures, "Monitor recovered");
                }
                self.failures = 0;
                (Some(reading), None)
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                warn!(
                    source = self.fetcher.description(),
                    failures = self.failures,
                    error = %e,
                    "Cycle skipped"
                );
                (None, Some(e.to_string()))
            }
        };

        let stale = self.backoff.is_stale(self.failures);
        if stale {
            if self.failures == self.backoff.stale_after {
                warn!(failures = self.failures, "No usable data, marking monitor stale");
            }
            self.sink.set_text(Slot::Overall, STALE_TEXT);
            self.sink.set_tone(Slot::Overall, Tone::Muted);
        }

        let next_delay = self.backoff.delay(self.cadence.cycle, self.failures);
        self.sink.cycle_finished(&CycleReport {
            reading,
            error,
            consecutive_failures: self.failures,
            stale,
            next_delay,
        });
        next_delay
    }
}

/// Sleep for `delay`, or until woken.
async fn pause(wake: &Notify, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = wake.notified() => {}
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("fetcher", &self.fetcher)
            .field("monitor", &self.monitor)
            .field("cadence", &self.cadence)
            .field("backoff", &self.backoff)
            .field("failures", &self.failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use tokio::sync::watch;

    use super::*;
    use crate::data::{Board, CurrencyCodes, Horizon, Thresholds};
    use crate::error::FetchError;
    use crate::parse::tests::page_with;
    use crate::parse::PositionalParser;
    use crate::sink::BoardSink;

    /// Fetcher that replays a scripted sequence of pages and failures.
    #[derive(Debug, Default)]
    struct ScriptedFetcher {
        pages: VecDeque<Result<String, FetchError>>,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<Result<String, FetchError>>) -> Self {
            Self {
                pages: pages.into(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn refresh(&mut self) -> Result<String, FetchError> {
            self.pages.pop_front().unwrap_or(Err(FetchError::Timeout))
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    fn page(dom_1d: f64) -> Result<String, FetchError> {
        Ok(page_with(&[dom_1d, 0.5, 2.0, 3.0, 4.0, 5.0, 6.0, 0.7, 30.0, 9.0]))
    }

    fn worker(pages: Vec<Result<String, FetchError>>) -> (Worker, watch::Receiver<Board>) {
        let (sink, rx) = BoardSink::create(Board::new(&CurrencyCodes::default()));
        let alerter = sink.alerter();
        let monitor = RateMonitor::new(
            Box::new(PositionalParser::default()),
            Thresholds::default(),
            CurrencyCodes::default(),
        );
        let worker = Worker::new(
            Box::new(ScriptedFetcher::new(pages)),
            monitor,
            Box::new(sink),
            Box::new(alerter),
            Cadence::default(),
            Backoff::default(),
        );
        (worker, rx)
    }

    #[test]
    fn test_backoff_sequence() {
        let backoff = Backoff::default();
        let base = Duration::from_secs(20);
        let delays: Vec<u64> = (0..8).map(|n| backoff.delay(base, n).as_secs()).collect();
        assert_eq!(delays, vec![20, 20, 40, 80, 160, 300, 300, 300]);
    }

    #[test]
    fn test_backoff_never_below_base() {
        let backoff = Backoff {
            max_delay: Duration::from_secs(5),
            ..Default::default()
        };
        assert_eq!(backoff.delay(Duration::from_secs(20), 4), Duration::from_secs(20));
    }

    #[test]
    fn test_backoff_custom_multiplier() {
        let backoff = Backoff {
            multiplier: 3.0,
            ..Default::default()
        };
        assert_eq!(backoff.delay(Duration::from_secs(2), 3), Duration::from_secs(18));
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_cycle_updates_board() {
        let (mut worker, rx) = worker(vec![page(40.0)]);

        let start = tokio::time::Instant::now();
        let delay = worker.run_cycle().await;

        assert_eq!(delay, Duration::from_secs(20));
        assert!(start.elapsed() >= Duration::from_secs(6));
        let board = rx.borrow();
        assert_eq!(board.samples, 1);
        assert_eq!(board.text(Slot::Overall), "Market normal");
        assert_eq!(board.latest.map(|r| r.domestic_1d), Some(40.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_back_off_and_trip_stale() {
        let (mut worker, rx) = worker(vec![page(40.0)]);
        worker.run_cycle().await;

        let mut delays = Vec::new();
        for _ in 0..5 {
            delays.push(worker.run_cycle().await.as_secs());
        }

        assert_eq!(delays, vec![20, 40, 80, 160, 300]);
        assert_eq!(worker.consecutive_failures(), 5);
        let board = rx.borrow();
        assert!(board.stale);
        assert_eq!(board.text(Slot::Overall), STALE_TEXT);
        assert_eq!(board.tone(Slot::Overall), Tone::Muted);
        assert_eq!(board.last_error.as_deref(), Some("Request timed out"));
        // State from the last good sample is retained
        assert_eq!(
            worker.monitor().state().reading.map(|r| r.domestic_1d),
            Some(40.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_page_counts_as_failure() {
        let (mut worker, rx) = worker(vec![Ok(page_with(&[1.0, 2.0]))]);
        let delay = worker.run_cycle().await;
        assert_eq!(delay, Duration::from_secs(20));
        assert_eq!(worker.consecutive_failures(), 1);
        assert!(worker.monitor().state().reading.is_none());
        let board = rx.borrow();
        assert_eq!(board.text(Slot::Overall), "Waiting for data...");
        assert_eq!(
            board.last_error.as_deref(),
            Some("Found 2 rates, need at least 10")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_clears_stale() {
        let mut pages: Vec<Result<String, FetchError>> =
            (0..5).map(|_| Err(FetchError::Status(503))).collect();
        pages.push(page(55.0));
        let (mut worker, rx) = worker(pages);

        for _ in 0..5 {
            worker.run_cycle().await;
        }
        assert!(rx.borrow().stale);

        let delay = worker.run_cycle().await;
        assert_eq!(delay, Duration::from_secs(20));
        let board = rx.borrow();
        assert!(!board.stale);
        assert_eq!(board.consecutive_failures, 0);
        assert_eq!(board.text(Slot::Overall), "Market stressed");
        assert_eq!(board.alerts.get(Horizon::OneDay), 1);
        assert_eq!(board.alerts.total(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_cuts_pause_short() {
        let (worker, _rx) = worker(vec![]);
        let wake = worker.wake_handle();
        wake.notify_one();

        let start = tokio::time::Instant::now();
        pause(&wake, Duration::from_secs(3600)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
