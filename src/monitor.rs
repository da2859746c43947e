//! The rate monitor core.
//!
//! [`RateMonitor`] owns the previous [`SampleState`]. For each page it
//! parses the rates, evaluates both horizons against the thresholds,
//! pushes label updates to a [`DisplaySink`] and fires an [`Alerter`] on
//! rising edges only.

use tracing::{debug, info};

use crate::alert::Alerter;
use crate::data::{
    Currency, CurrencyCodes, Horizon, RateKey, RateReading, SampleState, Slot, Thresholds, Tone,
    Trend,
};
use crate::error::ParseError;
use crate::parse::PageParser;
use crate::sink::DisplaySink;

const STRESS_TEXT: &str = "Liquidity stress";
const OK_TEXT: &str = "OK";
const MARKET_STRESSED_TEXT: &str = "Market stressed";
const MARKET_NORMAL_TEXT: &str = "Market normal";

/// Result of feeding one page to the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The state was replaced with a new sample.
    Updated {
        reading: RateReading,
        stressed_1d: bool,
        stressed_7d: bool,
        /// Horizons whose alert fired this cycle.
        alerts: Vec<Horizon>,
    },
    /// The page was unusable; state and display are unchanged.
    Skipped(ParseError),
}

impl CycleOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, CycleOutcome::Updated { .. })
    }
}

/// Format a rate label, e.g. `ARS: 51.20 ↑`.
pub fn rate_label(code: &str, value: f64, trend: Trend) -> String {
    match trend.arrow() {
        "" => format!("{code}: {value:.2}"),
        arrow => format!("{code}: {value:.2} {arrow}"),
    }
}

pub struct RateMonitor {
    parser: Box<dyn PageParser>,
    thresholds: Thresholds,
    codes: CurrencyCodes,
    state: SampleState,
}

impl RateMonitor {
    pub fn new(parser: Box<dyn PageParser>, thresholds: Thresholds, codes: CurrencyCodes) -> Self {
        Self {
            parser,
            thresholds,
            codes,
            state: SampleState::default(),
        }
    }

    pub fn state(&self) -> &SampleState {
        &self.state
    }

    pub fn parser_name(&self) -> &str {
        self.parser.name()
    }

    /// Parse a page and, if it yields a reading, apply it.
    pub fn process(
        &mut self,
        text: &str,
        sink: &mut dyn DisplaySink,
        alerter: &mut dyn Alerter,
    ) -> CycleOutcome {
        match self.parser.parse(text) {
            Ok(reading) => self.apply(reading, sink, alerter),
            Err(e) => {
                debug!(parser = self.parser.name(), error = %e, "Page skipped");
                CycleOutcome::Skipped(e)
            }
        }
    }

    /// Evaluate a reading, update the display and replace the state.
    pub fn apply(
        &mut self,
        reading: RateReading,
        sink: &mut dyn DisplaySink,
        alerter: &mut dyn Alerter,
    ) -> CycleOutcome {
        for key in RateKey::ALL {
            let value = reading.get(key);
            let trend = Trend::between(value, self.state.previous(key));
            let tone = match key.currency {
                Currency::Domestic => Tone::Domestic,
                Currency::Foreign => Tone::Foreign,
            };
            sink.set_text(
                Slot::Rate(key),
                &rate_label(self.codes.code(key.currency), value, trend),
            );
            sink.set_tone(Slot::Rate(key), tone);
        }

        let stressed_1d = self.thresholds.horizon_stressed(&reading, Horizon::OneDay);
        let stressed_7d = self.thresholds.horizon_stressed(&reading, Horizon::SevenDay);

        let mut alerts = Vec::new();
        for (horizon, stressed) in [(Horizon::OneDay, stressed_1d), (Horizon::SevenDay, stressed_7d)] {
            let slot = Slot::Status(horizon);
            if stressed {
                sink.set_text(slot, STRESS_TEXT);
                sink.set_tone(slot, Tone::Stressed);
                if !self.state.stressed(horizon) {
                    alerter.alert(horizon);
                    alerts.push(horizon);
                }
            } else {
                sink.set_text(slot, OK_TEXT);
                sink.set_tone(slot, Tone::Ok);
            }
        }

        if stressed_1d || stressed_7d {
            sink.set_text(Slot::Overall, MARKET_STRESSED_TEXT);
            sink.set_tone(Slot::Overall, Tone::Stressed);
        } else {
            sink.set_text(Slot::Overall, MARKET_NORMAL_TEXT);
            sink.set_tone(Slot::Overall, Tone::Ok);
        }

        info!(
            domestic_1d = reading.domestic_1d,
            foreign_1d = reading.foreign_1d,
            domestic_7d = reading.domestic_7d,
            foreign_7d = reading.foreign_7d,
            stressed_1d,
            stressed_7d,
            "Sample"
        );

        self.state = SampleState {
            reading: Some(reading),
            stressed_1d,
            stressed_7d,
        };

        CycleOutcome::Updated {
            reading,
            stressed_1d,
            stressed_7d,
            alerts,
        }
    }
}

impl std::fmt::Debug for RateMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateMonitor")
            .field("parser", &self.parser.name())
            .field("thresholds", &self.thresholds)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::tests::RecordingAlerter;
    use crate::parse::tests::page_with;
    use crate::parse::PositionalParser;
    use crate::sink::tests::RecordingSink;

    fn monitor() -> RateMonitor {
        RateMonitor::new(
            Box::new(PositionalParser::default()),
            Thresholds {
                domestic: 50.0,
                foreign: 1.4,
            },
            CurrencyCodes::default(),
        )
    }

    /// Page whose four monitored rates are (dom 1d, for 1d, dom 7d, for 7d).
    fn page(dom_1d: f64, for_1d: f64, dom_7d: f64, for_7d: f64) -> String {
        page_with(&[dom_1d, for_1d, 2.0, 3.0, 4.0, 5.0, 6.0, for_7d, dom_7d, 9.0, 10.0])
    }

    #[test]
    fn test_reading_comes_from_fixed_positions() {
        let mut m = monitor();
        let outcome = m.process(
            &page(40.0, 1.1, 42.5, 1.2),
            &mut RecordingSink::default(),
            &mut RecordingAlerter::default(),
        );
        let CycleOutcome::Updated { reading, .. } = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(reading.domestic_1d, 40.0);
        assert_eq!(reading.foreign_1d, 1.1);
        assert_eq!(reading.domestic_7d, 42.5);
        assert_eq!(reading.foreign_7d, 1.2);
        assert_eq!(m.state().reading, Some(reading));
    }

    #[test]
    fn test_short_page_leaves_state_unchanged() {
        let mut m = monitor();
        let mut sink = RecordingSink::default();
        let mut alerter = RecordingAlerter::default();
        m.process(&page(51.0, 1.1, 42.5, 1.2), &mut sink, &mut alerter);
        let before = *m.state();
        let calls_before = sink.texts.len();

        let outcome = m.process(&page_with(&[99.0; 9]), &mut sink, &mut alerter);

        assert_eq!(
            outcome,
            CycleOutcome::Skipped(ParseError::TooFewTokens {
                found: 9,
                required: 10
            })
        );
        assert_eq!(*m.state(), before);
        assert_eq!(sink.texts.len(), calls_before);
        assert_eq!(alerter.fired.len(), 1);
    }

    #[test]
    fn test_domestic_over_threshold_stresses_horizon() {
        let mut m = monitor();
        let mut sink = RecordingSink::default();
        let outcome = m.process(
            &page(51.2, 0.1, 10.0, 0.1),
            &mut sink,
            &mut RecordingAlerter::default(),
        );
        assert!(matches!(
            outcome,
            CycleOutcome::Updated {
                stressed_1d: true,
                stressed_7d: false,
                ..
            }
        ));
        assert_eq!(sink.last_text(Slot::Status(Horizon::OneDay)), Some(STRESS_TEXT));
        assert_eq!(sink.last_tone(Slot::Status(Horizon::OneDay)), Some(Tone::Stressed));
        assert_eq!(sink.last_text(Slot::Status(Horizon::SevenDay)), Some(OK_TEXT));
        assert_eq!(sink.last_text(Slot::Overall), Some(MARKET_STRESSED_TEXT));
    }

    #[test]
    fn test_foreign_over_threshold_stresses_seven_day() {
        let mut m = monitor();
        m.process(
            &page(10.0, 0.1, 10.0, 1.5),
            &mut RecordingSink::default(),
            &mut RecordingAlerter::default(),
        );
        assert!(!m.state().stressed_1d);
        assert!(m.state().stressed_7d);
    }

    #[test]
    fn test_threshold_equality_is_stressed() {
        let mut m = monitor();
        m.process(
            &page(50.0, 0.1, 10.0, 1.4),
            &mut RecordingSink::default(),
            &mut RecordingAlerter::default(),
        );
        assert!(m.state().stressed_1d);
        assert!(m.state().stressed_7d);
    }

    #[test]
    fn test_alert_fires_only_on_rising_edge() {
        let mut m = monitor();
        let mut sink = RecordingSink::default();
        let mut alerter = RecordingAlerter::default();

        // normal -> stressed: one alert
        m.process(&page(40.0, 0.1, 10.0, 0.1), &mut sink, &mut alerter);
        m.process(&page(55.0, 0.1, 10.0, 0.1), &mut sink, &mut alerter);
        assert_eq!(alerter.count(Horizon::OneDay), 1);

        // sustained stress: no new alert
        m.process(&page(57.0, 0.1, 10.0, 0.1), &mut sink, &mut alerter);
        assert_eq!(alerter.count(Horizon::OneDay), 1);

        // recovery: no alert
        m.process(&page(45.0, 0.1, 10.0, 0.1), &mut sink, &mut alerter);
        assert_eq!(alerter.count(Horizon::OneDay), 1);
        assert_eq!(sink.last_text(Slot::Overall), Some(MARKET_NORMAL_TEXT));

        // stressed again: alert again
        m.process(&page(60.0, 0.1, 10.0, 0.1), &mut sink, &mut alerter);
        assert_eq!(alerter.count(Horizon::OneDay), 2);
        assert_eq!(alerter.count(Horizon::SevenDay), 0);
    }

    #[test]
    fn test_first_sample_already_stressed_alerts() {
        let mut m = monitor();
        let mut alerter = RecordingAlerter::default();
        let outcome = m.process(
            &page(60.0, 2.0, 60.0, 2.0),
            &mut RecordingSink::default(),
            &mut alerter,
        );
        let CycleOutcome::Updated { alerts, .. } = outcome else {
            panic!("expected update");
        };
        assert_eq!(alerts, vec![Horizon::OneDay, Horizon::SevenDay]);
        assert_eq!(alerter.fired.len(), 2);
    }

    #[test]
    fn test_skipped_cycle_does_not_reset_edge() {
        let mut m = monitor();
        let mut sink = RecordingSink::default();
        let mut alerter = RecordingAlerter::default();
        m.process(&page(60.0, 0.1, 10.0, 0.1), &mut sink, &mut alerter);
        m.process("<html>maintenance</html>", &mut sink, &mut alerter);
        m.process(&page(61.0, 0.1, 10.0, 0.1), &mut sink, &mut alerter);
        assert_eq!(alerter.count(Horizon::OneDay), 1);
    }

    #[test]
    fn test_identical_pages_are_idempotent() {
        let mut m = monitor();
        let mut sink = RecordingSink::default();
        let mut alerter = RecordingAlerter::default();
        let text = page(52.0, 1.5, 48.0, 1.0);

        m.process(&text, &mut sink, &mut alerter);
        let first = *m.state();
        let alerts_first = alerter.fired.len();

        let outcome = m.process(&text, &mut sink, &mut alerter);
        assert_eq!(*m.state(), first);
        assert_eq!(alerter.fired.len(), alerts_first);
        assert!(matches!(outcome, CycleOutcome::Updated { ref alerts, .. } if alerts.is_empty()));
    }

    #[test]
    fn test_each_label_trends_against_its_own_previous_value() {
        let mut m = monitor();
        let mut sink = RecordingSink::default();
        let mut alerter = RecordingAlerter::default();

        m.process(&page(40.0, 1.0, 42.0, 1.2), &mut sink, &mut alerter);
        assert_eq!(sink.last_text(Slot::Rate(RateKey::DOMESTIC_1D)), Some("ARS: 40.00"));

        // 1d domestic rises while the others fall or stay put
        m.process(&page(41.0, 0.9, 42.0, 1.1), &mut sink, &mut alerter);
        assert_eq!(sink.last_text(Slot::Rate(RateKey::DOMESTIC_1D)), Some("ARS: 41.00 ↑"));
        assert_eq!(sink.last_text(Slot::Rate(RateKey::FOREIGN_1D)), Some("USD: 0.90 ↓"));
        assert_eq!(sink.last_text(Slot::Rate(RateKey::DOMESTIC_7D)), Some("ARS: 42.00"));
        assert_eq!(sink.last_text(Slot::Rate(RateKey::FOREIGN_7D)), Some("USD: 1.10 ↓"));
        assert_eq!(sink.last_tone(Slot::Rate(RateKey::FOREIGN_7D)), Some(Tone::Foreign));
    }

    #[test]
    fn test_rate_label_format() {
        assert_eq!(rate_label("ARS", 51.2, Trend::Unknown), "ARS: 51.20");
        assert_eq!(rate_label("USD", 1.456, Trend::Up), "USD: 1.46 ↑");
    }
}
