//! Audible alerts on rising-edge stress transitions.

use std::io::{self, Write};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::data::{Board, Horizon};

/// Receives one call per rising edge of a horizon's stress flag.
pub trait Alerter: Send {
    fn alert(&mut self, horizon: Horizon);
}

/// How loud each horizon's alert is, in terminal bells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub one_day_bells: u8,
    pub seven_day_bells: u8,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            one_day_bells: 1,
            seven_day_bells: 1,
        }
    }
}

impl AlertConfig {
    pub fn bells(&self, horizon: Horizon) -> u8 {
        match horizon {
            Horizon::OneDay => self.one_day_bells,
            Horizon::SevenDay => self.seven_day_bells,
        }
    }
}

/// Write `times` BEL characters and flush.
pub fn ring_bell<W: Write>(out: &mut W, times: u8) -> io::Result<()> {
    for _ in 0..times {
        out.write_all(b"\x07")?;
    }
    out.flush()
}

/// Records alerts on the shared [`Board`]; the TUI thread rings the bell
/// when it sees a horizon's counter rise.
#[derive(Debug)]
pub struct BoardAlerter {
    sender: Arc<watch::Sender<Board>>,
}

impl BoardAlerter {
    pub fn new(sender: Arc<watch::Sender<Board>>) -> Self {
        Self { sender }
    }
}

impl Alerter for BoardAlerter {
    fn alert(&mut self, horizon: Horizon) {
        warn!(horizon = horizon.label(), "Liquidity stress alert");
        self.sender.send_modify(|board| board.alerts.record(horizon));
    }
}

/// Rings the bell directly on a writer; used when there is no TUI.
#[derive(Debug)]
pub struct BellAlerter<W: Write + Send> {
    out: W,
    config: AlertConfig,
}

impl<W: Write + Send> BellAlerter<W> {
    pub fn new(out: W, config: AlertConfig) -> Self {
        Self { out, config }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Alerter for BellAlerter<W> {
    fn alert(&mut self, horizon: Horizon) {
        warn!(horizon = horizon.label(), "Liquidity stress alert");
        if let Err(e) = ring_bell(&mut self.out, self.config.bells(horizon)) {
            debug!(error = %e, "Could not ring terminal bell");
        }
    }
}
