//! Layered settings.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file, then `RATE_ALARM_*` environment variables (nested keys joined by
//! `__`, e.g. `RATE_ALARM_THRESHOLDS__DOMESTIC=45`). CLI flags are applied
//! on top by the binary.
//!
//! A file named explicitly must exist. Without one, `rate-alarm.toml` in the
//! working directory is read if present.
//!
//! ```toml
//! url = "https://iol.invertironline.com/mercado/cotizaciones/argentina/cauciones"
//!
//! [thresholds]
//! domestic = 50.0
//! foreign = 1.4
//!
//! [cadence]
//! settle = "6s"
//! cycle = "20s"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::alert::AlertConfig;
use crate::data::duration::parse_duration;
use crate::data::{CurrencyCodes, Thresholds};
use crate::parse::{PositionalParser, Positions};
use crate::source::DEFAULT_URL;
use crate::worker::{Backoff, Cadence};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RATE_ALARM";

/// Settings file read from the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "rate-alarm.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub url: String,
    pub user_agent: Option<String>,
    pub request_timeout: String,
    pub thresholds: Thresholds,
    pub currencies: CurrencyCodes,
    pub parser: ParserSettings,
    pub cadence: CadenceSettings,
    pub backoff: BackoffSettings,
    pub alert: AlertConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            user_agent: None,
            request_timeout: "15s".to_string(),
            thresholds: Thresholds::default(),
            currencies: CurrencyCodes::default(),
            parser: ParserSettings::default(),
            cadence: CadenceSettings::default(),
            backoff: BackoffSettings::default(),
            alert: AlertConfig::default(),
        }
    }
}

/// Token positions of each rate in the page, and the minimum token count.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub min_tokens: usize,
    pub domestic_1d: usize,
    pub foreign_1d: usize,
    pub foreign_7d: usize,
    pub domestic_7d: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        let positions = Positions::default();
        Self {
            min_tokens: 10,
            domestic_1d: positions.domestic_1d,
            foreign_1d: positions.foreign_1d,
            foreign_7d: positions.foreign_7d,
            domestic_7d: positions.domestic_7d,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CadenceSettings {
    pub startup: String,
    pub before_refresh: String,
    pub settle: String,
    pub cycle: String,
}

impl Default for CadenceSettings {
    fn default() -> Self {
        Self {
            startup: "10s".to_string(),
            before_refresh: "0s".to_string(),
            settle: "6s".to_string(),
            cycle: "20s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub multiplier: f64,
    pub max_delay: String,
    pub stale_after: u32,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            multiplier: 2.0,
            max_delay: "5m".to_string(),
            stale_after: 5,
        }
    }
}

impl Settings {
    /// Load settings from a file and the process environment.
    ///
    /// `Some(path)` must exist; `None` falls back to [`DEFAULT_CONFIG_FILE`]
    /// if it is there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Load settings with an explicit environment source.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };
        let config = Config::builder()
            .add_source(file)
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would make the monitor misbehave.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(t.domestic.is_finite() && t.domestic > 0.0) {
            bail!("thresholds.domestic must be a positive number, got {}", t.domestic);
        }
        if !(t.foreign.is_finite() && t.foreign > 0.0) {
            bail!("thresholds.foreign must be a positive number, got {}", t.foreign);
        }
        if !(self.backoff.multiplier.is_finite() && self.backoff.multiplier >= 1.0) {
            bail!("backoff.multiplier must be at least 1.0, got {}", self.backoff.multiplier);
        }
        if self.backoff.stale_after == 0 {
            bail!("backoff.stale_after must be at least 1");
        }
        self.cadence()?;
        self.backoff()?;
        self.request_timeout()?;
        Ok(())
    }

    pub fn cadence(&self) -> Result<Cadence> {
        let c = &self.cadence;
        Ok(Cadence {
            startup: duration_field("cadence.startup", &c.startup)?,
            before_refresh: duration_field("cadence.before_refresh", &c.before_refresh)?,
            settle: duration_field("cadence.settle", &c.settle)?,
            cycle: duration_field("cadence.cycle", &c.cycle)?,
        })
    }

    pub fn backoff(&self) -> Result<Backoff> {
        Ok(Backoff {
            multiplier: self.backoff.multiplier,
            max_delay: duration_field("backoff.max_delay", &self.backoff.max_delay)?,
            stale_after: self.backoff.stale_after,
        })
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        duration_field("request_timeout", &self.request_timeout)
    }

    pub fn positions(&self) -> Positions {
        Positions {
            domestic_1d: self.parser.domestic_1d,
            foreign_1d: self.parser.foreign_1d,
            foreign_7d: self.parser.foreign_7d,
            domestic_7d: self.parser.domestic_7d,
        }
    }

    pub fn page_parser(&self) -> PositionalParser {
        PositionalParser::new(self.positions(), self.parser.min_tokens)
    }
}

fn duration_field(name: &str, value: &str) -> Result<Duration> {
    parse_duration(value).with_context(|| format!("invalid duration for {name}"))
}
