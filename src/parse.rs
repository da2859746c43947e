//! Page parsing strategies.
//!
//! A [`PageParser`] turns the raw text of a quotes page into a named
//! [`RateReading`]. The default [`PositionalParser`] scans for percentage
//! figures and picks four of them by their position in the page's table.
//! That coupling to the page layout lives here and nowhere else.

use std::sync::LazyLock;

use regex::Regex;

use crate::data::{Currency, Horizon, RateKey, RateReading};
use crate::error::ParseError;

/// Strategy for extracting rates from raw page text.
pub trait PageParser: Send + Sync {
    /// Extract all four rates, or explain why the page is unusable.
    fn parse(&self, text: &str) -> Result<RateReading, ParseError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,3}[.,][0-9]{1,2})\s*%").expect("valid regex"));

/// Extract every percentage figure in document order.
///
/// Matches 1-3 ASCII integer digits, a `.` or `,` decimal separator, 1-2
/// fraction digits and a `%` sign (optionally preceded by whitespace).
/// Figures written in other digit systems are not rates and are skipped.
pub fn extract_percentages(text: &str) -> Vec<f64> {
    PERCENTAGE
        .captures_iter(text)
        .filter_map(|caps| caps[1].replace(',', ".").parse::<f64>().ok())
        .collect()
}

/// Token index of each rate in the page's percentage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Positions {
    pub domestic_1d: usize,
    pub foreign_1d: usize,
    pub domestic_7d: usize,
    pub foreign_7d: usize,
}

impl Default for Positions {
    fn default() -> Self {
        Self {
            domestic_1d: 0,
            foreign_1d: 1,
            foreign_7d: 7,
            domestic_7d: 8,
        }
    }
}

impl Positions {
    pub fn get(&self, key: RateKey) -> usize {
        match (key.currency, key.horizon) {
            (Currency::Domestic, Horizon::OneDay) => self.domestic_1d,
            (Currency::Foreign, Horizon::OneDay) => self.foreign_1d,
            (Currency::Domestic, Horizon::SevenDay) => self.domestic_7d,
            (Currency::Foreign, Horizon::SevenDay) => self.foreign_7d,
        }
    }

    fn max(&self) -> usize {
        self.domestic_1d
            .max(self.foreign_1d)
            .max(self.domestic_7d)
            .max(self.foreign_7d)
    }
}

/// Selects rates by fixed position in the percentage sequence.
#[derive(Debug, Clone)]
pub struct PositionalParser {
    positions: Positions,
    min_tokens: usize,
}

impl Default for PositionalParser {
    fn default() -> Self {
        Self::new(Positions::default(), 10)
    }
}

impl PositionalParser {
    /// Create a parser. The token minimum is raised if needed so every
    /// position is always in range.
    pub fn new(positions: Positions, min_tokens: usize) -> Self {
        Self {
            min_tokens: min_tokens.max(positions.max() + 1),
            positions,
        }
    }

    pub fn min_tokens(&self) -> usize {
        self.min_tokens
    }

    /// Pick the four rates out of an already-extracted token list.
    pub fn select(&self, tokens: &[f64]) -> Result<RateReading, ParseError> {
        if tokens.len() < self.min_tokens {
            return Err(ParseError::TooFewTokens {
                found: tokens.len(),
                required: self.min_tokens,
            });
        }

        let at = |key: RateKey| tokens[self.positions.get(key)];
        Ok(RateReading {
            domestic_1d: at(RateKey::DOMESTIC_1D),
            foreign_1d: at(RateKey::FOREIGN_1D),
            domestic_7d: at(RateKey::DOMESTIC_7D),
            foreign_7d: at(RateKey::FOREIGN_7D),
        })
    }
}

impl PageParser for PositionalParser {
    fn parse(&self, text: &str) -> Result<RateReading, ParseError> {
        self.select(&extract_percentages(text))
    }

    fn name(&self) -> &str {
        "positional"
    }
}
