//! Golden-ratio breakout levels.
//!
//! ```text
//! golden_number = (prev_high - prev_low + opening_range_size) * ratio
//! buy_above     = reference_close + golden_number
//! sell_below    = reference_close - golden_number
//! ```
//!
//! The [`LevelMode`] decides where `reference_close` and the opening range come
//! from and how the outputs are rounded.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::GoldenError;
use crate::domain::ohlcv::{OpeningRange, SessionRange};
use crate::ports::data_port::DataFeed;

pub const GOLDEN_RATIO: f64 = 0.618;

/// Which data the feed can supply for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelMode {
    /// Previous session close from historical bars; opening range from the
    /// first bar of today. Rounded to 2 decimals.
    #[default]
    Historical,
    /// Previous close from live quote metadata; today's high/low so far as the
    /// range. Truncated to whole points.
    Quote,
}

impl LevelMode {
    pub fn round(self, value: f64) -> f64 {
        match self {
            LevelMode::Historical => (value * 100.0).round() / 100.0,
            LevelMode::Quote => value.trunc(),
        }
    }
}

impl FromStr for LevelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "historical" | "history" => Ok(LevelMode::Historical),
            "quote" => Ok(LevelMode::Quote),
            other => Err(format!(
                "unknown level mode '{other}' (expected historical or quote)"
            )),
        }
    }
}

impl fmt::Display for LevelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelMode::Historical => write!(f, "historical"),
            LevelMode::Quote => write!(f, "quote"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelInputs {
    pub previous: SessionRange,
    pub opening: OpeningRange,
    pub reference_close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoldenLevels {
    pub buy_above: f64,
    pub sell_below: f64,
    pub reference_close: f64,
    pub golden_number: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelCalculator {
    pub mode: LevelMode,
    pub ratio: f64,
}

impl Default for LevelCalculator {
    fn default() -> Self {
        Self {
            mode: LevelMode::default(),
            ratio: GOLDEN_RATIO,
        }
    }
}

impl LevelCalculator {
    pub fn new(mode: LevelMode, ratio: f64) -> Self {
        Self { mode, ratio }
    }

    /// Pure level computation.
    ///
    /// `reference_close` is rounded with the same rule as the outputs so the
    /// ordering `buy_above >= reference_close >= sell_below` survives rounding.
    pub fn compute(
        &self,
        symbol: &str,
        inputs: &LevelInputs,
    ) -> Result<GoldenLevels, GoldenError> {
        inputs.previous.validate(symbol)?;
        inputs.opening.validate(symbol)?;
        if !inputs.reference_close.is_finite() {
            return Err(GoldenError::data_unavailable(
                symbol,
                "reference close is not a number",
            ));
        }

        let golden_number = (inputs.previous.span() + inputs.opening.size()) * self.ratio;
        let reference = inputs.reference_close;

        Ok(GoldenLevels {
            buy_above: self.mode.round(reference + golden_number),
            sell_below: self.mode.round(reference - golden_number),
            reference_close: self.mode.round(reference),
            golden_number,
        })
    }

    /// Gather inputs from the feed according to the mode, then compute.
    pub fn compute_from_feed(
        &self,
        feed: &dyn DataFeed,
        symbol: &str,
    ) -> Result<GoldenLevels, GoldenError> {
        let previous = feed.previous_session(symbol)?;
        let inputs = match self.mode {
            LevelMode::Historical => LevelInputs {
                previous,
                opening: feed.opening_range(symbol)?,
                reference_close: previous.close,
            },
            LevelMode::Quote => {
                let quote = feed.quote(symbol)?;
                LevelInputs {
                    previous,
                    opening: quote.session_range(),
                    reference_close: quote.prev_close,
                }
            }
        };
        self.compute(symbol, &inputs)
    }
}
