//! Market data port trait.

use crate::domain::error::GoldenError;
use crate::domain::ohlcv::{OpeningRange, QuoteSnapshot, SessionRange};

pub trait DataFeed {
    /// Range of the last completed session. Fails with `InsufficientData`
    /// when fewer than two sessions are on record.
    fn previous_session(&self, symbol: &str) -> Result<SessionRange, GoldenError>;

    /// First bar of the current session. Fails with `MarketNotOpen` before
    /// that bar exists.
    fn opening_range(&self, symbol: &str) -> Result<OpeningRange, GoldenError>;

    /// Live quote metadata (previous close, today's high/low).
    fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, GoldenError>;

    /// Last traded price. May fail transiently with `GoldenError::Feed`.
    fn last_price(&self, symbol: &str) -> Result<f64, GoldenError>;
}
