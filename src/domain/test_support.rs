//! In-crate fakes for the feed and clock ports.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::domain::error::GoldenError;
use crate::domain::ohlcv::{OpeningRange, QuoteSnapshot, SessionRange};
use crate::ports::clock_port::Clock;
use crate::ports::data_port::DataFeed;

pub struct ScriptedFeed {
    script: RefCell<VecDeque<Result<f64, GoldenError>>>,
    calls: Cell<usize>,
}

impl ScriptedFeed {
    pub fn new(script: Vec<Result<f64, GoldenError>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
        }
    }

    pub fn prices(prices: &[f64]) -> Self {
        Self::new(prices.iter().copied().map(Ok).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl DataFeed for ScriptedFeed {
    fn previous_session(&self, _symbol: &str) -> Result<SessionRange, GoldenError> {
        Ok(SessionRange {
            high: 1000.0,
            low: 900.0,
            close: 950.0,
        })
    }

    fn opening_range(&self, _symbol: &str) -> Result<OpeningRange, GoldenError> {
        Ok(OpeningRange {
            high: 975.0,
            low: 925.0,
        })
    }

    fn quote(&self, _symbol: &str) -> Result<QuoteSnapshot, GoldenError> {
        Ok(QuoteSnapshot {
            prev_close: 950.0,
            high: 975.0,
            low: 925.0,
        })
    }

    fn last_price(&self, symbol: &str) -> Result<f64, GoldenError> {
        self.calls.set(self.calls.get() + 1);
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(GoldenError::data_unavailable(symbol, "script exhausted")))
    }
}

/// Clock that advances by exactly the slept duration.
pub struct FakeClock {
    now: Cell<NaiveDateTime>,
    slept: RefCell<Vec<Duration>>,
}

impl FakeClock {
    pub fn at(ts: &str) -> Self {
        Self {
            now: Cell::new(NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap()),
            slept: RefCell::new(Vec::new()),
        }
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::at("2024-03-05 09:30:00")
    }
}

impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        self.now.set(self.now.get() + step);
        self.slept.borrow_mut().push(duration);
    }
}
