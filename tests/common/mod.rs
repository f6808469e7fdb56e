#![allow(dead_code)]

use chrono::NaiveDateTime;
use goldentrigger::domain::error::GoldenError;
use goldentrigger::domain::levels::{GoldenLevels, LevelCalculator};
use goldentrigger::domain::ohlcv::{OpeningRange, QuoteSnapshot, SessionRange};
use goldentrigger::domain::poller::{PollSettings, StopSignal};
use goldentrigger::domain::session::SessionConfig;
use goldentrigger::domain::trade::RiskParams;
use goldentrigger::ports::clock_port::Clock;
use goldentrigger::ports::data_port::DataFeed;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

pub enum Tick {
    Price(f64),
    Timeout,
}

pub struct MockFeed {
    pub previous: Result<SessionRange, String>,
    pub opening: Option<OpeningRange>,
    pub quote: Option<QuoteSnapshot>,
    ticks: RefCell<VecDeque<Tick>>,
    pub price_calls: Cell<usize>,
    stop_after: Option<(usize, StopSignal)>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self {
            previous: Ok(SessionRange {
                high: 1000.0,
                low: 900.0,
                close: 950.0,
            }),
            opening: Some(OpeningRange {
                high: 975.0,
                low: 925.0,
            }),
            quote: None,
            ticks: RefCell::new(VecDeque::new()),
            price_calls: Cell::new(0),
            stop_after: None,
        }
    }

    pub fn with_prices(self, prices: &[f64]) -> Self {
        self.ticks
            .borrow_mut()
            .extend(prices.iter().copied().map(Tick::Price));
        self
    }

    pub fn with_timeout(self) -> Self {
        self.ticks.borrow_mut().push_back(Tick::Timeout);
        self
    }

    pub fn with_quote(mut self, prev_close: f64, high: f64, low: f64) -> Self {
        self.quote = Some(QuoteSnapshot {
            prev_close,
            high,
            low,
        });
        self
    }

    pub fn without_opening(mut self) -> Self {
        self.opening = None;
        self
    }

    /// Raise `stop` once `calls` prices have been served.
    pub fn stopping_after(mut self, calls: usize, stop: StopSignal) -> Self {
        self.stop_after = Some((calls, stop));
        self
    }

    pub fn with_insufficient_history(mut self) -> Self {
        self.previous = Err("only one session".to_string());
        self
    }
}

impl DataFeed for MockFeed {
    fn previous_session(&self, symbol: &str) -> Result<SessionRange, GoldenError> {
        self.previous
            .clone()
            .map_err(|_| GoldenError::InsufficientData {
                symbol: symbol.to_string(),
                sessions: 1,
                minimum: 2,
            })
    }

    fn opening_range(&self, symbol: &str) -> Result<OpeningRange, GoldenError> {
        self.opening.ok_or_else(|| GoldenError::MarketNotOpen {
            symbol: symbol.to_string(),
            what: "bar".to_string(),
        })
    }

    fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, GoldenError> {
        self.quote.ok_or_else(|| GoldenError::MarketNotOpen {
            symbol: symbol.to_string(),
            what: "quote".to_string(),
        })
    }

    fn last_price(&self, symbol: &str) -> Result<f64, GoldenError> {
        self.price_calls.set(self.price_calls.get() + 1);
        if let Some((calls, stop)) = &self.stop_after {
            if self.price_calls.get() >= *calls {
                stop.stop();
            }
        }
        match self.ticks.borrow_mut().pop_front() {
            Some(Tick::Price(p)) => Ok(p),
            Some(Tick::Timeout) => Err(GoldenError::Feed {
                reason: "read timed out".to_string(),
            }),
            None => Err(GoldenError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no more ticks".to_string(),
            }),
        }
    }
}

/// Clock that never blocks; `sleep` advances `now` and is recorded.
pub struct FakeClock {
    now: Cell<NaiveDateTime>,
    pub sleeps: RefCell<Vec<Duration>>,
}

impl FakeClock {
    pub fn at(ts: &str) -> Self {
        Self {
            now: Cell::new(NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap()),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn new() -> Self {
        Self::at("2024-03-05 09:30:00")
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now
            .set(self.now.get() + chrono::Duration::from_std(duration).unwrap());
        self.sleeps.borrow_mut().push(duration);
    }
}

pub fn sample_levels() -> GoldenLevels {
    GoldenLevels {
        buy_above: 1042.7,
        sell_below: 857.3,
        reference_close: 950.0,
        golden_number: 92.7,
    }
}

pub fn session_config(symbol: &str) -> SessionConfig {
    SessionConfig {
        symbol: symbol.to_string(),
        calculator: LevelCalculator::default(),
        risk: RiskParams::default(),
        poll: PollSettings::default(),
    }
}
