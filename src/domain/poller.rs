//! Shared price-sampling loop for the detection and monitoring phases.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveTime;
use tracing::{debug, info, warn};

use crate::domain::error::GoldenError;
use crate::ports::clock_port::Clock;
use crate::ports::data_port::DataFeed;

/// Cloneable cancellation handle, checked at the top of every poll.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub retry_backoff: Duration,
    /// Stop polling once the clock reaches this time of day.
    pub session_end: Option<NaiveTime>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            retry_backoff: Duration::from_secs(5),
            session_end: None,
        }
    }
}

pub struct Poller<'a> {
    feed: &'a dyn DataFeed,
    clock: &'a dyn Clock,
    settings: PollSettings,
    stop: StopSignal,
}

impl<'a> Poller<'a> {
    pub fn new(
        feed: &'a dyn DataFeed,
        clock: &'a dyn Clock,
        settings: PollSettings,
        stop: StopSignal,
    ) -> Self {
        Self {
            feed,
            clock,
            settings,
            stop,
        }
    }

    fn should_stop(&self) -> bool {
        if self.stop.is_stopped() {
            return true;
        }
        self.settings
            .session_end
            .is_some_and(|end| self.clock.now().time() >= end)
    }

    /// Sample the last price until `decide` returns a value.
    ///
    /// Returns `Ok(None)` if cancelled. Transient feed errors are retried
    /// after the backoff; any other error ends the loop.
    pub fn poll_until<T, F>(
        &self,
        symbol: &str,
        phase: &str,
        mut decide: F,
    ) -> Result<Option<T>, GoldenError>
    where
        F: FnMut(f64) -> Option<T>,
    {
        let mut samples: u64 = 0;
        loop {
            if self.should_stop() {
                info!(symbol, phase, samples, "polling cancelled");
                return Ok(None);
            }

            let price = match self.feed.last_price(symbol) {
                Ok(raw) => validate_quote(symbol, raw)?,
                Err(e) if e.is_transient() => {
                    warn!(symbol, phase, error = %e, "retrying connection");
                    self.clock.sleep(self.settings.retry_backoff);
                    continue;
                }
                Err(e) => return Err(e),
            };
            samples += 1;
            debug!(symbol, phase, price, samples, "sampled last price");

            if let Some(decision) = decide(price) {
                return Ok(Some(decision));
            }
            self.clock.sleep(self.settings.interval);
        }
    }
}

fn validate_quote(symbol: &str, price: f64) -> Result<f64, GoldenError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(GoldenError::InvalidQuote {
            symbol: symbol.to_string(),
            reason: format!("price {price} is not a positive number"),
        });
    }
    Ok(price)
}
