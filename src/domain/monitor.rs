//! Post-entry monitoring until target or stop-loss.

use tracing::info;

use crate::domain::error::GoldenError;
use crate::domain::poller::Poller;
use crate::domain::trade::{ActiveTrade, ExitEvent};

pub struct TradeMonitor<'a> {
    trade: ActiveTrade,
    poller: &'a Poller<'a>,
}

impl<'a> TradeMonitor<'a> {
    pub fn new(trade: ActiveTrade, poller: &'a Poller<'a>) -> Self {
        Self { trade, poller }
    }

    pub fn trade(&self) -> &ActiveTrade {
        &self.trade
    }

    /// Block until the trade exits. `Ok(None)` means cancelled.
    pub fn run(&self, symbol: &str) -> Result<Option<ExitEvent>, GoldenError> {
        let trade = self.trade;
        self.poller.poll_until(symbol, "monitor", |price| {
            info!(
                symbol,
                current = price,
                points = trade.points(price),
                "monitoring trade"
            );
            let event = trade.check_exit(price)?;
            info!(symbol, outcome = %event.outcome, price, "trade closed");
            Some(event)
        })
    }
}
