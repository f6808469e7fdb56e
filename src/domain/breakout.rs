//! Breakout detection: wait for price to leave the golden band.

use tracing::info;

use crate::domain::error::GoldenError;
use crate::domain::levels::GoldenLevels;
use crate::domain::poller::Poller;
use crate::domain::trade::{ActiveTrade, Direction, RiskParams};

/// Direction of a breakout at `price`, if any. Both comparisons are strict.
pub fn breakout_direction(levels: &GoldenLevels, price: f64) -> Option<Direction> {
    if price > levels.buy_above {
        Some(Direction::Buy)
    } else if price < levels.sell_below {
        Some(Direction::Sell)
    } else {
        None
    }
}

pub struct BreakoutDetector<'a> {
    levels: GoldenLevels,
    risk: RiskParams,
    poller: &'a Poller<'a>,
}

impl<'a> BreakoutDetector<'a> {
    pub fn new(levels: GoldenLevels, risk: RiskParams, poller: &'a Poller<'a>) -> Self {
        Self {
            levels,
            risk,
            poller,
        }
    }

    /// Block until a threshold is crossed. `Ok(None)` means cancelled.
    pub fn run(&self, symbol: &str) -> Result<Option<ActiveTrade>, GoldenError> {
        let levels = self.levels;
        let risk = self.risk;
        self.poller.poll_until(symbol, "detect", |price| {
            info!(symbol, ltp = price, "waiting for breakout");
            let direction = breakout_direction(&levels, price)?;
            let trade = ActiveTrade::open(direction, price, &risk);
            info!(
                symbol,
                %direction,
                price,
                target = trade.target,
                stop_loss = trade.stop_loss,
                "breakout triggered"
            );
            Some(trade)
        })
    }
}
