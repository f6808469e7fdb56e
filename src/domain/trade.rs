//! Trade lifecycle: direction, state machine states, and the active trade.

use std::fmt;

use crate::domain::error::GoldenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Single-shot lifecycle of one run: `None -> *Triggered -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeState {
    #[default]
    None,
    BuyTriggered,
    SellTriggered,
    Closed,
}

impl TradeState {
    pub fn trigger(self, direction: Direction) -> Result<TradeState, GoldenError> {
        match self {
            TradeState::None => Ok(match direction {
                Direction::Buy => TradeState::BuyTriggered,
                Direction::Sell => TradeState::SellTriggered,
            }),
            other => Err(GoldenError::InvalidTransition {
                from: other,
                reason: format!("cannot trigger {direction}"),
            }),
        }
    }

    pub fn close(self) -> Result<TradeState, GoldenError> {
        match self {
            TradeState::BuyTriggered | TradeState::SellTriggered => Ok(TradeState::Closed),
            other => Err(GoldenError::InvalidTransition {
                from: other,
                reason: "only a triggered trade can be closed".to_string(),
            }),
        }
    }

    pub fn is_triggered(self) -> bool {
        matches!(self, TradeState::BuyTriggered | TradeState::SellTriggered)
    }
}

/// Exit offsets as percentages of the entry price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    pub stop_loss_pct: f64,
    pub target_pct: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.5,
            target_pct: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTrade {
    pub direction: Direction,
    pub entry_price: f64,
    pub target: f64,
    pub stop_loss: f64,
}

impl ActiveTrade {
    /// Open a trade at `price`, placing target and stop on the profitable and
    /// losing side of the entry respectively.
    pub fn open(direction: Direction, price: f64, risk: &RiskParams) -> Self {
        let sl = risk.stop_loss_pct / 100.0;
        let tp = risk.target_pct / 100.0;
        let (stop_loss, target) = match direction {
            Direction::Buy => (price * (1.0 - sl), price * (1.0 + tp)),
            Direction::Sell => (price * (1.0 + sl), price * (1.0 - tp)),
        };
        Self {
            direction,
            entry_price: price,
            target,
            stop_loss,
        }
    }

    // Boundaries are inclusive: a tick exactly on the level counts as a hit.
    pub fn should_take_profit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Buy => price >= self.target,
            Direction::Sell => price <= self.target,
        }
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match self.direction {
            Direction::Buy => price <= self.stop_loss,
            Direction::Sell => price >= self.stop_loss,
        }
    }

    pub fn check_exit(&self, price: f64) -> Option<ExitEvent> {
        let outcome = if self.should_take_profit(price) {
            ExitOutcome::TargetHit
        } else if self.should_stop_loss(price) {
            ExitOutcome::StopLossHit
        } else {
            return None;
        };
        Some(ExitEvent { outcome, price })
    }

    /// Signed points gained at `price`.
    pub fn points(&self, price: f64) -> f64 {
        match self.direction {
            Direction::Buy => price - self.entry_price,
            Direction::Sell => self.entry_price - price,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    TargetHit,
    StopLossHit,
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::TargetHit => write!(f, "TARGET HIT"),
            ExitOutcome::StopLossHit => write!(f, "STOP LOSS HIT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitEvent {
    pub outcome: ExitOutcome,
    pub price: f64,
}
