//! One run of the strategy: levels, then detection, then monitoring.
//!
//! The session owns the [`TradeState`] and the [`ActiveTrade`]; each phase
//! starts only after the previous one has produced its result.

use tracing::info;

use crate::domain::breakout::BreakoutDetector;
use crate::domain::error::GoldenError;
use crate::domain::levels::{GoldenLevels, LevelCalculator};
use crate::domain::monitor::TradeMonitor;
use crate::domain::poller::{PollSettings, Poller, StopSignal};
use crate::domain::trade::{ActiveTrade, ExitEvent, RiskParams, TradeState};
use crate::ports::clock_port::Clock;
use crate::ports::data_port::DataFeed;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub symbol: String,
    pub calculator: LevelCalculator,
    pub risk: RiskParams,
    pub poll: PollSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub levels: GoldenLevels,
    pub entry: Option<ActiveTrade>,
    pub exit: Option<ExitEvent>,
    pub final_state: TradeState,
}

pub struct TradeSession<'a> {
    config: SessionConfig,
    feed: &'a dyn DataFeed,
    clock: &'a dyn Clock,
    stop: StopSignal,
    state: TradeState,
    trade: Option<ActiveTrade>,
}

impl<'a> TradeSession<'a> {
    pub fn new(
        config: SessionConfig,
        feed: &'a dyn DataFeed,
        clock: &'a dyn Clock,
        stop: StopSignal,
    ) -> Self {
        Self {
            config,
            feed,
            clock,
            stop,
            state: TradeState::None,
            trade: None,
        }
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    pub fn active_trade(&self) -> Option<&ActiveTrade> {
        self.trade.as_ref()
    }

    pub fn compute_levels(&self) -> Result<GoldenLevels, GoldenError> {
        let symbol = &self.config.symbol;
        let levels = self.config.calculator.compute_from_feed(self.feed, symbol)?;
        info!(
            symbol = symbol.as_str(),
            mode = %self.config.calculator.mode,
            reference_close = levels.reference_close,
            buy_above = levels.buy_above,
            sell_below = levels.sell_below,
            "levels computed"
        );
        Ok(levels)
    }

    /// Run all three phases. Cancellation in either polling phase ends the
    /// run early with the state reached so far.
    pub fn run(&mut self) -> Result<SessionReport, GoldenError> {
        let levels = self.compute_levels()?;
        self.run_with_levels(levels)
    }

    pub fn run_with_levels(
        &mut self,
        levels: GoldenLevels,
    ) -> Result<SessionReport, GoldenError> {
        if self.state != TradeState::None {
            return Err(GoldenError::InvalidTransition {
                from: self.state,
                reason: "session already ran".to_string(),
            });
        }

        let symbol = self.config.symbol.clone();
        let poller = Poller::new(self.feed, self.clock, self.config.poll, self.stop.clone());

        let detector = BreakoutDetector::new(levels, self.config.risk, &poller);
        let Some(trade) = detector.run(&symbol)? else {
            return Ok(self.report(levels, None));
        };
        self.state = self.state.trigger(trade.direction)?;
        self.trade = Some(trade);

        let monitor = TradeMonitor::new(trade, &poller);
        let Some(exit) = monitor.run(&symbol)? else {
            return Ok(self.report(levels, None));
        };
        self.state = self.state.close()?;
        let report = self.report(levels, Some(exit));
        self.trade = None;
        Ok(report)
    }

    fn report(&self, levels: GoldenLevels, exit: Option<ExitEvent>) -> SessionReport {
        SessionReport {
            levels,
            entry: self.trade,
            exit,
            final_state: self.state,
        }
    }
}
