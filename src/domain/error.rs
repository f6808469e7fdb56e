//! Domain error types.

use crate::domain::trade::TradeState;

/// Top-level error type for goldentrigger.
#[derive(Debug, thiserror::Error)]
pub enum GoldenError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data for {symbol}: have {sessions} sessions, need {minimum}")]
    InsufficientData {
        symbol: String,
        sessions: usize,
        minimum: usize,
    },

    #[error("market not open for {symbol}: no current-session {what} yet")]
    MarketNotOpen { symbol: String, what: String },

    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// Network or timeout failure while sampling; recovered by the poller.
    #[error("feed error: {reason}")]
    Feed { reason: String },

    #[error("invalid quote for {symbol}: {reason}")]
    InvalidQuote { symbol: String, reason: String },

    #[error("invalid trade state transition from {from:?}: {reason}")]
    InvalidTransition { from: TradeState, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GoldenError {
    /// Only feed errors are retried; everything else ends the run.
    pub fn is_transient(&self) -> bool {
        matches!(self, GoldenError::Feed { .. })
    }

    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        GoldenError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&GoldenError> for std::process::ExitCode {
    fn from(err: &GoldenError) -> Self {
        let code: u8 = match err {
            GoldenError::Io(_) => 1,
            GoldenError::ConfigParse { .. }
            | GoldenError::ConfigMissing { .. }
            | GoldenError::ConfigInvalid { .. } => 2,
            GoldenError::DataUnavailable { .. } | GoldenError::Feed { .. } => 3,
            GoldenError::InvalidQuote { .. } => 4,
            GoldenError::InsufficientData { .. } | GoldenError::MarketNotOpen { .. } => 5,
            GoldenError::InvalidTransition { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
