//! Core domain types and logic.

pub mod ohlcv;
pub mod levels;
pub mod trade;
pub mod poller;
pub mod breakout;
pub mod monitor;
pub mod session;
pub mod config_validation;
pub mod error;

#[cfg(test)]
pub(crate) mod test_support;
