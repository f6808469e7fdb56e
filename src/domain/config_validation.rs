//! Configuration validation.
//!
//! Validates every config field before a run starts.

use std::str::FromStr;

use chrono::NaiveTime;

use crate::domain::error::GoldenError;
use crate::domain::levels::LevelMode;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), GoldenError> {
    validate_symbol(config)?;
    validate_mode(config)?;
    validate_ratio(config)?;
    validate_risk(config)?;
    validate_polling(config)?;
    validate_session_end(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> GoldenError {
    GoldenError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), GoldenError> {
    match config.get_string("instrument", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(GoldenError::ConfigMissing {
            section: "instrument".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_mode(config: &dyn ConfigPort) -> Result<(), GoldenError> {
    match config.get_string("levels", "mode") {
        None => Ok(()),
        Some(s) => s
            .parse::<LevelMode>()
            .map(|_| ())
            .map_err(|reason| invalid("levels", "mode", &reason)),
    }
}

/// Parse a numeric key if present. A present but unparsable value is
/// rejected rather than replaced by the default.
fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, GoldenError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, &format!("'{}' is not a number", raw.trim()))),
    }
}

fn validate_ratio(config: &dyn ConfigPort) -> Result<(), GoldenError> {
    let value: f64 = parse_value(config, "levels", "ratio", 0.618)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid("levels", "ratio", "ratio must be in (0, 1]"));
    }
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), GoldenError> {
    let stop_loss: f64 = parse_value(config, "trade", "stop_loss_pct", 0.5)?;
    if !(stop_loss > 0.0 && stop_loss < 100.0) {
        return Err(invalid(
            "trade",
            "stop_loss_pct",
            "stop_loss_pct must be between 0 and 100",
        ));
    }
    let target: f64 = parse_value(config, "trade", "target_pct", 2.0)?;
    if !(target > 0.0 && target < 100.0) {
        return Err(invalid(
            "trade",
            "target_pct",
            "target_pct must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_polling(config: &dyn ConfigPort) -> Result<(), GoldenError> {
    let interval: i64 = parse_value(config, "polling", "interval_secs", 10)?;
    if interval < 1 {
        return Err(invalid(
            "polling",
            "interval_secs",
            "interval_secs must be at least 1",
        ));
    }
    let backoff: i64 = parse_value(config, "polling", "retry_backoff_secs", 5)?;
    if backoff < 1 {
        return Err(invalid(
            "polling",
            "retry_backoff_secs",
            "retry_backoff_secs must be at least 1",
        ));
    }
    Ok(())
}

fn validate_session_end(config: &dyn ConfigPort) -> Result<(), GoldenError> {
    match config.get_string("polling", "session_end") {
        None => Ok(()),
        Some(s) if s.trim().is_empty() => Ok(()),
        Some(s) => parse_time(&s)
            .map(|_| ())
            .ok_or_else(|| invalid("polling", "session_end", "expected HH:MM or HH:MM:SS")),
    }
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}
