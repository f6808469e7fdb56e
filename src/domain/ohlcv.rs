//! Bars, session ranges and quote snapshots.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::error::GoldenError;

/// Minimum number of distinct sessions needed to compute levels.
pub const MIN_SESSIONS: usize = 2;

#[derive(Debug, Clone)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
            && self.high >= self.low
    }
}

/// High/low/close of a closed trading session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionRange {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl SessionRange {
    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    pub fn validate(&self, symbol: &str) -> Result<(), GoldenError> {
        if !(self.high.is_finite() && self.low.is_finite() && self.close.is_finite()) {
            return Err(GoldenError::data_unavailable(
                symbol,
                "previous session contains non-finite values",
            ));
        }
        if self.high < self.low {
            return Err(GoldenError::data_unavailable(
                symbol,
                format!("previous session high {} below low {}", self.high, self.low),
            ));
        }
        Ok(())
    }
}

/// High/low of the first bar of the current session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningRange {
    pub high: f64,
    pub low: f64,
}

impl OpeningRange {
    pub fn size(&self) -> f64 {
        self.high - self.low
    }

    pub fn validate(&self, symbol: &str) -> Result<(), GoldenError> {
        if !(self.high.is_finite() && self.low.is_finite()) || self.high < self.low {
            return Err(GoldenError::data_unavailable(
                symbol,
                format!("malformed opening range {}..{}", self.low, self.high),
            ));
        }
        Ok(())
    }
}

/// Live quote metadata: the exchange's previous close plus today's high/low so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteSnapshot {
    pub prev_close: f64,
    pub high: f64,
    pub low: f64,
}

impl QuoteSnapshot {
    /// The live session range, used in place of the opening bar in quote mode.
    pub fn session_range(&self) -> OpeningRange {
        OpeningRange {
            high: self.high,
            low: self.low,
        }
    }
}

fn group_by_date<'a>(
    symbol: &str,
    bars: &'a [OhlcvBar],
) -> Result<BTreeMap<NaiveDate, Vec<&'a OhlcvBar>>, GoldenError> {
    if bars.is_empty() {
        return Err(GoldenError::data_unavailable(symbol, "no bars returned"));
    }
    if let Some(bad) = bars.iter().find(|b| !b.is_well_formed()) {
        return Err(GoldenError::data_unavailable(
            symbol,
            format!("malformed bar at {}", bad.timestamp),
        ));
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<&OhlcvBar>> = BTreeMap::new();
    for bar in bars {
        by_date.entry(bar.date()).or_default().push(bar);
    }
    Ok(by_date)
}

/// Aggregate the latest session that closed before `current`.
///
/// Does not need any bar for `current` itself: the current session may be
/// represented only by a live quote. Fails with `InsufficientData` when no
/// closed session exists, since the current one alone is a single session.
pub fn previous_session(
    symbol: &str,
    bars: &[OhlcvBar],
    current: NaiveDate,
) -> Result<SessionRange, GoldenError> {
    let by_date = group_by_date(symbol, bars)?;
    let previous = by_date
        .range(..current)
        .next_back()
        .map(|(_, bars)| aggregate(bars))
        .ok_or_else(|| GoldenError::InsufficientData {
            symbol: symbol.to_string(),
            sessions: 1,
            minimum: MIN_SESSIONS,
        })?;
    Ok(previous)
}

/// High/low of the earliest bar dated `current`.
pub fn opening_range(
    symbol: &str,
    bars: &[OhlcvBar],
    current: NaiveDate,
) -> Result<OpeningRange, GoldenError> {
    let by_date = group_by_date(symbol, bars)?;
    by_date
        .get(&current)
        .and_then(|bars| bars.iter().min_by_key(|b| b.timestamp))
        .map(|bar| OpeningRange {
            high: bar.high,
            low: bar.low,
        })
        .ok_or_else(|| GoldenError::MarketNotOpen {
            symbol: symbol.to_string(),
            what: "bar".to_string(),
        })
}

fn aggregate(bars: &[&OhlcvBar]) -> SessionRange {
    let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let close = bars
        .iter()
        .max_by_key(|b| b.timestamp)
        .map(|b| b.close)
        .unwrap_or(f64::NAN);
    SessionRange { high, low, close }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(ts: &str, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn two_sessions() -> Vec<OhlcvBar> {
        vec![
            bar("2024-03-04 09:15", 980.0, 920.0, 950.0),
            bar("2024-03-04 15:15", 1000.0, 900.0, 955.0),
            bar("2024-03-05 09:20", 1010.0, 990.0, 1000.0),
            bar("2024-03-05 09:15", 970.0, 920.0, 960.0),
        ]
    }

    #[test]
    fn previous_session_aggregates_prior_day() {
        let previous = previous_session("NIFTY", &two_sessions(), date(5)).unwrap();
        assert_eq!(
            previous,
            SessionRange {
                high: 1000.0,
                low: 900.0,
                close: 955.0
            }
        );
    }

    #[test]
    fn opening_range_uses_earliest_bar_of_current_session() {
        let opening = opening_range("NIFTY", &two_sessions(), date(5)).unwrap();
        assert_eq!(
            opening,
            OpeningRange {
                high: 970.0,
                low: 920.0
            }
        );
        assert!((opening.size() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn previous_session_without_current_bars_uses_latest_closed_day() {
        // Bars end yesterday; today is represented only by a live quote.
        let bars = vec![
            bar("2024-03-04 09:15", 1000.0, 900.0, 950.0),
            bar("2024-03-05 09:15", 1200.0, 800.0, 1100.0),
        ];
        let previous = previous_session("NIFTY", &bars, date(6)).unwrap();
        assert!((previous.span() - 400.0).abs() < f64::EPSILON);
        assert_eq!(previous.close, 1100.0);
    }

    #[test]
    fn one_closed_day_is_enough_for_previous_session() {
        let bars = vec![bar("2024-03-05 09:15", 1000.0, 900.0, 950.0)];
        let previous = previous_session("NIFTY", &bars, date(6)).unwrap();
        assert_eq!(previous.close, 950.0);
    }

    #[test]
    fn single_session_is_insufficient() {
        let bars = vec![
            bar("2024-03-05 09:15", 1_000_000.0, 1.0, 5.0),
            bar("2024-03-05 09:20", 2.0, 1.0, 1.5),
        ];
        let err = previous_session("NIFTY", &bars, date(5)).unwrap_err();
        assert!(matches!(
            err,
            GoldenError::InsufficientData { sessions: 1, minimum: 2, .. }
        ));
    }

    #[test]
    fn empty_bars_are_unavailable() {
        let err = previous_session("NIFTY", &[], date(5)).unwrap_err();
        assert!(matches!(err, GoldenError::DataUnavailable { .. }));
        let err = opening_range("NIFTY", &[], date(5)).unwrap_err();
        assert!(matches!(err, GoldenError::DataUnavailable { .. }));
    }

    #[test]
    fn inverted_bar_is_unavailable() {
        let mut bars = two_sessions();
        bars[1].high = 800.0;
        let err = previous_session("NIFTY", &bars, date(5)).unwrap_err();
        assert!(matches!(err, GoldenError::DataUnavailable { .. }));
    }

    #[test]
    fn missing_current_session_is_market_not_open() {
        let err = opening_range("NIFTY", &two_sessions(), date(6)).unwrap_err();
        assert!(matches!(err, GoldenError::MarketNotOpen { .. }));
    }

    #[test]
    fn earlier_session_date_ignores_later_bars() {
        let bars = vec![
            bar("2024-03-01 09:15", 500.0, 400.0, 450.0),
            bar("2024-03-04 09:15", 1000.0, 900.0, 950.0),
            bar("2024-03-05 09:15", 970.0, 920.0, 960.0),
        ];
        let previous = previous_session("NIFTY", &bars, date(4)).unwrap();
        assert_eq!(previous.close, 450.0);
        let opening = opening_range("NIFTY", &bars, date(4)).unwrap();
        assert_eq!(opening.high, 1000.0);
    }

    #[test]
    fn session_range_rejects_inverted() {
        let range = SessionRange {
            high: 10.0,
            low: 20.0,
            close: 15.0,
        };
        assert!(range.validate("NIFTY").is_err());
    }

    #[test]
    fn quote_session_range() {
        let quote = QuoteSnapshot {
            prev_close: 48_000.0,
            high: 48_250.0,
            low: 47_900.0,
        };
        assert!((quote.session_range().size() - 350.0).abs() < f64::EPSILON);
    }
}
