//! CSV file data feed.
//!
//! Reads three files per symbol from a base directory:
//! - `{SYMBOL}_bars.csv`: `timestamp,open,high,low,close,volume`
//! - `{SYMBOL}_quote.csv`: `prev_close,high,low` (last row wins)
//! - `{SYMBOL}_ticks.csv`: `price` column, replayed one row per `last_price` call

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::error::GoldenError;
use crate::domain::ohlcv::{self, OhlcvBar, OpeningRange, QuoteSnapshot, SessionRange};
use crate::ports::data_port::DataFeed;

pub struct CsvFeed {
    base_path: PathBuf,
    session_date: NaiveDate,
    ticks: RefCell<Option<Vec<String>>>,
    cursor: Cell<usize>,
}

impl CsvFeed {
    /// `session_date` is the current session; bars dated before it are
    /// closed sessions.
    pub fn new(base_path: PathBuf, session_date: NaiveDate) -> Self {
        Self {
            base_path,
            session_date,
            ticks: RefCell::new(None),
            cursor: Cell::new(0),
        }
    }

    fn path(&self, symbol: &str, kind: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, kind))
    }

    fn read(&self, symbol: &str, kind: &str) -> Result<String, GoldenError> {
        let path = self.path(symbol, kind);
        fs::read_to_string(&path).map_err(|e| {
            GoldenError::data_unavailable(
                symbol,
                format!("failed to read {}: {}", path.display(), e),
            )
        })
    }

    pub fn fetch_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, GoldenError> {
        let content = self.read(symbol, "bars")?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| {
                GoldenError::data_unavailable(symbol, format!("CSV parse error: {}", e))
            })?;

            let ts_str = record
                .get(0)
                .ok_or_else(|| GoldenError::data_unavailable(symbol, "missing timestamp column"))?;
            let timestamp = parse_timestamp(ts_str).ok_or_else(|| {
                GoldenError::data_unavailable(symbol, format!("invalid timestamp '{}'", ts_str))
            })?;

            let field = |idx: usize, name: &str| -> Result<f64, GoldenError> {
                record
                    .get(idx)
                    .ok_or_else(|| {
                        GoldenError::data_unavailable(symbol, format!("missing {} column", name))
                    })?
                    .trim()
                    .parse()
                    .map_err(|e| {
                        GoldenError::data_unavailable(
                            symbol,
                            format!("invalid {} value: {}", name, e),
                        )
                    })
            };

            let volume: i64 = match record.get(5).map(str::trim) {
                None | Some("") => 0,
                Some(v) => v.parse().map_err(|e| {
                    GoldenError::data_unavailable(symbol, format!("invalid volume value: {}", e))
                })?,
            };

            bars.push(OhlcvBar {
                timestamp,
                open: field(1, "open")?,
                high: field(2, "high")?,
                low: field(3, "low")?,
                close: field(4, "close")?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn load_ticks(&self, symbol: &str) -> Result<(), GoldenError> {
        if self.ticks.borrow().is_some() {
            return Ok(());
        }
        let content = self.read(symbol, "ticks")?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let column = rdr
            .headers()
            .map_err(|e| GoldenError::data_unavailable(symbol, format!("CSV parse error: {}", e)))?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("price"))
            .unwrap_or(0);

        let mut ticks = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                GoldenError::data_unavailable(symbol, format!("CSV parse error: {}", e))
            })?;
            ticks.push(record.get(column).unwrap_or_default().trim().to_string());
        }
        *self.ticks.borrow_mut() = Some(ticks);
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl DataFeed for CsvFeed {
    fn previous_session(&self, symbol: &str) -> Result<SessionRange, GoldenError> {
        let bars = self.fetch_bars(symbol)?;
        ohlcv::previous_session(symbol, &bars, self.session_date)
    }

    fn opening_range(&self, symbol: &str) -> Result<OpeningRange, GoldenError> {
        let bars = self.fetch_bars(symbol)?;
        ohlcv::opening_range(symbol, &bars, self.session_date)
    }

    fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, GoldenError> {
        let content = self.read(symbol, "quote")?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let record = rdr
            .records()
            .last()
            .ok_or_else(|| GoldenError::MarketNotOpen {
                symbol: symbol.to_string(),
                what: "quote".to_string(),
            })?
            .map_err(|e| GoldenError::data_unavailable(symbol, format!("CSV parse error: {}", e)))?;

        let field = |idx: usize, name: &str| -> Result<f64, GoldenError> {
            record
                .get(idx)
                .and_then(|v| v.trim().parse().ok())
                .ok_or_else(|| {
                    GoldenError::data_unavailable(symbol, format!("missing or invalid {}", name))
                })
        };

        Ok(QuoteSnapshot {
            prev_close: field(0, "prev_close")?,
            high: field(1, "high")?,
            low: field(2, "low")?,
        })
    }

    fn last_price(&self, symbol: &str) -> Result<f64, GoldenError> {
        self.load_ticks(symbol)?;
        let idx = self.cursor.get();
        let raw = self
            .ticks
            .borrow()
            .as_ref()
            .and_then(|ticks| ticks.get(idx).cloned())
            .ok_or_else(|| GoldenError::data_unavailable(symbol, "tick replay exhausted"))?;
        self.cursor.set(idx + 1);

        raw.parse().map_err(|_| GoldenError::InvalidQuote {
            symbol: symbol.to_string(),
            reason: format!("non-numeric price '{}'", raw),
        })
    }
}
