//! Market data sources.
//!
//! The `MarketDataSource` trait abstracts over where bars come from so the
//! extraction stage can swap implementations and mock for tests.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use super::canonicalize::parse_timestamp;
use crate::domain::{DateRange, PriceBar};
use crate::storage::keys::validate_segment;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("ticker not found: {ticker}")]
    TickerNotFound { ticker: String },

    #[error("invalid ticker '{ticker}'")]
    InvalidTicker { ticker: String },

    #[error("no data for {ticker} between {start} and {end}")]
    NoData {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("malformed data for {ticker}: {reason}")]
    Malformed { ticker: String, reason: String },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Trait for market data sources.
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch bars for `ticker` whose date falls inside `range`.
    fn fetch(&self, ticker: &str, range: DateRange) -> Result<Vec<PriceBar>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "date", alias = "Datetime")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
    #[serde(alias = "Adj Close", alias = "adj_close", default)]
    adjusted_close: Option<f64>,
}

/// Reads `<dir>/<TICKER>.csv` files with a header row.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `ticker`; tickers that would leave `dir` are refused.
    fn path_for(&self, ticker: &str) -> Result<PathBuf, SourceError> {
        validate_segment("ticker", ticker).map_err(|_| SourceError::InvalidTicker {
            ticker: ticker.to_string(),
        })?;
        Ok(self.dir.join(format!("{ticker}.csv")))
    }
}

impl MarketDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, ticker: &str, range: DateRange) -> Result<Vec<PriceBar>, SourceError> {
        let path = self.path_for(ticker)?;
        if !path.exists() {
            return Err(SourceError::TickerNotFound {
                ticker: ticker.to_string(),
            });
        }
        let malformed = |reason: String| SourceError::Malformed {
            ticker: ticker.to_string(),
            reason,
        };

        let mut reader = csv::Reader::from_path(&path).map_err(|e| malformed(e.to_string()))?;
        let mut bars = Vec::new();
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| malformed(format!("row {}: {e}", line + 1)))?;
            let timestamp = parse_timestamp(&row.timestamp)
                .ok_or_else(|| malformed(format!("row {}: bad timestamp '{}'", line + 1, row.timestamp)))?;
            if !range.contains(timestamp.date_naive()) {
                continue;
            }
            bars.push(PriceBar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.max(0.0) as u64,
                adjusted_close: row.adjusted_close,
            });
        }

        if bars.is_empty() {
            return Err(SourceError::NoData {
                ticker: ticker.to_string(),
                start: range.start,
                end: range.end,
            });
        }
        Ok(bars)
    }
}

/// Deterministic random-walk bars for development and demos.
///
/// The walk is seeded from the ticker name, so the same ticker and range
/// always produce the same bars. Weekends are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    pub fn new() -> Self {
        Self
    }
}

pub fn generate_synthetic_bars(ticker: &str, range: DateRange) -> Vec<PriceBar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = range.start;

    while current <= range.end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        if let Some(midnight) = current.and_hms_opt(0, 0, 0) {
            bars.push(PriceBar {
                timestamp: midnight.and_utc(),
                open,
                high,
                low,
                close,
                volume,
                adjusted_close: Some(close),
            });
        }

        price = close;
        current += Duration::days(1);
    }

    bars
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, ticker: &str, range: DateRange) -> Result<Vec<PriceBar>, SourceError> {
        let bars = generate_synthetic_bars(ticker, range);
        if bars.is_empty() {
            return Err(SourceError::NoData {
                ticker: ticker.to_string(),
                start: range.start,
                end: range.end,
            });
        }
        Ok(bars)
    }
}
