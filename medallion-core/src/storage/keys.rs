//! Partition key scheme for the three layers.
//!
//! ```text
//! bronze/<ticker>/<data_type>/year=<Y>/month=<MM>/day=<DD>/<ticker>_<YYYYMMDD_HHMMSS>.parquet
//! silver/<ticker>/<data_type>/year=<Y>/month=<MM>/<ticker>_processed_<YYYYMMDD>.parquet
//! silver/<ticker>/<data_type>/year=<Y>/month=<MM>/<ticker>_indicators_<YYYYMMDD>.json
//! gold/<ticker>/analytics/<ticker>_monthly_<YYYYMMDD>.parquet
//! gold/<ticker>/analytics/<ticker>_stats_<YYYYMMDD>.json
//! ```

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::StorageError;

pub const BRONZE: &str = "bronze";
pub const SILVER: &str = "silver";
pub const GOLD: &str = "gold";
pub const ANALYTICS: &str = "analytics";

/// Reject keys that could escape a filesystem root or are not relative.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    if key.is_empty() {
        return Err(invalid("empty"));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(invalid("must be a relative POSIX path"));
    }
    if key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(invalid("empty or relative path segment"));
    }
    Ok(())
}

/// A ticker or data type must be usable as one key segment.
pub fn validate_segment(kind: &str, value: &str) -> Result<(), StorageError> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(StorageError::InvalidKey {
            key: value.to_string(),
            reason: format!("{kind} is not a valid key segment"),
        });
    }
    Ok(())
}

fn day_dir(layer: &str, ticker: &str, data_type: &str, date: NaiveDate) -> String {
    format!(
        "{layer}/{ticker}/{data_type}/year={}/month={:02}/day={:02}/",
        date.year(),
        date.month(),
        date.day()
    )
}

fn month_dir(layer: &str, ticker: &str, data_type: &str, date: NaiveDate) -> String {
    format!(
        "{layer}/{ticker}/{data_type}/year={}/month={:02}/",
        date.year(),
        date.month()
    )
}

/// Directory holding every Bronze object of one ticker/day.
pub fn bronze_day_prefix(ticker: &str, data_type: &str, date: NaiveDate) -> String {
    day_dir(BRONZE, ticker, data_type, date)
}

pub fn bronze_key(ticker: &str, data_type: &str, write_time: DateTime<Utc>) -> String {
    format!(
        "{}{ticker}_{}.parquet",
        bronze_day_prefix(ticker, data_type, write_time.date_naive()),
        write_time.format("%Y%m%d_%H%M%S")
    )
}

/// Everything a ticker has in a layer.
pub fn ticker_prefix(layer: &str, ticker: &str) -> String {
    format!("{layer}/{ticker}/")
}

pub fn silver_month_prefix(ticker: &str, data_type: &str, date: NaiveDate) -> String {
    month_dir(SILVER, ticker, data_type, date)
}

pub fn silver_key(ticker: &str, data_type: &str, date: NaiveDate) -> String {
    format!(
        "{}{ticker}_processed_{}.parquet",
        silver_month_prefix(ticker, data_type, date),
        date.format("%Y%m%d")
    )
}

pub fn silver_indicators_key(ticker: &str, data_type: &str, date: NaiveDate) -> String {
    format!(
        "{}{ticker}_indicators_{}.json",
        silver_month_prefix(ticker, data_type, date),
        date.format("%Y%m%d")
    )
}

/// Silver bar tables (not the sibling indicator JSON objects).
pub fn is_silver_table_key(key: &str) -> bool {
    key.starts_with("silver/") && key.contains("_processed_") && key.ends_with(".parquet")
}

pub fn gold_prefix(ticker: &str) -> String {
    format!("{GOLD}/{ticker}/{ANALYTICS}/")
}

pub fn gold_monthly_key(ticker: &str, date: NaiveDate) -> String {
    format!("{}{ticker}_monthly_{}.parquet", gold_prefix(ticker), date.format("%Y%m%d"))
}

pub fn gold_stats_key(ticker: &str, date: NaiveDate) -> String {
    format!("{}{ticker}_stats_{}.json", gold_prefix(ticker), date.format("%Y%m%d"))
}
