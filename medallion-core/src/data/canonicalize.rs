//! Cleaning of raw bar tables into the canonical layout.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::*;
use tracing::{debug, warn};

use super::frame::{timestamp_dtype, FrameError};
use super::schema::{self, canonical_name};

/// Canonicalizer for bar tables
pub struct Canonicalizer;

impl Canonicalizer {
    /// Full cleaning pass: standardize names and types, order by time,
    /// forward-fill gaps, drop rows still lacking a close and drop exact
    /// duplicate rows.
    ///
    /// Running it on its own output returns an identical table.
    pub fn clean(df: DataFrame) -> Result<DataFrame, FrameError> {
        let rows_in = df.height();
        let df = Self::standardize_columns(df)?;
        let df = Self::normalize_timestamp(df)?;
        let df = Self::cast_numeric(df)?;
        let df = Self::order(df.lazy()).collect()?;
        let df = Self::forward_fill(df)?;
        let df = Self::drop_unpriced(df)?;
        let df = Self::dedupe(df.lazy()).collect()?;
        debug!(rows_in, rows_out = df.height(), "cleaned bar table");
        Ok(df)
    }

    /// Rename vendor columns (`Close`, `Adj Close`, `Date`, ...) to canonical ones.
    ///
    /// A vendor column is left alone when its canonical name is already taken.
    pub fn standardize_columns(mut df: DataFrame) -> Result<DataFrame, FrameError> {
        let names: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
        for name in names {
            if let Some(canonical) = canonical_name(&name) {
                if df.column(canonical).is_err() {
                    df.rename(&name, canonical.into())?;
                }
            }
        }
        Ok(df)
    }

    /// Bring the timestamp column to `Datetime(ms)` and drop rows without one.
    pub fn normalize_timestamp(mut df: DataFrame) -> Result<DataFrame, FrameError> {
        let column = df
            .column(schema::TIMESTAMP)
            .map_err(|_| FrameError::MissingColumns(schema::TIMESTAMP.to_string()))?;

        let normalized = if column.dtype() == &DataType::String {
            let parsed: Vec<Option<i64>> = column
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_timestamp).map(|ts| ts.timestamp_millis()))
                .collect();
            Column::new(schema::TIMESTAMP.into(), parsed).cast(&timestamp_dtype())?
        } else {
            column.cast(&timestamp_dtype())?
        };
        df.with_column(normalized)?;

        Ok(df
            .lazy()
            .filter(col(schema::TIMESTAMP).is_not_null())
            .collect()?)
    }

    /// Cast present numeric columns: prices to Float64, volume to UInt64.
    /// Non-finite prices become null so they are filled like any other gap.
    pub fn cast_numeric(mut df: DataFrame) -> Result<DataFrame, FrameError> {
        for name in schema::NUMERIC_COLUMNS {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let cast = if name == schema::VOLUME {
                if column.dtype() == &DataType::UInt64 {
                    continue;
                }
                column.cast(&DataType::UInt64)?
            } else {
                let prices = column.cast(&DataType::Float64)?;
                let finite: Vec<Option<f64>> = prices
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| x.is_finite()))
                    .collect();
                Column::new(name.into(), finite)
            };
            df.with_column(cast)?;
        }
        Ok(df)
    }

    /// Stable sort on timestamp.
    pub fn order(df: LazyFrame) -> LazyFrame {
        df.sort(
            [schema::TIMESTAMP],
            SortMultipleOptions::default().with_maintain_order(true),
        )
    }

    /// Drop rows identical in every column, keeping the first.
    pub fn dedupe(df: LazyFrame) -> LazyFrame {
        df.unique_stable(None, UniqueKeepStrategy::First)
    }

    /// Carry the last known value forward into nulls of numeric columns.
    /// Expects time order; a leading null stays null.
    pub fn forward_fill(mut df: DataFrame) -> Result<DataFrame, FrameError> {
        for name in schema::NUMERIC_COLUMNS {
            let filled = match df.column(name) {
                Ok(column) if column.null_count() > 0 => column
                    .as_materialized_series()
                    .fill_null(FillNullStrategy::Forward(None))?,
                _ => continue,
            };
            df.with_column(filled)?;
        }
        Ok(df)
    }
}

impl Canonicalizer {
    /// Drop rows whose close is still null after forward-fill. Only a leading
    /// run of missing closes can remain.
    pub fn drop_unpriced(df: DataFrame) -> Result<DataFrame, FrameError> {
        let dropped = match df.column(schema::CLOSE) {
            Ok(column) => column.null_count(),
            Err(_) => return Ok(df),
        };
        if dropped == 0 {
            return Ok(df);
        }
        warn!(dropped, "dropping rows without a close");
        Ok(df
            .lazy()
            .filter(col(schema::CLOSE).is_not_null())
            .collect()?)
    }
}

/// Parse the timestamp spellings vendors hand out. Naive values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
