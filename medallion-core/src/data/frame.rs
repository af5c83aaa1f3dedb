//! Conversions between bars and Polars frames, plus in-memory Parquet I/O.
//!
//! Layers exchange tables as Parquet bytes; the object store never sees a
//! file path. Timestamps are stored as `Datetime(ms)` without a time zone and
//! interpreted as UTC.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use thiserror::Error;

use super::schema::{self, BarSchema};
use crate::domain::PriceBar;
use crate::engine::IndicatorPoint;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("missing required column(s): {0}")]
    MissingColumns(String),

    #[error("column '{column}': {reason}")]
    Column { column: String, reason: String },

    #[error("null timestamp at row {0}")]
    NullTimestamp(usize),

    #[error("parquet: {0}")]
    Parquet(String),

    #[error("polars: {0}")]
    Polars(#[from] PolarsError),
}

pub fn timestamp_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

fn finite_or_null(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Convert bars to the canonical bar table. Non-finite prices become nulls.
pub fn bars_to_frame(bars: &[PriceBar]) -> Result<DataFrame, FrameError> {
    let millis: Vec<i64> = bars.iter().map(|b| b.timestamp.timestamp_millis()).collect();
    let opens: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.open)).collect();
    let highs: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.high)).collect();
    let lows: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.low)).collect();
    let closes: Vec<Option<f64>> = bars.iter().map(|b| finite_or_null(b.close)).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();
    let adjusted: Vec<Option<f64>> = bars
        .iter()
        .map(|b| b.adjusted_close.and_then(finite_or_null))
        .collect();

    let df = DataFrame::new(vec![
        Column::new(schema::TIMESTAMP.into(), millis).cast(&timestamp_dtype())?,
        Column::new(schema::OPEN.into(), opens),
        Column::new(schema::HIGH.into(), highs),
        Column::new(schema::LOW.into(), lows),
        Column::new(schema::CLOSE.into(), closes),
        Column::new(schema::VOLUME.into(), volumes),
        Column::new(schema::ADJUSTED_CLOSE.into(), adjusted),
    ])?;
    Ok(df)
}

/// Timestamps of a frame as UTC datetimes. Fails on nulls.
pub fn frame_timestamps(df: &DataFrame) -> Result<Vec<DateTime<Utc>>, FrameError> {
    let column = df
        .column(schema::TIMESTAMP)
        .map_err(|_| FrameError::MissingColumns(schema::TIMESTAMP.to_string()))?;
    let millis = column.cast(&timestamp_dtype())?.cast(&DataType::Int64)?;
    let ca = millis.i64()?;
    let mut out = Vec::with_capacity(ca.len());
    for (row, v) in ca.into_iter().enumerate() {
        let ms = v.ok_or(FrameError::NullTimestamp(row))?;
        let ts = DateTime::<Utc>::from_timestamp_millis(ms).ok_or_else(|| FrameError::Column {
            column: schema::TIMESTAMP.to_string(),
            reason: format!("timestamp {ms} out of range"),
        })?;
        out.push(ts);
    }
    Ok(out)
}

/// A Float64 view of an optional column; `None` if the column is absent.
pub fn optional_f64_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>, FrameError> {
    match df.column(name) {
        Ok(column) => {
            let cast = column.cast(&DataType::Float64)?;
            Ok(Some(cast.f64()?.into_iter().collect()))
        }
        Err(_) => Ok(None),
    }
}

/// Convert a bar table back to bars.
///
/// `timestamp` and `close` are required. Missing `open/high/low` read as NaN
/// and a missing `volume` as 0, mirroring how sparse vendor rows arrive.
pub fn frame_to_bars(df: &DataFrame) -> Result<Vec<PriceBar>, FrameError> {
    let missing = BarSchema::missing_required(df);
    if !missing.is_empty() {
        return Err(FrameError::MissingColumns(missing.join(", ")));
    }

    let n = df.height();
    let timestamps = frame_timestamps(df)?;
    let column_or_nan = |name: &str| -> Result<Vec<f64>, FrameError> {
        Ok(optional_f64_column(df, name)?
            .map(|v| v.into_iter().map(|x| x.unwrap_or(f64::NAN)).collect())
            .unwrap_or_else(|| vec![f64::NAN; n]))
    };
    let opens = column_or_nan(schema::OPEN)?;
    let highs = column_or_nan(schema::HIGH)?;
    let lows = column_or_nan(schema::LOW)?;
    let closes = column_or_nan(schema::CLOSE)?;
    let adjusted = optional_f64_column(df, schema::ADJUSTED_CLOSE)?;

    let volumes: Vec<u64> = match df.column(schema::VOLUME) {
        Ok(column) => {
            let cast = column.cast(&DataType::UInt64)?;
            cast.u64()?.into_iter().map(|v| v.unwrap_or(0)).collect()
        }
        Err(_) => vec![0; n],
    };

    let bars = (0..n)
        .map(|i| PriceBar {
            timestamp: timestamps[i],
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            volume: volumes[i],
            adjusted_close: adjusted.as_ref().and_then(|a| a[i]),
        })
        .collect();
    Ok(bars)
}

/// Serialize a frame to Parquet bytes.
pub fn write_parquet(df: &DataFrame) -> Result<Vec<u8>, FrameError> {
    let mut buf: Vec<u8> = Vec::new();
    ParquetWriter::new(&mut buf)
        .finish(&mut df.clone())
        .map_err(|e| FrameError::Parquet(format!("write: {e}")))?;
    Ok(buf)
}

/// Deserialize Parquet bytes into a frame.
pub fn read_parquet(bytes: Vec<u8>) -> Result<DataFrame, FrameError> {
    ParquetReader::new(Cursor::new(bytes))
        .finish()
        .map_err(|e| FrameError::Parquet(format!("read: {e}")))
}

/// Left-join an indicator series onto a bar table by timestamp.
///
/// Rows without a matching point get a null. An existing column of the same
/// name is replaced. Row order of `df` is preserved.
pub fn join_series(df: DataFrame, name: &str, points: &[IndicatorPoint]) -> Result<DataFrame, FrameError> {
    let df = if df.get_column_names().iter().any(|c| c.as_str() == name) {
        df.drop(name)?
    } else {
        df
    };

    let millis: Vec<i64> = points.iter().map(|p| p.timestamp.timestamp_millis()).collect();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let right = DataFrame::new(vec![
        Column::new(schema::TIMESTAMP.into(), millis).cast(&timestamp_dtype())?,
        Column::new(name.into(), values),
    ])?;

    let left = df.lazy().with_column(col(schema::TIMESTAMP).cast(timestamp_dtype()));
    let joined = left
        .join(
            right.lazy(),
            [col(schema::TIMESTAMP)],
            [col(schema::TIMESTAMP)],
            JoinArgs::new(JoinType::Left),
        )
        .sort(
            [schema::TIMESTAMP],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    Ok(joined)
}
