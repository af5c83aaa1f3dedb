//! Monthly rollup of a ticker's bars.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use polars::prelude::*;

use medallion_core::data::frame::timestamp_dtype;
use medallion_core::domain::PriceBar;
use medallion_core::indicators::rolling::{mean, sample_std};

/// Months averaged by `ma_3m`.
pub const MA_MONTHS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    /// `YYYY-MM`
    pub year_month: String,
    /// First bar of the month.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Close-to-close change against the previous month, in percent.
    pub monthly_return: Option<f64>,
    pub ma_3m: Option<f64>,
    /// Sample std of the daily closes within the month.
    pub volatility: Option<f64>,
}

/// Roll `bars` (timestamp ascending) up into one row per calendar month.
pub fn monthly_rollup(bars: &[PriceBar]) -> Vec<MonthlyRow> {
    let mut months: BTreeMap<String, Vec<&PriceBar>> = BTreeMap::new();
    for bar in bars {
        months
            .entry(bar.timestamp.format("%Y-%m").to_string())
            .or_default()
            .push(bar);
    }

    let mut rows: Vec<MonthlyRow> = Vec::with_capacity(months.len());
    for (year_month, month) in months {
        let (Some(first), Some(last)) = (month.first(), month.last()) else {
            continue;
        };
        let closes: Vec<f64> = month.iter().map(|b| b.close).collect();
        rows.push(MonthlyRow {
            year_month,
            timestamp: first.timestamp,
            open: first.open,
            high: month.iter().map(|b| b.high).fold(f64::NAN, f64::max),
            low: month.iter().map(|b| b.low).fold(f64::NAN, f64::min),
            close: last.close,
            volume: month.iter().map(|b| b.volume).sum(),
            monthly_return: None,
            ma_3m: None,
            volatility: sample_std(&closes),
        });
    }

    let closes: Vec<f64> = rows.iter().map(|r| r.close).collect();
    for (i, row) in rows.iter_mut().enumerate() {
        if i > 0 && closes[i - 1] != 0.0 {
            row.monthly_return = Some((closes[i] - closes[i - 1]) / closes[i - 1] * 100.0);
        }
        if i + 1 >= MA_MONTHS {
            row.ma_3m = mean(&closes[i + 1 - MA_MONTHS..=i]);
        }
    }
    rows
}

/// Rollup rows as a Parquet-ready table.
pub fn monthly_frame(rows: &[MonthlyRow]) -> PolarsResult<DataFrame> {
    let col_f64 = |name: &str, f: &dyn Fn(&MonthlyRow) -> f64| {
        Column::new(name.into(), rows.iter().map(f).collect::<Vec<f64>>())
    };
    let col_opt = |name: &str, f: &dyn Fn(&MonthlyRow) -> Option<f64>| {
        Column::new(name.into(), rows.iter().map(f).collect::<Vec<Option<f64>>>())
    };

    DataFrame::new(vec![
        Column::new(
            "year_month".into(),
            rows.iter().map(|r| r.year_month.clone()).collect::<Vec<String>>(),
        ),
        Column::new(
            "timestamp".into(),
            rows.iter()
                .map(|r| r.timestamp.timestamp_millis())
                .collect::<Vec<i64>>(),
        )
        .cast(&timestamp_dtype())?,
        col_f64("open", &|r| r.open),
        col_f64("high", &|r| r.high),
        col_f64("low", &|r| r.low),
        col_f64("close", &|r| r.close),
        Column::new("volume".into(), rows.iter().map(|r| r.volume).collect::<Vec<u64>>()),
        col_opt("monthly_return", &|r| r.monthly_return),
        col_opt("ma_3m", &|r| r.ma_3m),
        col_opt("volatility", &|r| r.volatility),
    ])
}
