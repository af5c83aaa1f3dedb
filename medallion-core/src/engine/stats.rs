//! Batch statistics and volatility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::indicators::rolling::{mean, median, pct_changes, sample_std};
use crate::indicators::{Atr, Indicator};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const ATR_PERIOD: usize = 14;

/// Descriptive statistics of a batch. Callers guarantee a non-empty batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Calendar days between first and last bar.
    pub days: i64,
    pub trading_days: usize,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    pub median_price: f64,
    pub std_price: Option<f64>,
    pub min_volume: u64,
    pub max_volume: u64,
    pub avg_volume: f64,
    pub avg_daily_return: Option<f64>,
    pub std_daily_return: Option<f64>,
    /// `(last - first) / first` as a fraction.
    pub total_return: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volatility {
    /// Sample std of simple daily returns.
    pub daily: Option<f64>,
    pub annualized: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr_14: Option<f64>,
}

pub(crate) fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Compute statistics for a non-empty, ordered batch. `None` when empty.
pub fn compute_statistics(bars: &[PriceBar]) -> Option<Statistics> {
    let first = bars.first()?;
    let last = bars.last()?;
    let closes = closes(bars);
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let returns = pct_changes(&closes);

    let total_return = if bars.len() > 1 && first.close != 0.0 {
        Some((last.close - first.close) / first.close)
    } else {
        None
    };

    Some(Statistics {
        start_date: first.timestamp,
        end_date: last.timestamp,
        days: (last.timestamp - first.timestamp).num_days(),
        trading_days: bars.len(),
        min_price: closes.iter().copied().fold(f64::INFINITY, f64::min),
        max_price: closes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg_price: mean(&closes)?,
        median_price: median(&closes)?,
        std_price: sample_std(&closes),
        min_volume: bars.iter().map(|b| b.volume).min()?,
        max_volume: bars.iter().map(|b| b.volume).max()?,
        avg_volume: mean(&volumes)?,
        avg_daily_return: mean(&returns),
        std_daily_return: sample_std(&returns),
        total_return,
    })
}

/// Volatility for batches of at least two bars.
pub fn compute_volatility(bars: &[PriceBar]) -> Option<Volatility> {
    if bars.len() < 2 {
        return None;
    }
    let returns = pct_changes(&closes(bars));
    let daily = sample_std(&returns);
    let atr_14 = if bars.len() >= ATR_PERIOD {
        Atr::new(ATR_PERIOD)
            .compute(bars)
            .last()
            .copied()
            .filter(|v| v.is_finite())
    } else {
        None
    };
    Some(Volatility {
        daily,
        annualized: daily.map(|d| d * TRADING_DAYS_PER_YEAR.sqrt()),
        atr_14,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn statistics_three_bars() {
        let bars = make_bars(&[10.0, 12.0, 11.0]);
        let s = compute_statistics(&bars).unwrap();
        assert_eq!(s.min_price, 10.0);
        assert_eq!(s.max_price, 12.0);
        assert_approx(s.avg_price, 11.0, DEFAULT_EPSILON);
        assert_eq!(s.median_price, 11.0);
        assert_approx(s.total_return.unwrap(), 0.1, DEFAULT_EPSILON);
        assert_eq!(s.days, 2);
        assert_eq!(s.trading_days, 3);
        assert_eq!(s.min_volume, 1000);
        // returns: +0.2, -1/12
        assert_approx(s.avg_daily_return.unwrap(), (0.2 - 1.0 / 12.0) / 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn statistics_single_bar() {
        let s = compute_statistics(&make_bars(&[5.0])).unwrap();
        assert_eq!(s.total_return, None);
        assert_eq!(s.std_price, None);
        assert_eq!(s.days, 0);
    }

    #[test]
    fn statistics_empty_is_none() {
        assert!(compute_statistics(&[]).is_none());
    }

    #[test]
    fn volatility_needs_two_bars() {
        assert!(compute_volatility(&make_bars(&[5.0])).is_none());
        let v = compute_volatility(&make_bars(&[5.0, 6.0])).unwrap();
        // one return: std undefined
        assert_eq!(v.daily, None);
        assert_eq!(v.atr_14, None);
    }

    #[test]
    fn volatility_annualizes_daily() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let v = compute_volatility(&make_bars(&closes)).unwrap();
        let daily = v.daily.unwrap();
        assert_approx(v.annualized.unwrap(), daily * 252f64.sqrt(), DEFAULT_EPSILON);
        assert!(v.atr_14.is_some());
    }
}
