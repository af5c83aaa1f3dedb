//! Gold summary statistics.

use serde::{Deserialize, Serialize};

use medallion_core::domain::PriceBar;
use medallion_core::engine::stats::TRADING_DAYS_PER_YEAR;
use medallion_core::engine::{
    compute_statistics, compute_volatility, detect_trend, Statistics, Trend, TrendDirection,
    Volatility,
};
use medallion_core::indicators::rolling::{mean, median, pct_changes, sample_std};

/// Daily close-to-close returns, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    pub min_daily_return: f64,
    pub max_daily_return: f64,
    pub mean_daily_return: f64,
    pub volatility: Option<f64>,
    pub annualized_volatility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub median: f64,
    pub std: Option<f64>,
}

/// Position of the last close against the Silver `sma_20` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTrend {
    pub direction: TrendDirection,
    /// `|close - sma_20| / sma_20`, in percent.
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldStatistics {
    pub ticker: String,
    #[serde(flatten)]
    pub statistics: Statistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_return_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_stats: Option<ReturnStats>,
    pub volume_stats: VolumeStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<Volatility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_trend: Option<CurrentTrend>,
}

fn return_stats(closes: &[f64]) -> Option<ReturnStats> {
    let returns: Vec<f64> = pct_changes(closes).into_iter().map(|r| r * 100.0).collect();
    let volatility = sample_std(&returns);
    Some(ReturnStats {
        min_daily_return: returns.iter().copied().reduce(f64::min)?,
        max_daily_return: returns.iter().copied().reduce(f64::max)?,
        mean_daily_return: mean(&returns)?,
        volatility,
        annualized_volatility: volatility.map(|v| v * TRADING_DAYS_PER_YEAR.sqrt()),
    })
}

fn volume_stats(bars: &[PriceBar]) -> Option<VolumeStats> {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    Some(VolumeStats {
        min: bars.iter().map(|b| b.volume).min()?,
        max: bars.iter().map(|b| b.volume).max()?,
        mean: mean(&volumes)?,
        median: median(&volumes)?,
        std: sample_std(&volumes),
    })
}

fn current_trend(close: f64, sma_20: Option<f64>) -> Option<CurrentTrend> {
    let sma = sma_20.filter(|s| s.is_finite() && *s != 0.0)?;
    let direction = if close > sma {
        TrendDirection::Bullish
    } else {
        TrendDirection::Bearish
    };
    let strength = ((close - sma) / sma).abs() * 100.0;
    strength.is_finite().then_some(CurrentTrend { direction, strength })
}

/// Summary of an ordered, deduplicated bar history.
///
/// `last_sma_20` is the Silver `sma_20` value on the last row, if any.
pub fn gold_statistics(
    ticker: &str,
    bars: &[PriceBar],
    last_sma_20: Option<f64>,
) -> Option<GoldStatistics> {
    let statistics = compute_statistics(bars)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let last_close = *closes.last()?;

    Some(GoldStatistics {
        ticker: ticker.to_string(),
        total_return_pct: statistics.total_return.map(|r| r * 100.0),
        statistics,
        return_stats: return_stats(&closes),
        volume_stats: volume_stats(bars)?,
        volatility: compute_volatility(bars),
        trend: detect_trend(bars),
        current_trend: current_trend(last_close, last_sma_20),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                timestamp: start + Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 100 * (i as u64 + 1),
                adjusted_close: None,
            })
            .collect()
    }

    #[test]
    fn three_bar_summary() {
        let s = gold_statistics("TEST", &bars(&[10.0, 12.0, 11.0]), None).unwrap();
        assert_eq!(s.statistics.min_price, 10.0);
        assert_eq!(s.statistics.max_price, 12.0);
        assert!((s.total_return_pct.unwrap() - 10.0).abs() < 1e-9);

        let r = s.return_stats.unwrap();
        assert!((r.max_daily_return - 20.0).abs() < 1e-9);
        assert!((r.min_daily_return - (-100.0 / 12.0)).abs() < 1e-9);
        assert_eq!(s.volume_stats.min, 100);
        assert_eq!(s.volume_stats.max, 300);
        assert_eq!(s.volume_stats.median, 200.0);
        assert!(s.trend.is_none());
        assert!(s.current_trend.is_none());
    }

    #[test]
    fn single_bar_has_no_returns() {
        let s = gold_statistics("ONE", &bars(&[5.0]), None).unwrap();
        assert!(s.return_stats.is_none());
        assert!(s.total_return_pct.is_none());
        assert!(s.volatility.is_none());
        assert!(gold_statistics("NONE", &[], None).is_none());
    }

    #[test]
    fn current_trend_from_sma_20() {
        let s = gold_statistics("T", &bars(&[10.0, 11.0]), Some(10.0)).unwrap();
        let t = s.current_trend.unwrap();
        assert_eq!(t.direction, TrendDirection::Bullish);
        assert!((t.strength - 10.0).abs() < 1e-9);

        let s = gold_statistics("T", &bars(&[10.0, 9.0]), Some(10.0)).unwrap();
        assert_eq!(s.current_trend.unwrap().direction, TrendDirection::Bearish);
    }

    #[test]
    fn zero_priced_history_reads_back() {
        let s = gold_statistics("ZERO", &bars(&[0.0; 25]), Some(0.0)).unwrap();
        assert!(s.current_trend.is_none());
        assert_eq!(s.trend.as_ref().unwrap().strength, None);

        let json = serde_json::to_string(&s).unwrap();
        let back: GoldStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.trend, s.trend);
        assert_eq!(back.statistics.max_price, 0.0);
    }

    #[test]
    fn json_flattens_statistics() {
        let s = gold_statistics("TEST", &bars(&[10.0, 12.0, 11.0]), None).unwrap();
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["min_price"], 10.0);
        assert_eq!(v["max_price"], 12.0);
        assert_eq!(v["ticker"], "TEST");
        assert!(v.get("current_trend").is_none());
        let back: GoldStatistics = serde_json::from_value(v).unwrap();
        assert_eq!(back.statistics.trading_days, 3);
        assert_eq!(back.volume_stats, s.volume_stats);
    }
}
