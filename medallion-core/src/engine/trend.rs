//! Trend classification and support/resistance levels.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::indicators::rolling::window_mean;
use crate::indicators::{find_pivots, last_levels, PivotKind};

use super::stats::closes;

pub const TREND_MIN_BARS: usize = 20;
pub const PIVOT_MIN_BARS: usize = 30;
pub const PIVOT_WINDOW: usize = 5;
pub const LEVELS_REPORTED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Sideways,
}

impl TrendDirection {
    /// Classify the last close against a short SMA and, if available, a long one.
    ///
    /// With both: bullish needs close > short > long, bearish close < short < long.
    /// With only the short SMA: a plain above/below comparison.
    pub fn classify(close: f64, sma_short: f64, sma_long: Option<f64>) -> Self {
        match sma_long {
            Some(long) => {
                if close > sma_short && sma_short > long {
                    Self::Bullish
                } else if close < sma_short && sma_short < long {
                    Self::Bearish
                } else {
                    Self::Sideways
                }
            }
            None => {
                if close > sma_short {
                    Self::Bullish
                } else if close < sma_short {
                    Self::Bearish
                } else {
                    Self::Sideways
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub current: TrendDirection,
    /// `|close - sma| / sma` against the longest SMA in use. Absent when that
    /// SMA is zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub support_levels: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resistance_levels: Vec<f64>,
}

/// Trend for batches of at least 20 bars.
pub fn detect_trend(bars: &[PriceBar]) -> Option<Trend> {
    if bars.len() < TREND_MIN_BARS {
        return None;
    }
    let closes = closes(bars);
    let last = closes.len() - 1;
    let close = closes[last];
    let sma20 = window_mean(&closes, last, 20);
    let sma50 = if closes.len() >= 50 {
        Some(window_mean(&closes, last, 50))
    } else {
        None
    };

    let current = TrendDirection::classify(close, sma20, sma50);
    let reference = sma50.unwrap_or(sma20);
    let strength = Some((close - reference).abs() / reference).filter(|s| s.is_finite());

    let (support_levels, resistance_levels) = if closes.len() >= PIVOT_MIN_BARS {
        let pivots = find_pivots(&closes, PIVOT_WINDOW);
        (
            last_levels(&pivots, PivotKind::Low, LEVELS_REPORTED),
            last_levels(&pivots, PivotKind::High, LEVELS_REPORTED),
        )
    } else {
        (Vec::new(), Vec::new())
    };

    Some(Trend {
        current,
        strength,
        support_levels,
        resistance_levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn classify_with_long_sma() {
        assert_eq!(TrendDirection::classify(110.0, 105.0, Some(100.0)), TrendDirection::Bullish);
        assert_eq!(TrendDirection::classify(90.0, 95.0, Some(100.0)), TrendDirection::Bearish);
        // above short but short below long
        assert_eq!(TrendDirection::classify(110.0, 95.0, Some(100.0)), TrendDirection::Sideways);
    }

    #[test]
    fn classify_short_only() {
        assert_eq!(TrendDirection::classify(10.0, 9.0, None), TrendDirection::Bullish);
        assert_eq!(TrendDirection::classify(10.0, 10.0, None), TrendDirection::Sideways);
    }

    #[test]
    fn rising_series_is_bullish() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let trend = detect_trend(&make_bars(&closes)).unwrap();
        assert_eq!(trend.current, TrendDirection::Bullish);
        // sma20 of 105..=124 is 114.5, close 124
        assert_approx(trend.strength.unwrap(), 9.5 / 114.5, DEFAULT_EPSILON);
        assert!(trend.support_levels.is_empty());
    }

    #[test]
    fn short_batch_has_no_trend() {
        assert!(detect_trend(&make_bars(&[1.0; 19])).is_none());
    }

    #[test]
    fn zero_priced_series_has_no_strength() {
        let trend = detect_trend(&make_bars(&[0.0; 25])).unwrap();
        assert_eq!(trend.current, TrendDirection::Sideways);
        assert_eq!(trend.strength, None);

        let json = serde_json::to_string(&trend).unwrap();
        assert!(!json.contains("null"));
        let back: Trend = serde_json::from_str(&json).unwrap();
        assert_eq!(back, trend);
    }

    #[test]
    fn oscillating_series_reports_levels() {
        // period-12 triangle wave: peaks at 6, troughs at 0
        let closes: Vec<f64> = (0..60)
            .map(|i| {
                let p = i % 12;
                100.0 + if p <= 6 { p as f64 } else { (12 - p) as f64 }
            })
            .collect();
        let trend = detect_trend(&make_bars(&closes)).unwrap();
        assert_eq!(trend.resistance_levels, vec![106.0, 106.0, 106.0]);
        assert_eq!(trend.support_levels, vec![100.0, 100.0, 100.0]);
    }
}
