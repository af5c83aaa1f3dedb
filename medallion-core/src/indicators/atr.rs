//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is the trailing simple mean of `period` true ranges.
//! Lookback: period (TR at t reads close[t-1]).

use std::ops::Range;

use super::indicator::Indicator;
use super::rolling::window_mean;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let hl = bar.high - bar.low;
        if i == 0 {
            tr.push(hl);
            continue;
        }
        let pc = bars[i - 1].close;
        if bar.high.is_nan() || bar.low.is_nan() || pc.is_nan() {
            tr.push(f64::NAN);
        } else {
            tr.push(hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()));
        }
    }
    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute_range(&self, bars: &[PriceBar], range: Range<usize>) -> Vec<f64> {
        let tr = true_range(bars);
        range.map(|i| window_mean(&tr, i, self.period)).collect()
    }
}
