//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(n+1).
//! Seed: EMA[0] = close[0]. Values are emitted from the first bar, so there is
//! no warm-up gap (unlike SMA/RSI/Bollinger).

use std::ops::Range;

use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

/// EMA of an arbitrary series, seeded by its first value.
///
/// NaN inputs poison every later value.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        result.push(next);
        prev = Some(next);
    }
    result
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn is_recursive(&self) -> bool {
        true
    }

    fn compute_range(&self, bars: &[PriceBar], range: Range<usize>) -> Vec<f64> {
        let closes: Vec<f64> = bars[..range.end].iter().map(|b| b.close).collect();
        let full = ema_of_series(&closes, self.period);
        full[range].to_vec()
    }
}
