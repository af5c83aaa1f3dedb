//! Relative Strength Index (RSI).
//!
//! Simple trailing means of gains and losses over `period` close-to-close
//! changes. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period (first value at index period, i.e. the 15th bar for RSI(14)).
//! avg_loss == 0 → RSI = 100.

use std::ops::Range;

use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    fn value_at(&self, bars: &[PriceBar], i: usize) -> f64 {
        if i < self.period || i >= bars.len() {
            return f64::NAN;
        }
        let mut gain = 0.0;
        let mut loss = 0.0;
        for t in (i + 1 - self.period)..=i {
            let change = bars[t].close - bars[t - 1].close;
            if change.is_nan() {
                return f64::NAN;
            }
            if change > 0.0 {
                gain += change;
            } else {
                loss -= change;
            }
        }
        let avg_gain = gain / self.period as f64;
        let avg_loss = loss / self.period as f64;
        compute_rsi(avg_gain, avg_loss)
    }
}

/// RSI from average gain and loss.
fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute_range(&self, bars: &[PriceBar], range: Range<usize>) -> Vec<f64> {
        range.map(|i| self.value_at(bars, i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_first_value_on_fifteenth_bar() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + ((i * 7) % 5) as f64).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        assert!(result[13].is_nan());
        assert!(!result[14].is_nan());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + i as f64).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        assert_approx(result[14], 100.0, DEFAULT_EPSILON);
        assert_approx(result[15], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 - i as f64).collect();
        let result = Rsi::new(14).compute(&make_bars(&closes));
        assert_approx(result[14], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_constant_close_is_100() {
        let result = Rsi::new(14).compute(&make_bars(&[42.0; 20]));
        assert!(result[14..].iter().all(|v| *v == 100.0));
    }

    #[test]
    fn rsi_period_2_hand_computed() {
        // changes: +2, -1, +3 → window at i=2: gains 2, losses 1 → rs 2 → 66.666..
        let result = Rsi::new(2).compute(&make_bars(&[10.0, 12.0, 11.0, 14.0]));
        assert!(result[1].is_nan());
        assert_approx(result[2], 100.0 - 100.0 / 3.0, DEFAULT_EPSILON);
        // i=3: gains 3, losses 1 → rs 3 → 75
        assert_approx(result[3], 75.0, DEFAULT_EPSILON);
    }
}
