//! Moving Average Convergence Divergence (MACD).
//!
//! macd = EMA(fast) - EMA(slow), signal = EMA(signal_period) of macd,
//! histogram = macd - signal. All three lines follow the EMA convention and
//! are defined from the first bar.

use std::ops::Range;

use super::ema::ema_of_series;
use super::indicator::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
}

/// Compute (macd, signal, histogram) for a close series.
pub fn macd_lines(closes: &[f64], fast: usize, slow: usize, signal: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let ema_fast = ema_of_series(closes, fast);
    let ema_slow = ema_of_series(closes, slow);
    let macd: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let sig = ema_of_series(&macd, signal);
    let hist: Vec<f64> = macd.iter().zip(&sig).map(|(m, s)| m - s).collect();
    (macd, sig, hist)
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        Self {
            fast,
            slow,
            signal,
            line,
        }
    }

    /// The three standard 12/26/9 lines.
    pub fn standard() -> [Self; 3] {
        [
            Self::new(12, 26, 9, MacdLine::Macd),
            Self::new(12, 26, 9, MacdLine::Signal),
            Self::new(12, 26, 9, MacdLine::Histogram),
        ]
    }

    /// Minimum batch length for MACD to be reported.
    pub fn min_bars(&self) -> usize {
        self.fast.max(self.slow).max(self.signal)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        match self.line {
            MacdLine::Macd => "macd_line",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_histogram",
        }
    }

    fn lookback(&self) -> usize {
        self.slow.saturating_sub(1)
    }

    fn is_recursive(&self) -> bool {
        true
    }

    fn compute_range(&self, bars: &[PriceBar], range: Range<usize>) -> Vec<f64> {
        let closes: Vec<f64> = bars[..range.end].iter().map(|b| b.close).collect();
        let (macd, sig, hist) = macd_lines(&closes, self.fast, self.slow, self.signal);
        let line = match self.line {
            MacdLine::Macd => macd,
            MacdLine::Signal => sig,
            MacdLine::Histogram => hist,
        };
        line[range].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn macd_starts_at_zero() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let (macd, sig, hist) = macd_lines(&closes, 12, 26, 9);
        assert_eq!(macd[0], 0.0);
        assert_eq!(sig[0], 0.0);
        assert_eq!(hist[0], 0.0);
        // Uptrend: fast EMA above slow EMA
        assert!(macd[29] > 0.0);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.3).cos() * 5.0).collect();
        let bars = make_bars(&closes);
        let [m, s, h] = Macd::standard();
        let (m, s, h) = (m.compute(&bars), s.compute(&bars), h.compute(&bars));
        for i in 0..40 {
            assert_approx(h[i], m[i] - s[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn macd_min_bars_is_slow_period() {
        assert_eq!(Macd::standard()[0].min_bars(), 26);
    }
}
