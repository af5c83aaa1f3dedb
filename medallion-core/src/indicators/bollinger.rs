//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + mult * stddev(close, period)
//! - Lower: middle - mult * stddev(close, period)
//!
//! Uses sample stddev (ddof = 1). Lookback: period - 1.

use std::ops::Range;

use super::indicator::Indicator;
use super::rolling::{window_mean, window_sample_std};
use crate::domain::PriceBar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: &'static str,
}

impl Bollinger {
    fn with_band(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2");
        let name = match band {
            BollingerBand::Upper => "bollinger_upper",
            BollingerBand::Middle => "bollinger_middle",
            BollingerBand::Lower => "bollinger_lower",
        };
        Self {
            period,
            multiplier,
            band,
            name,
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Upper)
    }

    pub fn middle(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Middle)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::with_band(period, multiplier, BollingerBand::Lower)
    }

    pub fn band(&self) -> BollingerBand {
        self.band
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute_range(&self, bars: &[PriceBar], range: Range<usize>) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        range
            .map(|i| {
                let mean = window_mean(&closes, i, self.period);
                if mean.is_nan() {
                    return f64::NAN;
                }
                match self.band {
                    BollingerBand::Middle => mean,
                    BollingerBand::Upper => {
                        mean + self.multiplier * window_sample_std(&closes, i, self.period)
                    }
                    BollingerBand::Lower => {
                        mean - self.multiplier * window_sample_std(&closes, i, self.period)
                    }
                }
            })
            .collect()
    }
}
