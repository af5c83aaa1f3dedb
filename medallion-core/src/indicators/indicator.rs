//! Indicator trait and precomputed indicator values container.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! Output is aligned to the input bars; positions without a defined value
//! hold `f64::NAN` and are dropped when the series is published.

use crate::domain::PriceBar;
use std::collections::HashMap;
use std::ops::Range;

/// Trait for indicators.
///
/// # Windowed vs recursive
/// A windowed indicator's value at bar t depends only on bars
/// `[t - lookback(), t]`. Such indicators can be computed over any
/// time-contiguous slice of the batch as long as the slice carries
/// `lookback()` bars of context in front of the requested range.
///
/// A recursive indicator (EMA family) depends on every bar since the start of
/// the batch and must always be computed over the full batch.
pub trait Indicator: Send + Sync {
    /// Series name as published in the bundle (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars before t that the value at t may read.
    fn lookback(&self) -> usize;

    /// True if the value at t depends on the whole prefix of the batch.
    fn is_recursive(&self) -> bool {
        false
    }

    /// Compute the indicator for `range` of `bars`.
    ///
    /// Returns `range.len()` values; element `j` belongs to bar `range.start + j`.
    /// Windowed implementations only read `bars[range.start - lookback ..range.end]`.
    fn compute_range(&self, bars: &[PriceBar], range: Range<usize>) -> Vec<f64>;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        self.compute_range(bars, 0..bars.len())
    }
}

/// Container for full-length indicator series keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific bar index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Names of all stored series, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.series.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Compute every indicator over the full batch, in order.
pub fn precompute_indicators(bars: &[PriceBar], indicators: &[Box<dyn Indicator>]) -> IndicatorValues {
    let mut values = IndicatorValues::new();
    for indicator in indicators {
        let series = indicator.compute(bars);
        debug_assert_eq!(
            series.len(),
            bars.len(),
            "indicator '{}' produced {} values for {} bars",
            indicator.name(),
            series.len(),
            bars.len()
        );
        values.insert(indicator.name(), series);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, Ema, Sma};

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert(
            "sma_20",
            vec![f64::NAN; 19]
                .into_iter()
                .chain(vec![100.0, 101.0])
                .collect(),
        );
        assert!(iv.get("sma_20", 0).unwrap().is_nan());
        assert_eq!(iv.get("sma_20", 19), Some(100.0));
        assert_eq!(iv.get("sma_20", 20), Some(101.0));
        assert_eq!(iv.get("sma_20", 21), None); // out of bounds
    }

    #[test]
    fn indicator_values_missing_name() {
        let iv = IndicatorValues::new();
        assert_eq!(iv.get("nonexistent", 0), None);
    }

    #[test]
    fn precompute_multiple_indicators() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let indicators: Vec<Box<dyn Indicator>> = vec![Box::new(Sma::new(3)), Box::new(Ema::new(3))];
        let values = precompute_indicators(&bars, &indicators);

        assert_eq!(values.len(), 2);
        assert_eq!(values.names(), vec!["ema_3", "sma_3"]);
        assert!(values.get("sma_3", 1).unwrap().is_nan());
        assert!((values.get("sma_3", 2).unwrap() - 11.0).abs() < 1e-10);
        // EMA has no warm-up: first value is the first close
        assert_eq!(values.get("ema_3", 0), Some(10.0));
    }

    #[test]
    fn compute_range_matches_full_compute_slice() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let sma = Sma::new(3);
        let full = sma.compute(&bars);
        let part = sma.compute_range(&bars, 4..7);
        assert_eq!(part.as_slice(), &full[4..7]);
    }
}
