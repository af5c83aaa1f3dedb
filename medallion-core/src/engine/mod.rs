//! Indicator engine: one contract, two interchangeable backends.
//!
//! Both backends run the same steps:
//! 1. `prepare`: canonical order (timestamp ascending, duplicates dropped) and
//!    validation of closes
//! 2. build the indicator plan for the batch size
//! 3. compute every planned series (sequentially, or partitioned on rayon)
//! 4. assemble the bundle together with statistics, volatility and trend
//!
//! Steps 1, 2 and 4 are shared, so the backends can only differ in how step 3
//! is scheduled. Windowed kernels sum each window independently, which keeps
//! the two outputs bit-identical.

pub mod bundle;
pub mod enrich;
pub mod parallel;
pub mod sequential;
pub mod stats;
pub mod trend;

pub use bundle::{to_points, BollingerSeries, IndicatorBundle, IndicatorPoint, MacdSeries};
pub use enrich::{enrich_record, EnrichedBar};
pub use parallel::ParallelEngine;
pub use sequential::SequentialEngine;
pub use stats::{compute_statistics, compute_volatility, Statistics, Volatility};
pub use trend::{detect_trend, Trend, TrendDirection};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{canonical_order, PriceBar};
use crate::indicators::{Bollinger, Ema, Indicator, IndicatorValues, Macd, Rsi, Sma};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("batch {batch_id} is empty")]
    EmptyBatch { batch_id: String },

    #[error("batch {batch_id}: bar {index} has a non-finite close ({close})")]
    MalformedBar {
        batch_id: String,
        index: usize,
        close: f64,
    },

    #[error("batch {batch_id}: {reason}")]
    Computation { batch_id: String, reason: String },
}

/// Indicator engine contract. Pure: no I/O.
pub trait IndicatorEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Compute the indicator bundle for one batch of bars (any order).
    fn compute(&self, batch_id: &str, bars: &[PriceBar]) -> Result<IndicatorBundle, EngineError>;
}

/// Which engine implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineBackend {
    #[default]
    Sequential,
    Parallel,
}

impl std::str::FromStr for EngineBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "parallel" => Ok(Self::Parallel),
            other => Err(format!("unknown engine backend '{other}'")),
        }
    }
}

impl std::fmt::Display for EngineBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// Construct the engine for `backend`. `partitions` only affects the parallel backend.
pub fn build_engine(backend: EngineBackend, partitions: usize) -> Box<dyn IndicatorEngine> {
    match backend {
        EngineBackend::Sequential => Box::new(SequentialEngine::new()),
        EngineBackend::Parallel => Box::new(ParallelEngine::new(partitions)),
    }
}

/// Put a batch into canonical order and reject batches no indicator can use.
pub fn prepare(batch_id: &str, bars: &[PriceBar]) -> Result<Vec<PriceBar>, EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptyBatch {
            batch_id: batch_id.to_string(),
        });
    }
    let ordered = canonical_order(bars.to_vec());
    if let Some((index, bar)) = ordered.iter().enumerate().find(|(_, b)| !b.close.is_finite()) {
        return Err(EngineError::MalformedBar {
            batch_id: batch_id.to_string(),
            index,
            close: bar.close,
        });
    }
    Ok(ordered)
}

const SERIES_SMA: [usize; 3] = [5, 20, 50];
const SERIES_EMA: [usize; 2] = [5, 20];
const RSI_PERIOD: usize = 14;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_K: f64 = 2.0;

/// Indicators a batch of `n` bars is large enough for.
pub fn indicator_plan(n: usize) -> Vec<Box<dyn Indicator>> {
    let mut plan: Vec<Box<dyn Indicator>> = Vec::new();
    for period in SERIES_SMA {
        if n >= period {
            plan.push(Box::new(Sma::new(period)));
        }
    }
    for period in SERIES_EMA {
        if n >= period {
            plan.push(Box::new(Ema::new(period)));
        }
    }
    if n > RSI_PERIOD {
        plan.push(Box::new(Rsi::new(RSI_PERIOD)));
    }
    if n >= BOLLINGER_PERIOD {
        plan.push(Box::new(Bollinger::upper(BOLLINGER_PERIOD, BOLLINGER_K)));
        plan.push(Box::new(Bollinger::middle(BOLLINGER_PERIOD, BOLLINGER_K)));
        plan.push(Box::new(Bollinger::lower(BOLLINGER_PERIOD, BOLLINGER_K)));
    }
    let [macd, signal, histogram] = Macd::standard();
    if n >= macd.min_bars() {
        plan.push(Box::new(macd));
        plan.push(Box::new(signal));
        plan.push(Box::new(histogram));
    }
    plan
}

/// Largest lookback in a plan: the overlap partitions must carry.
pub fn max_lookback(plan: &[Box<dyn Indicator>]) -> usize {
    plan.iter().map(|i| i.lookback()).max().unwrap_or(0)
}

/// Statistics, volatility and trend for a prepared batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub statistics: Statistics,
    pub volatility: Option<Volatility>,
    pub trends: Option<Trend>,
}

pub fn summarize(batch_id: &str, bars: &[PriceBar]) -> Result<Summary, EngineError> {
    let statistics = compute_statistics(bars).ok_or_else(|| EngineError::EmptyBatch {
        batch_id: batch_id.to_string(),
    })?;
    Ok(Summary {
        statistics,
        volatility: compute_volatility(bars),
        trends: detect_trend(bars),
    })
}

fn is_single_series(name: &str) -> bool {
    name.starts_with("sma_") || name.starts_with("ema_") || name.starts_with("rsi_")
}

/// Build the bundle from full-length series and the batch summary.
pub fn assemble(
    batch_id: &str,
    bars: &[PriceBar],
    values: &IndicatorValues,
    summary: Summary,
) -> IndicatorBundle {
    let points = |name: &str| values.get_series(name).map(|s| to_points(bars, s));

    let series: BTreeMap<String, Vec<IndicatorPoint>> = values
        .names()
        .into_iter()
        .filter(|n| is_single_series(n))
        .filter_map(|n| points(n).map(|p| (n.to_string(), p)))
        .collect();

    let bollinger_bands = match (
        points("bollinger_upper"),
        points("bollinger_middle"),
        points("bollinger_lower"),
    ) {
        (Some(upper), Some(middle), Some(lower)) => Some(BollingerSeries {
            upper,
            middle,
            lower,
        }),
        _ => None,
    };

    let macd = match (
        points("macd_line"),
        points("macd_signal"),
        points("macd_histogram"),
    ) {
        (Some(macd), Some(signal), Some(histogram)) => Some(MacdSeries {
            macd,
            signal,
            histogram,
        }),
        _ => None,
    };

    IndicatorBundle {
        batch_id: batch_id.to_string(),
        series,
        bollinger_bands,
        macd,
        statistics: summary.statistics,
        volatility: summary.volatility,
        trends: summary.trends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn plan_names(n: usize) -> Vec<String> {
        indicator_plan(n).iter().map(|i| i.name().to_string()).collect()
    }

    #[test]
    fn plan_grows_with_batch_size() {
        assert!(plan_names(4).is_empty());
        assert_eq!(plan_names(5), vec!["sma_5", "ema_5"]);
        assert!(!plan_names(14).contains(&"rsi_14".to_string()));
        assert!(plan_names(15).contains(&"rsi_14".to_string()));
        assert!(plan_names(20).contains(&"bollinger_middle".to_string()));
        assert!(!plan_names(25).contains(&"macd_line".to_string()));
        assert!(plan_names(26).contains(&"macd_histogram".to_string()));
        assert!(plan_names(50).contains(&"sma_50".to_string()));
    }

    #[test]
    fn max_lookback_of_full_plan() {
        // sma_50 dominates
        assert_eq!(max_lookback(&indicator_plan(60)), 49);
        assert_eq!(max_lookback(&indicator_plan(0)), 0);
    }

    #[test]
    fn prepare_rejects_empty_and_non_finite() {
        assert!(matches!(prepare("b", &[]), Err(EngineError::EmptyBatch { .. })));
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[1].close = f64::INFINITY;
        assert!(matches!(
            prepare("b", &bars),
            Err(EngineError::MalformedBar { index: 1, .. })
        ));
    }

    #[test]
    fn prepare_sorts_and_dedupes() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars.reverse();
        let dup = bars[0].clone();
        bars.push(dup);
        let ordered = prepare("b", &bars).unwrap();
        let closes: Vec<f64> = ordered.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn backend_parses_and_displays() {
        assert_eq!("parallel".parse::<EngineBackend>().unwrap(), EngineBackend::Parallel);
        assert_eq!(EngineBackend::Sequential.to_string(), "sequential");
        assert!("gpu".parse::<EngineBackend>().is_err());
    }
}
