//! Indicator bundle: the engine's output for one batch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stats::{Statistics, Volatility};
use super::trend::Trend;
use crate::domain::PriceBar;

/// One defined value of an indicator series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Pair aligned values with bar timestamps, dropping undefined (non-finite) ones.
pub fn to_points(bars: &[PriceBar], values: &[f64]) -> Vec<IndicatorPoint> {
    bars.iter()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .map(|(b, &value)| IndicatorPoint {
            timestamp: b.timestamp,
            value,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerSeries {
    pub upper: Vec<IndicatorPoint>,
    pub middle: Vec<IndicatorPoint>,
    pub lower: Vec<IndicatorPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<IndicatorPoint>,
    pub signal: Vec<IndicatorPoint>,
    pub histogram: Vec<IndicatorPoint>,
}

/// Everything the engine derives from one batch.
///
/// Single-valued series (`sma_*`, `ema_*`, `rsi_14`) live in `series` and are
/// flattened to top-level keys when serialized. Anything the batch was too
/// small for is simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBundle {
    pub batch_id: String,
    #[serde(flatten)]
    pub series: BTreeMap<String, Vec<IndicatorPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bollinger_bands: Option<BollingerSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdSeries>,
    pub statistics: Statistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<Volatility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trends: Option<Trend>,
}

impl IndicatorBundle {
    pub fn series(&self, name: &str) -> Option<&[IndicatorPoint]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Names of the single-valued series, which Silver joins onto the bar table.
    pub fn series_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }
}
