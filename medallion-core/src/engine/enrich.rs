//! Single-record enrichment for streaming consumers.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

/// A bar plus intraday derived fields.
///
/// The percentage fields are `None` when `open` is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    #[serde(flatten)]
    pub bar: PriceBar,
    /// `(close - open) / open * 100`
    pub daily_performance: Option<f64>,
    /// `high - low`
    pub range: f64,
    /// `range / open * 100`
    pub intraday_volatility: Option<f64>,
}

pub fn enrich_record(bar: &PriceBar) -> EnrichedBar {
    let range = bar.high - bar.low;
    let (daily_performance, intraday_volatility) = if bar.open != 0.0 {
        (
            Some((bar.close - bar.open) / bar.open * 100.0),
            Some(range / bar.open * 100.0),
        )
    } else {
        (None, None)
    };
    EnrichedBar {
        bar: bar.clone(),
        daily_performance,
        range,
        intraday_volatility,
    }
}
