//! PriceBar, the unit of market data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single ticker at a single point in time (UTC).
///
/// `low <= open, close <= high` is expected from well-behaved sources but is
/// not enforced anywhere in the pipeline. Silver cleaning drops rows without
/// a usable `close` and the indicator engine rejects non-finite ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjusted_close: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
            adjusted_close: Some(103.0),
        }
    }

    #[test]
    fn bar_serializes_timestamp_as_rfc3339() {
        let json = serde_json::to_string(&sample_bar()).unwrap();
        assert!(json.contains("2024-01-02T00:00:00Z"), "{json}");
        let back: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_bar());
    }
}
