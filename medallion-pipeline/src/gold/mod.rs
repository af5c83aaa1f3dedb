//! Gold stage: aggregate a ticker's Silver history into analytics objects.
//!
//! Inputs are read independently; an input that cannot be fetched or parsed
//! is skipped with a warning. Rows from all readable inputs are ordered by
//! timestamp and deduplicated on it, the latest input winning.

pub mod monthly;
pub mod summary;

pub use monthly::{monthly_frame, monthly_rollup, MonthlyRow};
pub use summary::{gold_statistics, CurrentTrend, GoldStatistics, ReturnStats, VolumeStats};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use medallion_core::data::{
    frame_to_bars, optional_f64_column, read_parquet, write_parquet, FrameError,
};
use medallion_core::domain::PriceBar;
use medallion_core::observability::Observability;
use medallion_core::storage::keys::{gold_monthly_key, gold_stats_key, validate_segment};
use medallion_core::storage::ObjectStore;

use crate::error::PipelineError;

/// Column reused for `current_trend`.
const SMA_20: &str = "sma_20";

/// Keys written by one aggregation. Either output may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoldKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<String>,
}

/// One row of the combined history.
#[derive(Debug, Clone)]
struct Row {
    bar: PriceBar,
    sma_20: Option<f64>,
}

#[derive(Clone)]
pub struct GoldAggregator {
    store: Arc<dyn ObjectStore>,
    obs: Arc<dyn Observability>,
}

impl GoldAggregator {
    pub fn new(store: Arc<dyn ObjectStore>, obs: Arc<dyn Observability>) -> Self {
        Self { store, obs }
    }

    pub fn aggregate(&self, ticker: &str, input_keys: &[String]) -> Result<GoldKeys, PipelineError> {
        self.aggregate_at(ticker, input_keys, Utc::now())
    }

    /// Aggregate `input_keys`, naming outputs after the date of `now`.
    pub fn aggregate_at(
        &self,
        ticker: &str,
        input_keys: &[String],
        now: DateTime<Utc>,
    ) -> Result<GoldKeys, PipelineError> {
        self.obs.log_event(
            "gold_layer_aggregate_started",
            json!({ "ticker": ticker, "silver_keys_count": input_keys.len() }),
        );

        match self.run(ticker, input_keys, now) {
            Ok((keys, months)) => {
                info!(ticker, months, monthly = ?keys.monthly, statistics = ?keys.statistics, "gold objects written");
                self.obs.log_event(
                    "gold_layer_aggregate_completed",
                    json!({
                        "ticker": ticker,
                        "silver_keys_count": input_keys.len(),
                        "gold_keys": keys,
                    }),
                );
                self.obs
                    .track_metric("gold_months_aggregated", months as f64, &[("ticker", ticker)]);
                Ok(keys)
            }
            Err(e) => {
                error!(ticker, error = %e, "gold aggregation failed");
                self.obs.log_event(
                    "gold_layer_aggregate_failed",
                    json!({ "ticker": ticker, "error": e.to_string() }),
                );
                Err(e)
            }
        }
    }

    fn read_rows(&self, key: &str) -> Result<Vec<Row>, PipelineError> {
        let df = read_parquet(self.store.get(key)?)?;
        let bars = frame_to_bars(&df)?;
        let sma = optional_f64_column(&df, SMA_20)?;
        Ok(bars
            .into_iter()
            .enumerate()
            .map(|(i, bar)| Row {
                bar,
                sma_20: sma.as_ref().and_then(|s| s[i]),
            })
            .collect())
    }

    fn run(
        &self,
        ticker: &str,
        input_keys: &[String],
        now: DateTime<Utc>,
    ) -> Result<(GoldKeys, usize), PipelineError> {
        validate_segment("ticker", ticker)?;

        let mut rows: Vec<Row> = Vec::new();
        let mut readable = 0usize;
        for key in input_keys {
            match self.read_rows(key) {
                Ok(r) => {
                    readable += 1;
                    rows.extend(r);
                }
                Err(e) => warn!(ticker, key = %key, error = %e, "skipping unreadable input"),
            }
        }
        if readable == 0 {
            return Err(PipelineError::NoReadableInput {
                ticker: ticker.to_string(),
                attempted: input_keys.len(),
            });
        }

        let rows = combine(rows);
        let bars: Vec<PriceBar> = rows.iter().map(|r| r.bar.clone()).collect();
        let date = now.date_naive();
        let mut keys = GoldKeys::default();

        let months = monthly_rollup(&bars);
        if !months.is_empty() {
            let frame = monthly_frame(&months).map_err(FrameError::from)?;
            let key = gold_monthly_key(ticker, date);
            self.store.put(&key, write_parquet(&frame)?)?;
            keys.monthly = Some(key);
        }

        let last_sma = rows.last().and_then(|r| r.sma_20);
        if let Some(stats) = gold_statistics(ticker, &bars, last_sma) {
            let key = gold_stats_key(ticker, date);
            self.store.put(&key, serde_json::to_vec_pretty(&stats)?)?;
            keys.statistics = Some(key);
        }

        Ok((keys, months.len()))
    }
}

/// Order by timestamp, keep the last row per timestamp, drop rows whose close
/// is not a number.
fn combine(mut rows: Vec<Row>) -> Vec<Row> {
    rows.retain(|r| r.bar.close.is_finite());
    rows.sort_by_key(|r| r.bar.timestamp);
    let mut out: Vec<Row> = Vec::with_capacity(rows.len());
    for row in rows {
        match out.last_mut() {
            Some(prev) if prev.bar.timestamp == row.bar.timestamp => *prev = row,
            _ => out.push(row),
        }
    }
    out
}
