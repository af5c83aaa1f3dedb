//! Silver stage: clean one Bronze object, compute indicators, merge them back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use medallion_core::data::{frame_to_bars, join_series, read_parquet, write_parquet, Canonicalizer};
use medallion_core::engine::{IndicatorBundle, IndicatorEngine};
use medallion_core::observability::Observability;
use medallion_core::storage::keys::{silver_indicators_key, silver_key, validate_segment};
use medallion_core::storage::ObjectStore;

use crate::error::PipelineError;

/// Keys and counts produced by one Silver run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SilverOutput {
    pub key: String,
    pub indicators_key: String,
    pub rows: usize,
    pub indicators: usize,
}

#[derive(Clone)]
pub struct SilverProcessor {
    store: Arc<dyn ObjectStore>,
    obs: Arc<dyn Observability>,
    engine: Arc<dyn IndicatorEngine>,
    data_type: String,
}

impl SilverProcessor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        obs: Arc<dyn Observability>,
        engine: Arc<dyn IndicatorEngine>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            store,
            obs,
            engine,
            data_type: data_type.into(),
        }
    }

    pub fn process(&self, ticker: &str, bronze_key: &str) -> Result<SilverOutput, PipelineError> {
        self.process_at(ticker, bronze_key, Utc::now())
    }

    /// Process `bronze_key`, naming outputs after the date of `now`.
    ///
    /// Re-running on the same day replaces that day's Silver objects.
    pub fn process_at(
        &self,
        ticker: &str,
        bronze_key: &str,
        now: DateTime<Utc>,
    ) -> Result<SilverOutput, PipelineError> {
        self.obs.log_event(
            "silver_layer_process_started",
            json!({ "ticker": ticker, "bronze_key": bronze_key }),
        );

        match self.run(ticker, bronze_key, now) {
            Ok(out) => {
                info!(ticker, key = %out.key, rows = out.rows, indicators = out.indicators, "silver object written");
                self.obs.log_event(
                    "silver_layer_process_completed",
                    json!({
                        "ticker": ticker,
                        "bronze_key": bronze_key,
                        "silver_key": out.key,
                        "rows": out.rows,
                        "indicators_calculated": out.indicators,
                    }),
                );
                self.obs
                    .track_metric("silver_rows_processed", out.rows as f64, &[("ticker", ticker)]);
                Ok(out)
            }
            Err(e) => {
                error!(ticker, bronze_key, error = %e, "silver processing failed");
                self.obs.log_event(
                    "silver_layer_process_failed",
                    json!({ "ticker": ticker, "bronze_key": bronze_key, "error": e.to_string() }),
                );
                Err(e)
            }
        }
    }

    fn run(&self, ticker: &str, bronze_key: &str, now: DateTime<Utc>) -> Result<SilverOutput, PipelineError> {
        validate_segment("ticker", ticker)?;
        let raw = read_parquet(self.store.get(bronze_key)?)?;
        let mut table = Canonicalizer::clean(raw)?;
        let bars = frame_to_bars(&table)?;

        let batch_id = format!("{ticker}_{}", now.format("%Y%m%d"));
        let bundle = self.engine.compute(&batch_id, &bars)?;
        for (name, points) in &bundle.series {
            table = join_series(table, name, points)?;
        }

        let date = now.date_naive();
        let key = silver_key(ticker, &self.data_type, date);
        let indicators_key = silver_indicators_key(ticker, &self.data_type, date);
        self.store.put(&key, write_parquet(&table)?)?;
        self.store
            .put(&indicators_key, serde_json::to_vec_pretty(&bundle)?)?;

        Ok(SilverOutput {
            key,
            indicators_key,
            rows: table.height(),
            indicators: bundle.series.len(),
        })
    }

    /// Read back the indicator bundle written next to a Silver table.
    pub fn read_bundle(&self, indicators_key: &str) -> Result<IndicatorBundle, PipelineError> {
        Ok(serde_json::from_slice(&self.store.get(indicators_key)?)?)
    }
}
