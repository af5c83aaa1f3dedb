//! Bronze stage: persist a raw batch exactly as extracted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info};

use medallion_core::data::{bars_to_frame, write_parquet};
use medallion_core::domain::PriceBar;
use medallion_core::observability::Observability;
use medallion_core::storage::keys::{bronze_key, validate_segment};
use medallion_core::storage::{ObjectStore, StorageError};

use crate::error::PipelineError;

/// Writes immutable, time-partitioned Bronze objects.
#[derive(Clone)]
pub struct BronzeLoader {
    store: Arc<dyn ObjectStore>,
    obs: Arc<dyn Observability>,
}

impl BronzeLoader {
    pub fn new(store: Arc<dyn ObjectStore>, obs: Arc<dyn Observability>) -> Self {
        Self { store, obs }
    }

    /// Write `bars` as one Parquet object and return its key.
    ///
    /// The key is derived from `write_time` at second granularity. If an
    /// object already exists under it the load fails with
    /// [`PipelineError::KeyCollision`]; Bronze objects are never replaced.
    pub fn load(
        &self,
        ticker: &str,
        data_type: &str,
        bars: &[PriceBar],
        write_time: DateTime<Utc>,
    ) -> Result<String, PipelineError> {
        let rows = bars.len();
        self.obs.log_event(
            "bronze_layer_load_started",
            json!({ "ticker": ticker, "data_type": data_type, "rows": rows }),
        );

        match self.write(ticker, data_type, bars, write_time) {
            Ok((key, content_hash)) => {
                info!(ticker, key = %key, rows, "bronze object written");
                self.obs.log_event(
                    "bronze_layer_load_completed",
                    json!({
                        "ticker": ticker,
                        "data_type": data_type,
                        "rows": rows,
                        "path": key,
                        "content_hash": content_hash,
                    }),
                );
                self.obs
                    .track_metric("bronze_rows_written", rows as f64, &[("ticker", ticker)]);
                Ok(key)
            }
            Err(e) => {
                error!(ticker, error = %e, "bronze load failed");
                self.obs.log_event(
                    "bronze_layer_load_failed",
                    json!({
                        "ticker": ticker,
                        "data_type": data_type,
                        "rows": rows,
                        "error": e.to_string(),
                    }),
                );
                Err(e)
            }
        }
    }

    fn write(
        &self,
        ticker: &str,
        data_type: &str,
        bars: &[PriceBar],
        write_time: DateTime<Utc>,
    ) -> Result<(String, String), PipelineError> {
        validate_segment("ticker", ticker)?;
        validate_segment("data type", data_type)?;
        if bars.is_empty() {
            return Err(PipelineError::EmptyBatch {
                ticker: ticker.to_string(),
            });
        }

        let key = bronze_key(ticker, data_type, write_time);
        let bytes = write_parquet(&bars_to_frame(bars)?)?;
        let content_hash = blake3::hash(&bytes).to_hex().to_string();
        match self.store.put_new(&key, bytes) {
            Ok(()) => Ok((key, content_hash)),
            Err(StorageError::AlreadyExists { .. }) => Err(PipelineError::KeyCollision { key }),
            Err(e) => Err(e.into()),
        }
    }
}
