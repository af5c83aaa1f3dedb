//! Batch orchestrator: fan tickers out across extract, Bronze, Silver, Gold.
//!
//! A ticker's failure (including a panic inside a stage) becomes an error
//! entry in the report. Only failures of the orchestration machinery itself
//! are returned as errors.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use medallion_core::data::MarketDataSource;
use medallion_core::domain::DateRange;
use medallion_core::observability::Observability;
use medallion_core::storage::keys::{is_silver_table_key, ticker_prefix, SILVER};
use medallion_core::storage::ObjectStore;

use crate::bronze::BronzeLoader;
use crate::config::OrchestratorConfig;
use crate::error::PipelineError;
use crate::gold::GoldAggregator;
use crate::report::{BatchReport, TickerOutcome, TickerReport};
use crate::silver::SilverProcessor;

/// Errors recorded on the batch trace.
const TRACE_ERRORS: usize = 5;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("cannot build worker pool: {0}")]
    WorkerPool(String),
}

#[derive(Clone)]
pub struct BatchOrchestrator {
    source: Arc<dyn MarketDataSource>,
    store: Arc<dyn ObjectStore>,
    obs: Arc<dyn Observability>,
    bronze: BronzeLoader,
    silver: SilverProcessor,
    gold: GoldAggregator,
    settings: OrchestratorConfig,
}

impl BatchOrchestrator {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        store: Arc<dyn ObjectStore>,
        obs: Arc<dyn Observability>,
        silver: SilverProcessor,
        settings: OrchestratorConfig,
    ) -> Self {
        Self {
            bronze: BronzeLoader::new(store.clone(), obs.clone()),
            gold: GoldAggregator::new(store.clone(), obs.clone()),
            source,
            store,
            obs,
            silver,
            settings,
        }
    }

    pub fn run(
        &self,
        tickers: &[String],
        range: DateRange,
        parallel: bool,
    ) -> Result<BatchReport, OrchestratorError> {
        self.run_at(tickers, range, parallel, Utc::now())
    }

    /// Run a batch with `now` as the write time of every stage.
    pub fn run_at(
        &self,
        tickers: &[String],
        range: DateRange,
        parallel: bool,
        now: DateTime<Utc>,
    ) -> Result<BatchReport, OrchestratorError> {
        let batch_id = format!("batch_{}", now.format("%Y%m%d_%H%M%S"));
        info!(batch_id = %batch_id, tickers = tickers.len(), parallel, "starting batch");
        let trace = self.obs.start_trace(
            "batch_process",
            json!({
                "batch_id": batch_id,
                "tickers": tickers,
                "start_date": range.start.to_string(),
                "end_date": range.end.to_string(),
            }),
        );

        let run_one = |ticker: &String| self.guarded(ticker, range, now);
        let results: Vec<TickerReport> = if parallel && tickers.len() > 1 {
            let pool = match rayon::ThreadPoolBuilder::new()
                .num_threads(self.settings.max_workers.max(1))
                .build()
            {
                Ok(pool) => pool,
                Err(e) => {
                    error!(batch_id = %batch_id, error = %e, "worker pool unavailable");
                    self.obs
                        .end_trace(&trace, false, json!({ "error": e.to_string() }));
                    return Err(OrchestratorError::WorkerPool(e.to_string()));
                }
            };
            pool.install(|| tickers.par_iter().map(run_one).collect())
        } else {
            tickers.iter().map(run_one).collect()
        };

        let report = BatchReport::from_results(batch_id, results);
        let errors: Vec<_> = report
            .errors()
            .take(TRACE_ERRORS)
            .map(|(ticker, error)| json!({ "ticker": ticker, "error": error }))
            .collect();
        self.obs.end_trace(
            &trace,
            report.failed == 0,
            json!({
                "total_tickers": report.total,
                "successful": report.successful,
                "failed": report.failed,
                "errors": errors,
            }),
        );
        self.obs.track_metric(
            "batch_tickers_failed",
            report.failed as f64,
            &[("batch_id", report.batch_id.as_str())],
        );
        info!(
            batch_id = %report.batch_id,
            total = report.total,
            successful = report.successful,
            failed = report.failed,
            "batch finished"
        );
        Ok(report)
    }

    /// One ticker under its own trace; errors and panics become report entries.
    fn guarded(&self, ticker: &str, range: DateRange, now: DateTime<Utc>) -> TickerReport {
        let trace = self.obs.start_trace(
            "ticker_process",
            json!({
                "ticker": ticker,
                "start_date": range.start.to_string(),
                "end_date": range.end.to_string(),
            }),
        );

        let result = catch_unwind(AssertUnwindSafe(|| self.process_ticker(ticker, range, now)))
            .unwrap_or_else(|payload| {
                Err(PipelineError::Panicked {
                    ticker: ticker.to_string(),
                    message: panic_message(payload.as_ref()),
                })
            });

        let outcome = match result {
            Ok(outcome) => {
                self.obs
                    .end_trace(&trace, true, serde_json::to_value(&outcome).unwrap_or_default());
                outcome
            }
            Err(e) => {
                error!(ticker, error = %e, "ticker failed");
                self.obs
                    .end_trace(&trace, false, json!({ "error": e.to_string() }));
                TickerOutcome::Error {
                    error: e.to_string(),
                }
            }
        };
        TickerReport {
            ticker: ticker.to_string(),
            outcome,
        }
    }

    fn process_ticker(
        &self,
        ticker: &str,
        range: DateRange,
        now: DateTime<Utc>,
    ) -> Result<TickerOutcome, PipelineError> {
        info!(ticker, source = self.source.name(), "extracting");
        let bars = self.source.fetch(ticker, range)?;
        let bronze_key = self
            .bronze
            .load(ticker, &self.settings.data_type, &bars, now)?;

        let (silver_key, indicators_calculated, gold_inputs) = if self.settings.calculate_indicators {
            let out = self.silver.process_at(ticker, &bronze_key, now)?;
            let inputs: Vec<String> = self
                .store
                .list(&ticker_prefix(SILVER, ticker))?
                .into_iter()
                .map(|m| m.key)
                .filter(|k| is_silver_table_key(k))
                .collect();
            (Some(out.key), Some(out.indicators), inputs)
        } else {
            (None, None, vec![bronze_key.clone()])
        };

        let gold_keys = self.gold.aggregate_at(ticker, &gold_inputs, now)?;
        Ok(TickerOutcome::Success {
            price_points: bars.len(),
            bronze_key,
            silver_key,
            indicators_calculated,
            gold_keys,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
