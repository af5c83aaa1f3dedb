//! Medallion Pipeline: Bronze/Silver/Gold stages and batch orchestration.
//!
//! This crate builds on `medallion-core` to provide:
//! - `PipelineConfig` (TOML + `MEDALLION_*` environment overrides)
//! - Bronze loader (immutable raw Parquet objects)
//! - Silver processor (cleaning, indicator engine, merged tables)
//! - Gold aggregator (monthly rollups and summary statistics)
//! - Batch orchestrator with a bounded worker pool and per-ticker reports

pub mod bronze;
pub mod builder;
pub mod config;
pub mod error;
pub mod gold;
pub mod orchestrator;
pub mod report;
pub mod silver;

pub use bronze::BronzeLoader;
pub use builder::Pipeline;
pub use config::{ConfigError, PipelineConfig};
pub use error::PipelineError;
pub use gold::{GoldAggregator, GoldKeys, GoldStatistics};
pub use orchestrator::{BatchOrchestrator, OrchestratorError};
pub use report::{BatchReport, TickerOutcome, TickerReport};
pub use silver::{SilverOutput, SilverProcessor};
