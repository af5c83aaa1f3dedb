//! Medallion Core: domain types, indicators, the indicator engine, bar tables,
//! object storage and the observability boundary.
//!
//! This crate holds everything the pipeline stages are built from:
//! - Domain types (price bars, ticker series, date ranges)
//! - Technical indicators behind a single-series `Indicator` trait
//! - The indicator engine with sequential and parallel backends
//! - Polars bar tables, Parquet bytes and cleaning
//! - Object stores and the layer key scheme
//! - Observability sinks

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod observability;
pub mod storage;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across orchestrator workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::DateRange>();
        require_sync::<domain::DateRange>();

        // Engine types
        require_send::<engine::IndicatorBundle>();
        require_sync::<engine::IndicatorBundle>();
        require_send::<engine::SequentialEngine>();
        require_sync::<engine::SequentialEngine>();
        require_send::<engine::ParallelEngine>();
        require_sync::<engine::ParallelEngine>();
        require_send::<Box<dyn engine::IndicatorEngine>>();
        require_sync::<Box<dyn engine::IndicatorEngine>>();
        require_send::<indicators::IndicatorValues>();
        require_sync::<indicators::IndicatorValues>();

        // Boundaries
        require_send::<storage::MemoryStore>();
        require_sync::<storage::MemoryStore>();
        require_send::<storage::LocalStore>();
        require_sync::<storage::LocalStore>();
        require_send::<data::CsvSource>();
        require_sync::<data::CsvSource>();
        require_send::<data::SyntheticSource>();
        require_sync::<data::SyntheticSource>();
        require_send::<observability::TracingObservability>();
        require_sync::<observability::TracingObservability>();
        require_send::<observability::RecordingObservability>();
        require_sync::<observability::RecordingObservability>();
    }

    /// Architecture contract: the engine contract takes bars only, no store.
    ///
    /// `compute` sees a batch id and a slice of bars. If a storage or
    /// observability parameter is ever added, this stops compiling.
    #[test]
    fn engine_contract_is_pure() {
        fn _check_trait_object_builds(
            engine: &dyn engine::IndicatorEngine,
            bars: &[domain::PriceBar],
        ) -> Result<engine::IndicatorBundle, engine::EngineError> {
            engine.compute("batch", bars)
        }
    }
}
