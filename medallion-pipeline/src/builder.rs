//! Wiring: one `PipelineConfig` in, ready-to-use stages out.

use std::sync::Arc;

use medallion_core::data::MarketDataSource;
use medallion_core::engine::{build_engine, IndicatorEngine};
use medallion_core::observability::{Observability, TracingObservability};
use medallion_core::storage::{LocalStore, ObjectStore};

use crate::bronze::BronzeLoader;
use crate::config::PipelineConfig;
use crate::gold::GoldAggregator;
use crate::orchestrator::BatchOrchestrator;
use crate::silver::SilverProcessor;

/// Shared handles every stage is built from.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    store: Arc<dyn ObjectStore>,
    obs: Arc<dyn Observability>,
    engine: Arc<dyn IndicatorEngine>,
}

impl Pipeline {
    /// Local store under `storage.root`, `tracing` observability and the
    /// configured engine backend.
    pub fn from_config(config: PipelineConfig) -> Self {
        let store: Arc<dyn ObjectStore> = Arc::new(LocalStore::new(config.storage.root.clone()));
        let obs: Arc<dyn Observability> = Arc::new(TracingObservability::new(
            config.observability.service_name.clone(),
            config.observability.environment.clone(),
        ));
        Self::with_parts(config, store, obs)
    }

    /// Same as [`Pipeline::from_config`] with caller-supplied boundaries.
    pub fn with_parts(
        config: PipelineConfig,
        store: Arc<dyn ObjectStore>,
        obs: Arc<dyn Observability>,
    ) -> Self {
        let engine: Arc<dyn IndicatorEngine> =
            Arc::from(build_engine(config.engine.backend, config.engine.partitions));
        Self {
            config,
            store,
            obs,
            engine,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<dyn IndicatorEngine> {
        &self.engine
    }

    pub fn bronze(&self) -> BronzeLoader {
        BronzeLoader::new(self.store.clone(), self.obs.clone())
    }

    pub fn silver(&self) -> SilverProcessor {
        SilverProcessor::new(
            self.store.clone(),
            self.obs.clone(),
            self.engine.clone(),
            self.config.orchestrator.data_type.clone(),
        )
    }

    pub fn gold(&self) -> GoldAggregator {
        GoldAggregator::new(self.store.clone(), self.obs.clone())
    }

    pub fn orchestrator(&self, source: Arc<dyn MarketDataSource>) -> BatchOrchestrator {
        BatchOrchestrator::new(
            source,
            self.store.clone(),
            self.obs.clone(),
            self.silver(),
            self.config.orchestrator.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medallion_core::engine::EngineBackend;

    #[test]
    fn engine_follows_config() {
        let mut config = PipelineConfig::default();
        let dir = tempfile::tempdir().unwrap();
        config.storage.root = dir.path().to_path_buf();
        assert_eq!(Pipeline::from_config(config.clone()).engine().name(), "sequential");

        config.engine.backend = EngineBackend::Parallel;
        assert_eq!(Pipeline::from_config(config).engine().name(), "parallel");
    }
}
