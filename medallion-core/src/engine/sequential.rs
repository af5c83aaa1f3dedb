//! Single-threaded engine backend.

use tracing::debug;

use super::{assemble, indicator_plan, prepare, summarize, EngineError, IndicatorBundle, IndicatorEngine};
use crate::domain::PriceBar;
use crate::indicators::precompute_indicators;

#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialEngine;

impl SequentialEngine {
    pub fn new() -> Self {
        Self
    }
}

impl IndicatorEngine for SequentialEngine {
    fn name(&self) -> &str {
        "sequential"
    }

    fn compute(&self, batch_id: &str, bars: &[PriceBar]) -> Result<IndicatorBundle, EngineError> {
        let bars = prepare(batch_id, bars)?;
        let plan = indicator_plan(bars.len());
        debug!(batch_id, bars = bars.len(), indicators = plan.len(), "sequential compute");

        let values = precompute_indicators(&bars, &plan);
        let summary = summarize(batch_id, &bars)?;
        Ok(assemble(batch_id, &bars, &values, summary))
    }
}
