//! Partitioned engine backend on the rayon pool.
//!
//! The batch is split into time-contiguous ranges. Each windowed indicator is
//! computed per range on a slice that starts `max_lookback` bars earlier, so
//! every window sees exactly the bars it would see in a full pass. Recursive
//! indicators (EMA family) are computed over the whole batch in one task.

use rayon::prelude::*;
use tracing::debug;

use super::{
    assemble, indicator_plan, max_lookback, prepare, summarize, EngineError, IndicatorBundle,
    IndicatorEngine,
};
use crate::domain::PriceBar;
use crate::indicators::{Indicator, IndicatorValues};

/// One unit of partitioned work: compute `[start, end)` reading from `context_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub context_start: usize,
    pub start: usize,
    pub end: usize,
}

/// Split `0..len` into at most `count` contiguous ranges with `overlap` bars of context.
pub fn partition(len: usize, count: usize, overlap: usize) -> Vec<Partition> {
    if len == 0 {
        return Vec::new();
    }
    let count = count.clamp(1, len);
    let chunk = len.div_ceil(count);
    (0..len)
        .step_by(chunk)
        .map(|start| Partition {
            context_start: start.saturating_sub(overlap),
            start,
            end: (start + chunk).min(len),
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct ParallelEngine {
    partitions: usize,
}

impl ParallelEngine {
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    fn compute_indicator(
        &self,
        batch_id: &str,
        bars: &[PriceBar],
        indicator: &dyn Indicator,
        parts: &[Partition],
    ) -> Result<Vec<f64>, EngineError> {
        if indicator.is_recursive() {
            return Ok(indicator.compute(bars));
        }
        let pieces: Vec<Vec<f64>> = parts
            .par_iter()
            .map(|p| {
                let slice = &bars[p.context_start..p.end];
                let local = (p.start - p.context_start)..(p.end - p.context_start);
                indicator.compute_range(slice, local)
            })
            .collect();
        let stitched: Vec<f64> = pieces.into_iter().flatten().collect();
        if stitched.len() != bars.len() {
            return Err(EngineError::Computation {
                batch_id: batch_id.to_string(),
                reason: format!(
                    "indicator '{}' stitched {} values for {} bars",
                    indicator.name(),
                    stitched.len(),
                    bars.len()
                ),
            });
        }
        Ok(stitched)
    }
}

impl Default for ParallelEngine {
    fn default() -> Self {
        Self::new(rayon::current_num_threads())
    }
}

impl IndicatorEngine for ParallelEngine {
    fn name(&self) -> &str {
        "parallel"
    }

    fn compute(&self, batch_id: &str, bars: &[PriceBar]) -> Result<IndicatorBundle, EngineError> {
        let bars = prepare(batch_id, bars)?;
        let plan = indicator_plan(bars.len());
        let parts = partition(bars.len(), self.partitions, max_lookback(&plan));
        debug!(
            batch_id,
            bars = bars.len(),
            indicators = plan.len(),
            partitions = parts.len(),
            "parallel compute"
        );

        let (series, summary) = rayon::join(
            || {
                plan.par_iter()
                    .map(|ind| {
                        self.compute_indicator(batch_id, &bars, ind.as_ref(), &parts)
                            .map(|s| (ind.name().to_string(), s))
                    })
                    .collect::<Result<Vec<_>, EngineError>>()
            },
            || summarize(batch_id, &bars),
        );

        let mut values = IndicatorValues::new();
        for (name, s) in series? {
            values.insert(name, s);
        }
        Ok(assemble(batch_id, &bars, &values, summary?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SequentialEngine;
    use crate::indicators::make_bars;

    #[test]
    fn partition_covers_range_with_overlap() {
        let parts = partition(10, 3, 2);
        assert_eq!(
            parts,
            vec![
                Partition { context_start: 0, start: 0, end: 4 },
                Partition { context_start: 2, start: 4, end: 8 },
                Partition { context_start: 6, start: 8, end: 10 },
            ]
        );
    }

    #[test]
    fn partition_more_parts_than_bars() {
        let parts = partition(3, 8, 5);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.context_start == 0));
        assert!(partition(0, 4, 1).is_empty());
    }

    #[test]
    fn matches_sequential_exactly() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 8.0 + i as f64 * 0.05)
            .collect();
        let bars = make_bars(&closes);
        let seq = SequentialEngine::new().compute("eq", &bars).unwrap();
        for parts in [1, 2, 3, 7, 16] {
            let par = ParallelEngine::new(parts).compute("eq", &bars).unwrap();
            assert_eq!(seq, par, "partitions = {parts}");
        }
    }

    #[test]
    fn unsorted_input_is_ordered_before_windows() {
        let closes: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let bars = make_bars(&closes);
        let mut shuffled = bars.clone();
        shuffled.reverse();
        let a = ParallelEngine::new(4).compute("x", &bars).unwrap();
        let b = ParallelEngine::new(4).compute("x", &shuffled).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_batch_is_error() {
        assert!(ParallelEngine::new(2).compute("x", &[]).is_err());
    }
}
