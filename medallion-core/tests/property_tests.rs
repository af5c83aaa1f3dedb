//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. RSI stays inside [0, 100] wherever it is defined
//! 2. Sequential and parallel backends agree on every series
//! 3. Cleaning a bar table twice changes nothing
//! 4. Indicator series never outgrow the batch

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use medallion_core::data::{bars_to_frame, Canonicalizer};
use medallion_core::domain::PriceBar;
use medallion_core::engine::{IndicatorEngine, ParallelEngine, SequentialEngine};
use medallion_core::indicators::{Indicator, Rsi};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, min..max)
        .prop_map(|v| v.into_iter().map(|c| (c * 100.0).round() / 100.0).collect())
}

fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + Duration::days(i as i64),
            open: close * 0.99,
            high: close * 1.02,
            low: close * 0.97,
            close,
            volume: 10_000 + i as u64 * 7,
            adjusted_close: Some(close),
        })
        .collect()
}

// ── 1. RSI Bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(15, 120)) {
        let bars = bars_from_closes(&closes);
        let values = Rsi::new(14).compute(&bars);
        prop_assert_eq!(values.len(), bars.len());
        for v in values.iter().filter(|v| !v.is_nan()) {
            prop_assert!((0.0..=100.0).contains(v), "rsi out of range: {}", v);
        }
    }
}

// ── 2. Backend Equivalence ───────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn backends_agree(closes in arb_closes(50, 200), partitions in 1usize..9) {
        let bars = bars_from_closes(&closes);
        let seq = SequentialEngine::new().compute("prop", &bars).unwrap();
        let par = ParallelEngine::new(partitions).compute("prop", &bars).unwrap();

        let seq_names: Vec<&str> = seq.series_names().collect();
        let par_names: Vec<&str> = par.series_names().collect();
        prop_assert_eq!(&seq_names, &par_names);

        for name in seq_names {
            let a = seq.series(name).unwrap();
            let b = par.series(name).unwrap();
            prop_assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(b) {
                prop_assert_eq!(x.timestamp, y.timestamp);
                prop_assert!((x.value - y.value).abs() <= 1e-9, "{}: {} vs {}", name, x.value, y.value);
            }
        }
        prop_assert_eq!(seq.statistics, par.statistics);
        prop_assert_eq!(seq.trends, par.trends);
    }
}

// ── 3. Cleaning Idempotence ──────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn cleaning_is_idempotent(closes in arb_closes(1, 80), dup in 0usize..80) {
        let mut bars = bars_from_closes(&closes);
        // a duplicate row and reversed order are what cleaning exists for
        let copy = bars[dup % bars.len()].clone();
        bars.push(copy);
        bars.reverse();

        let once = Canonicalizer::clean(bars_to_frame(&bars).unwrap()).unwrap();
        let twice = Canonicalizer::clean(once.clone()).unwrap();
        prop_assert_eq!(once.height(), closes.len());
        prop_assert!(once.equals_missing(&twice));
    }
}

// ── 4. Series Length ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn series_never_exceed_batch(closes in arb_closes(1, 120)) {
        let bars = bars_from_closes(&closes);
        let bundle = SequentialEngine::new().compute("len", &bars).unwrap();
        for name in bundle.series_names() {
            prop_assert!(bundle.series(name).unwrap().len() <= bars.len());
        }
        prop_assert_eq!(bundle.statistics.trading_days, bars.len());
    }
}
