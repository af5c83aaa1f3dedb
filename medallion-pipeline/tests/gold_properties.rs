//! Property tests for the Gold monthly rollup.

use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use medallion_core::domain::PriceBar;
use medallion_pipeline::gold::monthly_rollup;

fn arb_bars() -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec((1.0..200.0_f64, 1u64..10_000, 1i64..4), 1..150).prop_map(|rows| {
        let mut t = Utc.with_ymd_and_hms(2022, 11, 20, 0, 0, 0).unwrap();
        rows.into_iter()
            .map(|(close, volume, gap)| {
                t += Duration::days(gap);
                PriceBar {
                    timestamp: t,
                    open: close * 0.99,
                    high: close * 1.01,
                    low: close * 0.98,
                    close,
                    volume,
                    adjusted_close: None,
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn one_row_per_calendar_month(bars in arb_bars()) {
        let rows = monthly_rollup(&bars);
        let months: BTreeSet<String> = bars.iter().map(|b| b.timestamp.format("%Y-%m").to_string()).collect();
        prop_assert_eq!(rows.len(), months.len());
        prop_assert!(rows.windows(2).all(|w| w[0].year_month < w[1].year_month));
    }

    #[test]
    fn volume_is_conserved(bars in arb_bars()) {
        let rows = monthly_rollup(&bars);
        let total: u64 = bars.iter().map(|b| b.volume).sum();
        prop_assert_eq!(rows.iter().map(|r| r.volume).sum::<u64>(), total);
    }

    #[test]
    fn extremes_bound_open_and_close(bars in arb_bars()) {
        for row in monthly_rollup(&bars) {
            prop_assert!(row.high >= row.open && row.high >= row.close);
            prop_assert!(row.low <= row.open && row.low <= row.close);
            if let Some(v) = row.volatility {
                prop_assert!(v >= 0.0);
            }
        }
    }

    #[test]
    fn first_month_has_no_return(bars in arb_bars()) {
        let rows = monthly_rollup(&bars);
        prop_assert!(rows[0].monthly_return.is_none());
        prop_assert!(rows.iter().take(2).all(|r| r.ma_3m.is_none()));
        prop_assert!(rows.iter().skip(1).all(|r| r.monthly_return.is_some()));
    }
}
