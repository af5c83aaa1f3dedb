//! Pivot points on close prices.
//!
//! A bar is a pivot high when its close is strictly greater than every close
//! in the `window` bars before it and at least as large as every close in the
//! `window` bars after it, so among equal peaks the earliest one qualifies.
//! Pivot lows mirror this. The strict comparison against earlier bars means
//! a bar in a flat stretch is neither.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub index: usize,
    pub price: f64,
    pub kind: PivotKind,
}

/// Find pivot points in `closes` using a symmetric window.
///
/// Only bars with a full window on both sides are candidates.
pub fn find_pivots(closes: &[f64], window: usize) -> Vec<Pivot> {
    let n = closes.len();
    if window == 0 || n < 2 * window + 1 {
        return Vec::new();
    }

    let mut pivots = Vec::new();
    for i in window..(n - window) {
        let c = closes[i];
        let before = &closes[i - window..i];
        let after = &closes[i + 1..=i + window];

        let is_high = before.iter().all(|&p| c > p) && after.iter().all(|&p| c >= p);
        let is_low = before.iter().all(|&p| c < p) && after.iter().all(|&p| c <= p);

        if is_high {
            pivots.push(Pivot {
                index: i,
                price: c,
                kind: PivotKind::High,
            });
        } else if is_low {
            pivots.push(Pivot {
                index: i,
                price: c,
                kind: PivotKind::Low,
            });
        }
    }
    pivots
}

/// Prices of the last `count` pivots of `kind`, in chronological order.
pub fn last_levels(pivots: &[Pivot], kind: PivotKind, count: usize) -> Vec<f64> {
    let matching: Vec<f64> = pivots
        .iter()
        .filter(|p| p.kind == kind)
        .map(|p| p.price)
        .collect();
    let skip = matching.len().saturating_sub(count);
    matching[skip..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_peak_and_trough() {
        let closes = [1.0, 2.0, 5.0, 2.0, 1.0, 0.5, 1.0, 2.0];
        let pivots = find_pivots(&closes, 2);
        assert_eq!(
            pivots,
            vec![
                Pivot { index: 2, price: 5.0, kind: PivotKind::High },
                Pivot { index: 5, price: 0.5, kind: PivotKind::Low },
            ]
        );
    }

    #[test]
    fn equal_peaks_earliest_wins() {
        let closes = [1.0, 2.0, 5.0, 5.0, 2.0, 1.0];
        let pivots = find_pivots(&closes, 2);
        let highs: Vec<usize> = pivots
            .iter()
            .filter(|p| p.kind == PivotKind::High)
            .map(|p| p.index)
            .collect();
        assert_eq!(highs, vec![2]);
    }

    #[test]
    fn flat_stretch_has_no_pivots() {
        assert!(find_pivots(&[7.0; 15], 3).is_empty());
    }

    #[test]
    fn too_short_has_no_pivots() {
        assert!(find_pivots(&[1.0, 2.0, 1.0], 5).is_empty());
    }

    #[test]
    fn last_levels_keeps_most_recent() {
        let pivots: Vec<Pivot> = (0..5)
            .map(|i| Pivot {
                index: i,
                price: i as f64,
                kind: PivotKind::Low,
            })
            .collect();
        assert_eq!(last_levels(&pivots, PivotKind::Low, 3), vec![2.0, 3.0, 4.0]);
        assert!(last_levels(&pivots, PivotKind::High, 3).is_empty());
    }
}
