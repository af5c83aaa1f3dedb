//! Window and whole-sample statistics shared by indicators and summaries.
//!
//! Every windowed value is summed left to right over its own window, so the
//! result at index t does not depend on where a computation started. This is
//! what lets the parallel backend split a batch and still agree bit for bit
//! with the sequential one.

/// Mean of `values[end + 1 - window ..= end]`, or NaN if the window does not fit.
pub fn window_mean(values: &[f64], end: usize, window: usize) -> f64 {
    if window == 0 || end >= values.len() || end + 1 < window {
        return f64::NAN;
    }
    let slice = &values[end + 1 - window..=end];
    slice.iter().sum::<f64>() / window as f64
}

/// Sample standard deviation (ddof = 1) of `values[end + 1 - window ..= end]`.
///
/// NaN if the window does not fit or holds fewer than two values. A window of
/// identical values yields exactly zero.
pub fn window_sample_std(values: &[f64], end: usize, window: usize) -> f64 {
    if window < 2 || end >= values.len() || end + 1 < window {
        return f64::NAN;
    }
    sample_std(&values[end + 1 - window..=end]).unwrap_or(f64::NAN)
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1), `None` for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let first = values[0];
    if values.iter().all(|&v| v == first) {
        return Some(0.0);
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Median (mean of the two middle values for even lengths), `None` if empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Simple period-over-period returns: `(v[t] - v[t-1]) / v[t-1]` for t >= 1.
///
/// Pairs with a zero denominator are skipped rather than yielding `inf` the
/// way pandas `pct_change` does, so downstream statistics stay finite.
pub fn pct_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn window_mean_basic() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(window_mean(&v, 1, 3).is_nan());
        assert_approx(window_mean(&v, 2, 3), 2.0, DEFAULT_EPSILON);
        assert_approx(window_mean(&v, 3, 3), 3.0, DEFAULT_EPSILON);
        assert!(window_mean(&v, 4, 3).is_nan());
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        // values 2,4,4,4,5,5,7,9: population std 2.0, sample std sqrt(32/7)
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx(sample_std(&v).unwrap(), (32.0_f64 / 7.0).sqrt(), DEFAULT_EPSILON);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn constant_window_std_is_exactly_zero() {
        let v = [0.1; 20];
        assert_eq!(window_sample_std(&v, 19, 20), 0.0);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn pct_changes_basic() {
        let r = pct_changes(&[10.0, 12.0, 9.0]);
        assert_eq!(r.len(), 2);
        assert_approx(r[0], 0.2, DEFAULT_EPSILON);
        assert_approx(r[1], -0.25, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_changes_skips_zero_base() {
        let r = pct_changes(&[0.0, 5.0, 10.0]);
        assert_eq!(r.len(), 1);
        assert_approx(r[0], 1.0, DEFAULT_EPSILON);
        assert!(pct_changes(&[0.0; 4]).is_empty());
    }
}
