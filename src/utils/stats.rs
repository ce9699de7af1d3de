//! Order statistics used for threshold construction.

use std::cmp::Ordering;

/// Linear-interpolation quantile (R type 7, the pandas default).
///
/// Expects `sorted` ascending and `p` in `[0, 1]`. Returns `None` for an
/// empty slice.
pub fn quantile_type7(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    Some(sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo]))
}

/// Percentile (0..=100) of unsorted values, ignoring non-finite entries.
pub fn percentile(values: &mut Vec<f64>, percentile: f64) -> Option<f64> {
    values.retain(|v| v.is_finite());
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    quantile_type7(values, percentile / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quantile_type7() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(quantile_type7(&sorted, 0.25).unwrap(), 2.0);
        assert_relative_eq!(quantile_type7(&sorted, 0.5).unwrap(), 3.0);
        assert_relative_eq!(quantile_type7(&sorted, 0.9).unwrap(), 4.6);
        assert_relative_eq!(quantile_type7(&sorted, 0.0).unwrap(), 1.0);
        assert_relative_eq!(quantile_type7(&sorted, 1.0).unwrap(), 5.0);
    }

    #[test]
    fn test_quantile_empty() {
        assert_eq!(quantile_type7(&[], 0.5), None);
    }

    #[test]
    fn test_percentile_ignores_nan_and_sorts() {
        let mut values = vec![10.0, f64::NAN, 1.0, 5.0];
        assert_relative_eq!(percentile(&mut values, 50.0).unwrap(), 5.0);
    }
}
