//! Deviation measures between two equally-sampled series.
//!
//! Both functions assume the slices are aligned sample-by-sample (same length,
//! same x coordinates). Callers validate the shared domain beforehand; here we
//! only zip, so a shorter slice silently truncates the comparison.
//!
//! Sums accumulate left to right in sample order. Parallel callers split work
//! across candidates, never inside a sum.

/// Assignment tolerance multiplier applied to a fit's maximum training deviation.
///
/// Worst-case additive bound for two independent errors of comparable size
/// (training fit error and test point noise). Fixed policy, not a tunable.
pub const TOLERANCE_FACTOR: f64 = std::f64::consts::SQRT_2;

/// `Σ (a_i - b_i)²`, unnormalized.
pub fn sum_squared_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// `max |a_i - b_i|`; `0.0` for empty inputs, NaN if any difference is NaN.
pub fn max_abs_deviation(a: &[f64], b: &[f64]) -> f64 {
    let mut max = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let d = (x - y).abs();
        if d.is_nan() {
            return f64::NAN;
        }
        if d > max {
            max = d;
        }
    }
    max
}

/// Tolerance derived from a fit's maximum absolute deviation.
pub fn tolerance_for(max_abs_deviation: f64) -> f64 {
    max_abs_deviation * TOLERANCE_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_of_identical_series_is_zero() {
        let a = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(sum_squared_error(&a, &a), 0.0);
    }

    #[test]
    fn sse_matches_hand_computation() {
        // y=x vs y=2x on x=0..3: 0 + 1 + 4 + 9
        let a = [0.0, 1.0, 2.0, 3.0];
        let b = [0.0, 2.0, 4.0, 6.0];
        assert_eq!(sum_squared_error(&a, &b), 14.0);
    }

    #[test]
    fn max_abs_deviation_picks_largest_gap() {
        let a = [1.0, -2.0, 3.0];
        let b = [1.5, 2.0, 3.0];
        assert_eq!(max_abs_deviation(&a, &b), 4.0);
    }

    #[test]
    fn max_abs_deviation_propagates_nan() {
        let a = [1.0, f64::NAN];
        let b = [1.0, 1.0];
        assert!(max_abs_deviation(&a, &b).is_nan());
    }

    #[test]
    fn tolerance_is_sqrt2_scaled() {
        assert_eq!(tolerance_for(0.0), 0.0);
        assert_eq!(tolerance_for(2.0), 2.0 * std::f64::consts::SQRT_2);
    }
}
