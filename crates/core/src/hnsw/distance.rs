//! Euclidean (L2) distance and tolerance-aware float equality.
//!
//! Distances are plain `f32` where **lower is closer**. [`nearly_equal`] is
//! for assertions and tolerance checks only; heap ordering always compares
//! the raw values.

use crate::config::FLOAT_TOLERANCE;
use crate::error::{HnswError, Result};

/// Euclidean distance `sqrt(Σ (aᵢ−bᵢ)²)`.
///
/// Fails with [`HnswError::DimensionMismatch`] when the lengths differ
/// (`expected` is `a.len()`).
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(HnswError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(euclidean_distance_sq(a, b).sqrt())
}

/// Squared Euclidean distance without the length check.
/// Callers must have validated both slices against the graph dimension.
#[inline]
pub(crate) fn euclidean_distance_sq(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let chunks_a = a.chunks_exact(4);
    let chunks_b = b.chunks_exact(4);
    let tail: f32 = chunks_a
        .remainder()
        .iter()
        .zip(chunks_b.remainder())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    // Four independent accumulators let the compiler vectorize the loop
    let mut acc = [0.0f32; 4];
    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..4 {
            let d = ca[i] - cb[i];
            acc[i] += d * d;
        }
    }
    acc[0] + acc[1] + acc[2] + acc[3] + tail
}

/// Euclidean distance for slices already known to share a dimension.
#[inline]
pub(crate) fn distance_unchecked(a: &[f32], b: &[f32]) -> f32 {
    euclidean_distance_sq(a, b).sqrt()
}

/// `true` when `x` and `y` are equal within an absolute or a relative
/// tolerance of [`FLOAT_TOLERANCE`].
pub fn nearly_equal(x: f32, y: f32) -> bool {
    equal_within_abs(x, y) || equal_within_rel(x, y)
}

/// `true` when `|x − y| ≤ FLOAT_TOLERANCE`.
pub fn equal_within_abs(x: f32, y: f32) -> bool {
    x == y || (x - y).abs() <= FLOAT_TOLERANCE
}

/// `true` when `|x − y| ≤ FLOAT_TOLERANCE · max(|x|, |y|)`.
///
/// Differences in the subnormal range are compared against
/// `FLOAT_TOLERANCE · f32::MIN_POSITIVE` instead. A NaN operand always fails;
/// infinities are equal only to themselves.
pub fn equal_within_rel(x: f32, y: f32) -> bool {
    if x == y {
        return true;
    }
    let delta = (x - y).abs();
    if delta <= f32::MIN_POSITIVE {
        return delta <= FLOAT_TOLERANCE * f32::MIN_POSITIVE;
    }
    // inf / inf is NaN, which fails the comparison
    delta / x.abs().max(y.abs()) <= FLOAT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euclidean_distance_3_4_5() {
        let d = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!(nearly_equal(d, 5.0), "expected 5, got {d}");
    }

    #[test]
    fn test_distance_symmetric_and_zero_on_self() {
        let a = [1.5, -2.0, 0.25, 9.0, 3.0];
        let b = [-0.5, 4.0, 1.0, 2.0, -7.0];
        let ab = euclidean_distance(&a, &b).unwrap();
        let ba = euclidean_distance(&b, &a).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(euclidean_distance(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_guard() {
        let err = euclidean_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(
            err,
            HnswError::DimensionMismatch {
                expected: 3,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_squared_matches_naive_sum_with_tail() {
        // 7 elements: one full chunk of 4 plus a remainder of 3
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let b = [7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
        let naive: f32 = a.iter().zip(&b).map(|(x, y)| (x - y) * (x - y)).sum();
        assert!(nearly_equal(euclidean_distance_sq(&a, &b), naive));
    }

    #[test]
    fn test_nearly_equal() {
        assert!(nearly_equal(1.0, 1.000_000_1));
        assert!(!nearly_equal(1.0, 1.1));
        assert!(nearly_equal(0.0, 1e-10));
    }

    #[test]
    fn test_nearly_equal_relative_for_large_magnitudes() {
        // absolute difference 1.0 is far above tolerance, relative is 1e-7
        assert!(nearly_equal(10_000_000.0, 10_000_001.0));
        assert!(!nearly_equal(1000.0, 1001.0));
    }

    #[test]
    fn test_nearly_equal_special_values() {
        assert!(!nearly_equal(f32::NAN, f32::NAN));
        assert!(nearly_equal(f32::INFINITY, f32::INFINITY));
        assert!(!nearly_equal(f32::INFINITY, f32::NEG_INFINITY));
        assert!(equal_within_rel(f32::MIN_POSITIVE / 4.0, f32::MIN_POSITIVE / 4.0));
    }
}
