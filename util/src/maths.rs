//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used when deciding whether a sample lands exactly on the end of a range.
const RANGE_END_TOL: f64 = 1e-9;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Number of samples `start + i * step` which lie strictly below `stop`.
///
/// A sample which lands on `stop` to within floating point noise is not counted, so a range whose
/// length is an exact multiple of `step` does not gain a spurious trailing sample. An empty range
/// or a non-positive step has no samples, and `None` is returned if the count does not fit in a
/// `usize`.
pub fn num_samples<T>(start: T, stop: T, step: T) -> Option<usize>
where
    T: Float
{
    if !(step > T::zero()) || !(stop > start) {
        return Some(0);
    }

    let tol = T::from(RANGE_END_TOL).unwrap_or_else(T::epsilon);
    let ratio = (stop - start) / step - tol;

    if ratio <= T::zero() {
        // Always keep the first sample of a non-empty range
        Some(1)
    }
    else {
        ratio.ceil().to_usize()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_num_samples() {
        // 4.0 / 0.04 is not exactly 100 in floating point
        assert_eq!(num_samples(0f64, 4.0, 0.04), Some(100));
        assert_eq!(num_samples(0f64, 1.0, 0.3), Some(4));
        assert_eq!(num_samples(0f64, 0.01, 0.04), Some(1));
        assert_eq!(num_samples(0f64, 0.0, 0.04), Some(0));
        assert_eq!(num_samples(0f64, 1.0, 0.0), Some(0));
        assert_eq!(num_samples(0f64, 1.0, -0.1), Some(0));
    }

    #[test]
    fn test_num_samples_overflow() {
        assert_eq!(num_samples(0f64, 1e300, 0.04), None);
        assert_eq!(num_samples(0f64, std::f64::INFINITY, 0.04), None);
    }
}
