//! # Exponential smoother
//!
//! A first order low pass filter over a scalar command stream:
//!
//! ```text
//! filtered = alpha * filtered_prev + (1 - alpha) * raw
//! ```
//!
//! The accumulator starts at zero, so a new engagement ramps up from rest rather than jumping to
//! the first raw value.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExpSmoother {
    value: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ExpSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current filtered value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Feed a new raw sample through the filter and return the filtered value.
    ///
    /// `alpha` is the weight of the previous value and must be in `[0, 1)`.
    pub fn update(&mut self, alpha: f64, raw: f64) -> f64 {
        self.value = alpha * self.value + (1.0 - alpha) * raw;
        self.value
    }

    /// Zero the accumulator.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_update() {
        let mut s = ExpSmoother::new();
        assert_eq!(s.update(0.5, 10.0), 5.0);
        assert_eq!(s.update(0.5, 10.0), 7.5);
        assert_eq!(s.update(0.5, 0.0), 3.75);

        s.reset();
        assert_eq!(s.value(), 0.0);
    }

    #[test]
    fn test_no_smoothing() {
        let mut s = ExpSmoother::new();
        assert_eq!(s.update(0.0, -42.0), -42.0);
        assert_eq!(s.update(0.0, 17.0), 17.0);
    }

    #[test]
    fn test_converges_monotonically() {
        let mut s = ExpSmoother::new();
        let mut prev = s.value();
        for _ in 0..200 {
            let v = s.update(0.8, 30.0);
            assert!(v >= prev - 1e-9);
            assert!(v <= 30.0 + 1e-9);
            prev = v;
        }
        assert!((30.0 - prev).abs() < 1e-9);
    }
}
