//! Utility functions shared by the reconstruction and field engines
//!
//! This module provides:
//! - Even segmentation of flat sample sequences
//! - Power-of-two padding for FFT convolution
//! - Non-finite value neutralisation

pub mod segment;
pub mod padding;

pub use segment::*;
pub use padding::*;

/// Replace NaN/Inf entries with zero, returning how many were replaced
///
/// A single NaN spreads through an entire FFT, so inputs to FFT-based
/// transforms are passed through this first.
pub fn zero_non_finite(data: &mut [f64]) -> usize {
    let mut count = 0;
    for v in data.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_non_finite() {
        let mut data = vec![1.0, f64::NAN, f64::INFINITY, -2.0, f64::NEG_INFINITY];
        assert_eq!(zero_non_finite(&mut data), 3);
        assert_eq!(data, vec![1.0, 0.0, 0.0, -2.0, 0.0]);
    }
}
