//! Error type shared by every reconstruction and field operation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReconError {
    #[error("{what}: expected {expected} elements, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{total} samples cannot be split evenly into {parts} segments (`{param}`)")]
    NotDivisible {
        param: &'static str,
        total: usize,
        parts: usize,
    },
    #[error("cartesian reconstruction needs a square grid, but {per_segment} samples per repetition is not a perfect square")]
    NotSquare { per_segment: usize },
    #[error("missing required parameter `{param}` for {mode} reconstruction")]
    MissingParameter {
        param: &'static str,
        mode: &'static str,
    },
    #[error("parameter `{param}` must be positive and finite, got {value}")]
    NonPositive { param: &'static str, value: f64 },
    #[error("parameter `{param}` out of range: {detail}")]
    OutOfRange { param: &'static str, detail: String },
    #[error("channel {index} requested but only {available} channel(s) available")]
    InvalidChannel { index: usize, available: usize },
    #[error("invalid transform axes ({0}, {1}) for a 4-D volume")]
    InvalidAxes(usize, usize),
    #[error("empty {0}")]
    Empty(&'static str),
}

pub type Result<T> = std::result::Result<T, ReconError>;

/// Require a strictly positive, finite floating-point parameter
pub(crate) fn ensure_positive(param: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ReconError::NonPositive { param, value })
    }
}

/// Require a non-zero count parameter
pub(crate) fn ensure_count(param: &'static str, value: usize) -> Result<usize> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ReconError::NonPositive { param, value: 0.0 })
    }
}

/// Product of count parameters, rejecting overflow
pub(crate) fn checked_product(param: &'static str, factors: &[usize]) -> Result<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| ReconError::OutOfRange {
            param,
            detail: format!("product of {:?} overflows", factors),
        })
}

/// Reject grid sides above `max`
pub(crate) fn ensure_side(param: &'static str, value: usize, max: usize) -> Result<usize> {
    if value > max {
        return Err(ReconError::OutOfRange {
            param,
            detail: format!("{} exceeds the largest supported grid side {}", value, max),
        });
    }
    Ok(value)
}
