//! Even segmentation of readout sequences
//!
//! The flat sample sequence is split into repetitions, shots or echoes.
//! Splits must be exact: a count that does not divide evenly is a request
//! error, never a silent truncation.

use crate::error::{ReconError, Result};

/// Length of each of `parts` equal segments of a `total`-long sequence
///
/// # Arguments
/// * `total` - Number of samples
/// * `parts` - Number of segments
/// * `param` - Parameter name reported on failure
pub fn segment_len(total: usize, parts: usize, param: &'static str) -> Result<usize> {
    if parts == 0 || total % parts != 0 {
        return Err(ReconError::NotDivisible { param, total, parts });
    }
    Ok(total / parts)
}

/// Split `data` into `parts` equal, contiguous segments
pub fn split_even<'a, T>(
    data: &'a [T],
    parts: usize,
    param: &'static str,
) -> Result<std::slice::ChunksExact<'a, T>> {
    let len = segment_len(data.len(), parts, param)?;
    if len == 0 {
        return Err(ReconError::Empty("sample sequence"));
    }
    Ok(data.chunks_exact(len))
}
