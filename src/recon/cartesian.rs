//! Cartesian reconstruction
//!
//! Each repetition is gridded onto a square `N x N x 1` k-space frame with
//! `N = sqrt(samples / repetitions)`, then inverse transformed.
//!
//! The square grid is inferred from the sample count, so a rectangular
//! acquisition cannot be represented; counts that are not a perfect square
//! per repetition are rejected rather than reshaped.

use num_complex::Complex64;

use crate::error::{ensure_count, ReconError, Result};
use crate::fft::centered_ifft;
use crate::gridding::{grid_trajectory, scatter_frame};
use crate::trajectory::Trajectory;
use crate::utils::{segment_len, split_even};
use crate::volume::ComplexVolume;

#[derive(Debug, Clone, PartialEq)]
pub struct CartesianParams {
    pub repetitions: usize,
}

impl CartesianParams {
    /// Side of the square grid for `n_samples` samples
    pub fn grid_side(&self, n_samples: usize) -> Result<usize> {
        let reps = ensure_count("repetitions", self.repetitions)?;
        let per_segment = segment_len(n_samples, reps, "repetitions")?;
        let side = (per_segment as f64).sqrt().round() as usize;
        if per_segment == 0 || side * side != per_segment {
            return Err(ReconError::NotSquare { per_segment });
        }
        Ok(side)
    }
}

/// Sparse k-space before the inverse transform, shape `[N, N, 1, repetitions]`
///
/// Coordinates are gridded over the whole trajectory, then each repetition
/// is scattered into its own frame.
pub fn grid_kspace(samples: &[Complex64], trajectory: &Trajectory, params: &CartesianParams) -> Result<ComplexVolume> {
    if samples.len() != trajectory.len() {
        return Err(ReconError::ShapeMismatch {
            what: "channel samples",
            expected: trajectory.len(),
            found: samples.len(),
        });
    }
    let n = params.grid_side(samples.len())?;
    let reps = params.repetitions;
    let per_segment = n * n;

    let grid = grid_trajectory(trajectory, (n, n, 1));
    let dims = [n, n, 1, reps];
    let mut kspace = ComplexVolume::zeros(dims);

    for (r, segment) in split_even(samples, reps, "repetitions")?.enumerate() {
        scatter_frame(&mut kspace.data, dims, r, segment, &grid, r * per_segment)?;
    }
    Ok(kspace)
}

/// Reconstruct one channel; output shape `[N, N, 1, repetitions]`
pub fn reconstruct(samples: &[Complex64], trajectory: &Trajectory, params: &CartesianParams) -> Result<ComplexVolume> {
    let kspace = grid_kspace(samples, trajectory, params)?;
    centered_ifft(&kspace, (0, 1))
}
