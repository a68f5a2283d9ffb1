//! EPIK keyhole reconstruction
//!
//! Samples are split into `shots * subsamples` segments, each gridded onto
//! its own `matrix x matrix x 1` k-space frame. Every output frame then
//! takes the keyhole band (the central `keyhole` lines along y) from its
//! own segment only, and fills the periphery with the sum of `subsamples`
//! neighbouring segments:
//! - frames `idx < subsamples - 1` use segments `0..subsamples`
//! - later frames use the sliding window `idx - subsamples + 1 ..= idx`
//!
//! Low spatial frequencies therefore refresh every frame while the
//! periphery is shared across a shot cycle.

use log::debug;
use num_complex::Complex64;

use crate::error::{checked_product, ensure_count, ensure_side, ReconError, Result};
use crate::fft::centered_ifft;
use crate::gridding::{grid_trajectory, scatter_frame};
use crate::recon::MAX_GRID_SIDE;
use crate::trajectory::Trajectory;
use crate::utils::{segment_len, split_even};
use crate::volume::{idx4d, ComplexVolume};

/// Matrix size used unless configured otherwise
pub const DEFAULT_MATRIX: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct EpikParams {
    /// Number of shot cycles
    pub shots: usize,
    /// Segments per shot cycle (interleaves sharing the periphery)
    pub subsamples: usize,
    /// Width of the central band along y, in lines
    pub keyhole: usize,
    /// In-plane grid size
    pub matrix: usize,
}

impl EpikParams {
    /// `shots * subsamples`, or `OutOfRange` if that overflows
    pub fn n_segments(&self) -> Result<usize> {
        checked_product("shots x subsamples", &[self.shots, self.subsamples])
    }

    /// Keyhole band `[lo, hi)` along y
    pub fn keyhole_band(&self) -> (usize, usize) {
        let n = self.matrix;
        ((n - self.keyhole) / 2, (n + self.keyhole) / 2)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure_count("repetitions", self.shots)?;
        ensure_count("shots", self.subsamples)?;
        ensure_count("keyhole", self.keyhole)?;
        ensure_count("epik_matrix", self.matrix)?;
        ensure_side("epik_matrix", self.matrix, MAX_GRID_SIDE)?;
        let frames = self.n_segments()?;
        checked_product("epik_matrix x frames", &[self.matrix, self.matrix, frames])?;
        if self.keyhole > self.matrix {
            return Err(ReconError::OutOfRange {
                param: "keyhole",
                detail: format!("keyhole {} wider than matrix {}", self.keyhole, self.matrix),
            });
        }
        Ok(())
    }

    /// Samples per segment for `n_samples` samples
    pub fn segment_len(&self, n_samples: usize) -> Result<usize> {
        self.validate()?;
        let len = segment_len(n_samples, self.n_segments()?, "shots x subsamples")?;
        if len == 0 {
            return Err(ReconError::Empty("sample sequence"));
        }
        Ok(len)
    }
}

/// Keyhole-combined k-space, shape `[matrix, matrix, 1, shots * subsamples]`
pub fn keyhole_kspace(samples: &[Complex64], trajectory: &Trajectory, params: &EpikParams) -> Result<ComplexVolume> {
    if samples.len() != trajectory.len() {
        return Err(ReconError::ShapeMismatch {
            what: "channel samples",
            expected: trajectory.len(),
            found: samples.len(),
        });
    }
    let seg_len = params.segment_len(samples.len())?;
    let n = params.matrix;
    let n_frames = params.n_segments()?;
    let dims = [n, n, 1, n_frames];

    // One sparse frame per segment
    let grid = grid_trajectory(trajectory, (n, n, 1));
    let mut frames = ComplexVolume::zeros(dims);
    for (s, segment) in split_even(samples, n_frames, "shots x subsamples")?.enumerate() {
        scatter_frame(&mut frames.data, dims, s, segment, &grid, s * seg_len)?;
    }

    let (lo, hi) = params.keyhole_band();
    let sub = params.subsamples;
    debug!(
        "EPIK: {} frames, keyhole lines [{}, {}), window {}",
        n_frames, lo, hi, sub
    );

    let mut out = ComplexVolume::zeros(dims);
    for idx in 0..n_frames {
        let window = if idx + 1 < sub { 0..sub } else { idx + 1 - sub..idx + 1 };
        for k in 0..dims[2] {
            for j in 0..n {
                let start = idx4d(0, j, k, idx, dims);
                if (lo..hi).contains(&j) {
                    out.data[start..start + n].copy_from_slice(&frames.data[start..start + n]);
                } else {
                    for w in window.clone() {
                        let src = idx4d(0, j, k, w, dims);
                        for i in 0..n {
                            out.data[start + i] += frames.data[src + i];
                        }
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Reconstruct one channel; output shape `[matrix, matrix, 1, shots * subsamples]`
pub fn reconstruct(samples: &[Complex64], trajectory: &Trajectory, params: &EpikParams) -> Result<ComplexVolume> {
    let kspace = keyhole_kspace(samples, trajectory, params)?;
    centered_ifft(&kspace, (0, 1))
}
