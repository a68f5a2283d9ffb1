//! Nearest-cell gridding of k-space coordinates
//!
//! Maps continuous coordinates onto the index range of a fixed-size
//! Cartesian grid by linear rescaling. This is not physically exact
//! gridding: samples that land on the same cell overwrite each other in
//! sample order (last write wins).

use num_complex::Complex64;

use crate::error::{ReconError, Result};
use crate::trajectory::Trajectory;
use crate::volume::idx4d;

/// Map coordinates to integer indices in `[0, n-1]`
///
/// Subtracts the minimum, then scales by `(n-1)/max` and rounds. When all
/// coordinates are identical the shifted values are truncated directly,
/// which maps everything to 0. `n <= 1` always yields 0. Non-finite
/// coordinates map to 0.
pub fn grid_index(coords: &[f64], n: usize) -> Vec<usize> {
    if coords.is_empty() {
        return Vec::new();
    }
    if n <= 1 {
        return vec![0; coords.len()];
    }

    let min = coords.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_shifted = coords.iter().fold(0.0_f64, |a, &b| a.max(b - min));
    let last = n - 1;

    coords
        .iter()
        .map(|&c| {
            let shifted = c - min;
            let idx = if max_shifted > 0.0 {
                (shifted / max_shifted * last as f64).round()
            } else {
                shifted.trunc()
            };
            // Float-to-int casts saturate and send NaN to 0
            (idx as usize).min(last)
        })
        .collect()
}

/// Per-sample grid cell of a whole trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedTrajectory {
    pub ix: Vec<usize>,
    pub iy: Vec<usize>,
    pub iz: Vec<usize>,
    pub dims: (usize, usize, usize),
}

impl GriddedTrajectory {
    pub fn len(&self) -> usize {
        self.ix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ix.is_empty()
    }
}

/// Grid each axis of `trajectory` independently onto `(nx, ny, nz)`
pub fn grid_trajectory(trajectory: &Trajectory, dims: (usize, usize, usize)) -> GriddedTrajectory {
    GriddedTrajectory {
        ix: grid_index(&trajectory.kx, dims.0),
        iy: grid_index(&trajectory.ky, dims.1),
        iz: grid_index(&trajectory.kz, dims.2),
        dims,
    }
}

/// Scatter one segment of samples into frame `frame` of a k-space volume
///
/// `offset` is the position of the segment's first sample in the gridded
/// trajectory. Later samples overwrite earlier ones on collision.
pub fn scatter_frame(
    kspace: &mut [Complex64],
    dims: [usize; 4],
    frame: usize,
    samples: &[Complex64],
    grid: &GriddedTrajectory,
    offset: usize,
) -> Result<()> {
    if offset + samples.len() > grid.len() {
        return Err(ReconError::ShapeMismatch {
            what: "gridded trajectory",
            expected: offset + samples.len(),
            found: grid.len(),
        });
    }
    for (n, &s) in samples.iter().enumerate() {
        let t = offset + n;
        kspace[idx4d(grid.ix[t], grid.iy[t], grid.iz[t], frame, dims)] = s;
    }
    Ok(())
}
