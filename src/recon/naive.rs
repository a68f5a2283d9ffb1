//! Naive reconstruction via iterative NUFFT
//!
//! Treats the whole sample set as one irregular 2-D trajectory and solves
//! for the image on a grid of `round(fov / res)` points per axis.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::{ensure_count, ensure_positive, ReconError, Result};
use crate::nufft::Nufft;
use crate::recon::MAX_GRID_SIDE;
use crate::trajectory::Trajectory;
use crate::volume::{ComplexVolume, Volume};

#[derive(Debug, Clone, PartialEq)]
pub struct NaiveParams {
    /// Field of view (x, y) in mm
    pub fov: [f64; 2],
    /// Resolution (x, y) in mm
    pub resolution: [f64; 2],
    /// CGNR iterations of the inverse solve
    pub iterations: usize,
}

impl NaiveParams {
    /// Grid size per axis derived from field of view and resolution
    ///
    /// Each side must lie in `1..=MAX_GRID_SIDE`.
    pub fn grid_size(&self) -> Result<[usize; 2]> {
        let mut n = [0usize; 2];
        for d in 0..2 {
            let fov = ensure_positive("fov", self.fov[d])?;
            let res = ensure_positive("resolution", self.resolution[d])?;
            let cells = (fov / res).round();
            if cells < 1.0 {
                return Err(ReconError::OutOfRange {
                    param: "fov",
                    detail: format!("fov {} / resolution {} gives an empty grid", fov, res),
                });
            }
            if cells > MAX_GRID_SIDE as f64 {
                return Err(ReconError::OutOfRange {
                    param: "fov",
                    detail: format!("fov {} / resolution {} gives {} cells", fov, res, cells),
                });
            }
            n[d] = cells as usize;
        }
        Ok(n)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        ensure_count("nufft_iterations", self.iterations)?;
        self.grid_size().map(|_| ())
    }
}

/// Reconstruct one channel onto an `[nx, ny, 1, 1]` grid
///
/// Coordinates (rad/mm) are converted to cycles per sample as
/// `k * res / 2π` before the NUFFT solve; kz is ignored.
pub fn reconstruct(samples: &[Complex64], trajectory: &Trajectory, params: &NaiveParams) -> Result<ComplexVolume> {
    if samples.len() != trajectory.len() {
        return Err(ReconError::ShapeMismatch {
            what: "channel samples",
            expected: trajectory.len(),
            found: samples.len(),
        });
    }
    let [nx, ny] = params.grid_size()?;

    let nodes: Vec<Vec<f64>> = [&trajectory.kx, &trajectory.ky]
        .iter()
        .zip(params.resolution.iter())
        .map(|(k, &res)| k.iter().map(|&v| v * res / (2.0 * PI)).collect())
        .collect();

    let plan = Nufft::new(&[nx, ny], &nodes)?;
    let image = plan.solve(samples, params.iterations)?;
    Volume::new(image, [nx, ny, 1, 1])
}
