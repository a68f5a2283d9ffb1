//! Non-uniform fast Fourier transform
//!
//! Transforms between a Cartesian grid of Fourier coefficients and values
//! at arbitrary sample locations:
//!
//! f_j = Σ_k f̂_k · exp(-2πi k·x_j)
//!
//! with grid frequencies `k_d = i_d - N_d/2` and node coordinates `x_j` in
//! cycles per sample (nominally `[-0.5, 0.5)`; the transform is periodic in
//! x with period 1).
//!
//! The forward transform deapodises the coefficients, embeds them in a grid
//! oversampled by [`OVERSAMPLING`], runs an FFT, and interpolates at the
//! nodes with a Kaiser-Bessel kernel of half-width [`KERNEL_HALF_WIDTH`]
//! cells. The adjoint is the exact conjugate transpose of that pipeline.
//! Interpolation weights and cell indices depend only on the trajectory and
//! are computed once per trajectory.

use log::debug;
use num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

use crate::error::{ReconError, Result};
use crate::fft::{idx3d, transform_axis};
use crate::kernels::KaiserBessel;
use crate::solvers::cgnr_solve;

/// Iterations of the inverse solve unless configured otherwise
pub const DEFAULT_ITERATIONS: usize = 10;

/// Oversampling factor of the intermediate FFT grid
pub const OVERSAMPLING: usize = 2;

/// Kernel half-width in oversampled cells (relative error around 1e-10)
pub const KERNEL_HALF_WIDTH: usize = 6;

/// How [`Nufft::inverse_batched`] maps samples back to the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InverseMode {
    /// Direct adjoint, no density compensation
    Adjoint,
    /// Fixed number of CGNR iterations
    Iterative { iterations: usize },
}

/// Per-axis interpolation footprint of every sample
#[derive(Debug, Clone, Default)]
struct Footprint {
    /// Cells touched per sample
    width: usize,
    /// Row-major `n_samples x width` oversampled cell indices
    cells: Vec<usize>,
    /// Row-major `n_samples x width` kernel weights
    weights: Vec<f64>,
}

impl Footprint {
    fn sample(&self, s: usize) -> (&[usize], &[f64]) {
        let range = s * self.width..(s + 1) * self.width;
        (&self.cells[range.clone()], &self.weights[range])
    }
}

/// NUFFT plan for a fixed grid and trajectory
#[derive(Debug, Clone)]
pub struct Nufft {
    /// Grid size per axis, padded to three axes with 1
    shape: [usize; 3],
    ndim: usize,
    /// Oversampled grid size per axis
    over: [usize; 3],
    n_samples: usize,
    kernel: KaiserBessel,
    /// Per axis, oversampled cell holding frequency `i - N/2`
    embed: [Vec<usize>; 3],
    /// Per axis, 1/ψ̂ at each grid frequency
    deapod: [Vec<f64>; 3],
    footprint: [Footprint; 3],
}

impl Nufft {
    /// Plan a transform for `grid_shape` (1 to 3 axes, x first) and one node
    /// coordinate array per axis.
    pub fn new(grid_shape: &[usize], nodes: &[Vec<f64>]) -> Result<Self> {
        if grid_shape.is_empty() || grid_shape.len() > 3 {
            return Err(ReconError::OutOfRange {
                param: "grid_shape",
                detail: format!("{} axes, expected 1 to 3", grid_shape.len()),
            });
        }
        if let Some(axis) = grid_shape.iter().position(|&n| n == 0) {
            return Err(ReconError::OutOfRange {
                param: "grid_shape",
                detail: format!("axis {} has size 0", axis),
            });
        }

        let mut shape = [1usize; 3];
        shape[..grid_shape.len()].copy_from_slice(grid_shape);

        let too_large = || ReconError::OutOfRange {
            param: "grid_shape",
            detail: format!("grid {:?} is too large", grid_shape),
        };
        let mut over = [1usize; 3];
        for d in 0..3 {
            if shape[d] > 1 {
                over[d] = shape[d].checked_mul(OVERSAMPLING).ok_or_else(too_large)?;
            }
        }
        let total = over
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(too_large)?;
        if total > isize::MAX as usize / std::mem::size_of::<Complex64>() {
            return Err(too_large());
        }

        let kernel = KaiserBessel::new(KERNEL_HALF_WIDTH, OVERSAMPLING as f64);
        let mut embed: [Vec<usize>; 3] = Default::default();
        let mut deapod: [Vec<f64>; 3] = Default::default();
        for d in 0..3 {
            let (n, big) = (shape[d], over[d]);
            let half = (n / 2) as i64;
            embed[d] = (0..n)
                .map(|i| (i as i64 - half).rem_euclid(big as i64) as usize)
                .collect();
            deapod[d] = if n == 1 {
                vec![1.0]
            } else {
                (0..n)
                    .map(|i| 1.0 / kernel.fourier((i as i64 - half) as f64 / big as f64))
                    .collect()
            };
        }

        let mut plan = Self {
            shape,
            ndim: grid_shape.len(),
            over,
            n_samples: 0,
            kernel,
            embed,
            deapod,
            footprint: Default::default(),
        };
        plan.set_trajectory(nodes)?;
        Ok(plan)
    }

    /// Replace the trajectory and recompute the interpolation footprints
    pub fn set_trajectory(&mut self, nodes: &[Vec<f64>]) -> Result<()> {
        if nodes.len() != self.ndim {
            return Err(ReconError::ShapeMismatch {
                what: "node coordinate axes",
                expected: self.ndim,
                found: nodes.len(),
            });
        }
        let m = nodes[0].len();
        if m == 0 {
            return Err(ReconError::Empty("node coordinates"));
        }
        for axis in nodes.iter().skip(1) {
            if axis.len() != m {
                return Err(ReconError::ShapeMismatch {
                    what: "node coordinates",
                    expected: m,
                    found: axis.len(),
                });
            }
        }
        if nodes.iter().flatten().any(|x| !x.is_finite()) {
            return Err(ReconError::OutOfRange {
                param: "node coordinates",
                detail: "non-finite coordinate".to_string(),
            });
        }

        let full_width = 2 * self.kernel.half_width + 1;
        if m.checked_mul(full_width).is_none() {
            return Err(ReconError::OutOfRange {
                param: "node coordinates",
                detail: format!("{} samples exceed the addressable footprint table", m),
            });
        }

        for d in 0..3 {
            self.footprint[d] = if self.shape[d] == 1 {
                // Only k = 0 exists, so every node sees the single cell
                Footprint { width: 1, cells: vec![0; m], weights: vec![1.0; m] }
            } else {
                self.axis_footprint(&nodes[d], self.over[d], full_width)
            };
        }
        self.n_samples = m;

        debug!(
            "NUFFT plan: grid {:?}, oversampled {:?}, {} samples",
            &self.shape[..self.ndim],
            &self.over[..self.ndim],
            m
        );
        Ok(())
    }

    fn axis_footprint(&self, coords: &[f64], n: usize, width: usize) -> Footprint {
        let half_width = self.kernel.half_width as f64;
        let mut cells = Vec::with_capacity(coords.len() * width);
        let mut weights = Vec::with_capacity(coords.len() * width);
        for &x in coords {
            let u = (x - x.round()) * n as f64;
            let first = (u - half_width).ceil() as i64;
            for t in 0..width as i64 {
                let l = first + t;
                cells.push(l.rem_euclid(n as i64) as usize);
                weights.push(self.kernel.eval(u - l as f64));
            }
        }
        Footprint { width, cells, weights }
    }

    pub fn grid_shape(&self) -> &[usize] {
        &self.shape[..self.ndim]
    }

    /// Number of grid points
    pub fn n_grid(&self) -> usize {
        self.shape.iter().product()
    }

    /// Number of non-uniform sample locations
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Forward transform: grid coefficients -> values at the sample nodes
    pub fn trafo(&self, f_hat: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len("grid data", self.n_grid(), f_hat.len())?;
        Ok(self.trafo_unchecked(f_hat))
    }

    /// Adjoint transform: values at the sample nodes -> grid coefficients
    pub fn adjoint(&self, f: &[Complex64]) -> Result<Vec<Complex64>> {
        check_len("sample data", self.n_samples, f.len())?;
        Ok(self.adjoint_unchecked(f))
    }

    /// Iterative inverse: least-squares grid coefficients for sample values
    ///
    /// Runs exactly `iterations` CGNR steps (fewer only if the iteration
    /// degenerates). There is no convergence check, so quality for sparse
    /// or badly conditioned trajectories is not guaranteed.
    pub fn solve(&self, f: &[Complex64], iterations: usize) -> Result<Vec<Complex64>> {
        check_len("sample data", self.n_samples, f.len())?;
        let out = cgnr_solve(
            |x| self.trafo_unchecked(x),
            |r| self.adjoint_unchecked(r),
            f,
            iterations,
        );
        debug!(
            "NUFFT solve: {} iterations, residual {:.3e}",
            out.iterations, out.residual_norm
        );
        Ok(out.x)
    }

    /// Forward transform of a stack of grids
    ///
    /// `data` holds `n_grid * batch` values, one contiguous grid per slice;
    /// the result holds one contiguous sample vector per slice, in order.
    pub fn forward_batched(&self, data: &[Complex64]) -> Result<Vec<Complex64>> {
        let n = self.n_grid();
        let batch = batch_count(data.len(), n, "grid data")?;
        let mut out = Vec::with_capacity(self.n_samples * batch);
        for slice in data.chunks_exact(n) {
            out.extend(self.trafo_unchecked(slice));
        }
        Ok(out)
    }

    /// Inverse transform of a stack of sample vectors
    pub fn inverse_batched(&self, data: &[Complex64], mode: InverseMode) -> Result<Vec<Complex64>> {
        let m = self.n_samples;
        let batch = batch_count(data.len(), m, "sample data")?;
        let mut out = Vec::with_capacity(self.n_grid() * batch);
        for slice in data.chunks_exact(m) {
            match mode {
                InverseMode::Adjoint => out.extend(self.adjoint_unchecked(slice)),
                InverseMode::Iterative { iterations } => out.extend(self.solve(slice, iterations)?),
            }
        }
        Ok(out)
    }

    fn trafo_unchecked(&self, f_hat: &[Complex64]) -> Vec<Complex64> {
        let [nx, ny, nz] = self.shape;
        let [ox, oy, _] = self.over;
        let mut grid = vec![Complex64::new(0.0, 0.0); self.over.iter().product()];

        // Deapodise and embed
        for k in 0..nz {
            for j in 0..ny {
                let scale_yz = self.deapod[1][j] * self.deapod[2][k];
                let row = idx3d(0, self.embed[1][j], self.embed[2][k], ox, oy);
                let src = idx3d(0, j, k, nx, ny);
                for i in 0..nx {
                    grid[row + self.embed[0][i]] = f_hat[src + i] * (self.deapod[0][i] * scale_yz);
                }
            }
        }

        self.transform_grid(&mut grid, FftDirection::Forward);

        // Interpolate at the nodes
        let [fx, fy, fz] = &self.footprint;
        let mut out = vec![Complex64::new(0.0, 0.0); self.n_samples];
        for (s, val) in out.iter_mut().enumerate() {
            let (cx, wx) = fx.sample(s);
            let (cy, wy) = fy.sample(s);
            let (cz, wz) = fz.sample(s);

            let mut acc = Complex64::new(0.0, 0.0);
            for (&iz, &wzc) in cz.iter().zip(wz.iter()) {
                for (&iy, &wyb) in cy.iter().zip(wy.iter()) {
                    let row = idx3d(0, iy, iz, ox, oy);
                    let mut acc_x = Complex64::new(0.0, 0.0);
                    for (&ix, &wxa) in cx.iter().zip(wx.iter()) {
                        acc_x += grid[row + ix] * wxa;
                    }
                    acc += acc_x * (wyb * wzc);
                }
            }
            *val = acc;
        }
        out
    }

    fn adjoint_unchecked(&self, f: &[Complex64]) -> Vec<Complex64> {
        let [nx, ny, nz] = self.shape;
        let [ox, oy, _] = self.over;
        let mut grid = vec![Complex64::new(0.0, 0.0); self.over.iter().product()];

        // Spread samples onto the oversampled grid
        let [fx, fy, fz] = &self.footprint;
        for (s, &fs) in f.iter().enumerate() {
            let (cx, wx) = fx.sample(s);
            let (cy, wy) = fy.sample(s);
            let (cz, wz) = fz.sample(s);

            for (&iz, &wzc) in cz.iter().zip(wz.iter()) {
                for (&iy, &wyb) in cy.iter().zip(wy.iter()) {
                    let row = idx3d(0, iy, iz, ox, oy);
                    let c = fs * (wyb * wzc);
                    for (&ix, &wxa) in cx.iter().zip(wx.iter()) {
                        grid[row + ix] += c * wxa;
                    }
                }
            }
        }

        self.transform_grid(&mut grid, FftDirection::Inverse);

        // Extract and deapodise
        let mut out = vec![Complex64::new(0.0, 0.0); self.n_grid()];
        for k in 0..nz {
            for j in 0..ny {
                let scale_yz = self.deapod[1][j] * self.deapod[2][k];
                let row = idx3d(0, self.embed[1][j], self.embed[2][k], ox, oy);
                let dst = idx3d(0, j, k, nx, ny);
                for i in 0..nx {
                    out[dst + i] = grid[row + self.embed[0][i]] * (self.deapod[0][i] * scale_yz);
                }
            }
        }
        out
    }

    /// Unnormalised FFT over every oversampled axis longer than 1
    fn transform_grid(&self, grid: &mut [Complex64], direction: FftDirection) {
        let dims = [self.over[0], self.over[1], self.over[2], 1];
        let mut planner = FftPlanner::<f64>::new();
        for axis in 0..3 {
            if dims[axis] > 1 {
                let fft = planner.plan_fft(dims[axis], direction);
                transform_axis(grid, dims, axis, fft.as_ref());
            }
        }
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(ReconError::ShapeMismatch { what, expected, found });
    }
    Ok(())
}

fn batch_count(total: usize, slice: usize, what: &'static str) -> Result<usize> {
    if total == 0 || total % slice != 0 {
        return Err(ReconError::ShapeMismatch {
            what,
            expected: slice * (total / slice).max(1),
            found: total,
        });
    }
    Ok(total / slice)
}
