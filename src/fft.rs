//! FFT wrappers using rustfft
//!
//! Provides the centered 2-D transforms used by every reconstruction mode
//! and the plain 3-D FFT/IFFT used by the field engine. Uses Fortran
//! (column-major) order indexing throughout.

use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};

use crate::error::{ReconError, Result};
use crate::volume::ComplexVolume;

/// Index into a 3D array stored in Fortran order (column-major)
/// index = x + y*nx + z*nx*ny
#[inline(always)]
pub fn idx3d(i: usize, j: usize, k: usize, nx: usize, ny: usize) -> usize {
    i + j * nx + k * nx * ny
}

/// Centered, orthonormal forward FFT over two axes of a 4-D volume
///
/// Computes `fftshift(fft(ifftshift(x)))` along `axes`, scaled by
/// `1/sqrt(n_a * n_b)`. The zero-frequency sample sits at index `n/2`
/// in both the input and the output.
pub fn centered_fft(volume: &ComplexVolume, axes: (usize, usize)) -> Result<ComplexVolume> {
    centered_transform(volume, axes, FftDirection::Forward)
}

/// Centered, orthonormal inverse FFT over two axes of a 4-D volume
///
/// Exact inverse of [`centered_fft`] for every array size.
pub fn centered_ifft(volume: &ComplexVolume, axes: (usize, usize)) -> Result<ComplexVolume> {
    centered_transform(volume, axes, FftDirection::Inverse)
}

fn centered_transform(
    volume: &ComplexVolume,
    axes: (usize, usize),
    direction: FftDirection,
) -> Result<ComplexVolume> {
    let (a, b) = axes;
    if a == b || a > 3 || b > 3 {
        return Err(ReconError::InvalidAxes(a, b));
    }
    volume.check_shape("volume passed to centered FFT")?;

    let dims = volume.dims;
    let mut out = volume.clone();
    if out.is_empty() {
        return Ok(out);
    }

    let mut planner = FftPlanner::new();
    for &axis in &[a, b] {
        let n = dims[axis];
        roll_axis(&mut out.data, dims, axis, n - n / 2);
        let fft = planner.plan_fft(n, direction);
        transform_axis(&mut out.data, dims, axis, fft.as_ref());
        roll_axis(&mut out.data, dims, axis, n / 2);
    }

    let norm = 1.0 / ((dims[a] * dims[b]) as f64).sqrt();
    for val in out.data.iter_mut() {
        *val *= norm;
    }
    Ok(out)
}

/// Apply a 1-D transform to every line along `axis`
pub(crate) fn transform_axis(data: &mut [Complex64], dims: [usize; 4], axis: usize, fft: &dyn Fft<f64>) {
    let n = dims[axis];
    let stride: usize = dims[..axis].iter().product();
    let outer: usize = dims[axis + 1..].iter().product();
    let mut scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];

    // Contiguous lines (stride 1)
    if stride == 1 {
        for line in data.chunks_exact_mut(n) {
            fft.process_with_scratch(line, &mut scratch);
        }
        return;
    }

    let mut buffer = vec![Complex64::new(0.0, 0.0); n];
    for o in 0..outer {
        for s in 0..stride {
            let base = o * n * stride + s;
            for t in 0..n {
                buffer[t] = data[base + t * stride];
            }
            fft.process_with_scratch(&mut buffer, &mut scratch);
            for t in 0..n {
                data[base + t * stride] = buffer[t];
            }
        }
    }
}

/// Circularly shift every line along `axis` forward by `shift` samples
///
/// `shift = n/2` is fftshift, `shift = n - n/2` is ifftshift.
fn roll_axis(data: &mut [Complex64], dims: [usize; 4], axis: usize, shift: usize) {
    let n = dims[axis];
    if n < 2 || shift % n == 0 {
        return;
    }
    let stride: usize = dims[..axis].iter().product();
    let outer: usize = dims[axis + 1..].iter().product();
    let mut buffer = vec![Complex64::new(0.0, 0.0); n];

    for o in 0..outer {
        for s in 0..stride {
            let base = o * n * stride + s;
            for t in 0..n {
                buffer[(t + shift) % n] = data[base + t * stride];
            }
            for t in 0..n {
                data[base + t * stride] = buffer[t];
            }
        }
    }
}

/// 3D FFT (in-place, complex-to-complex)
///
/// Transforms data in Fortran order with shape (nx, ny, nz).
/// Matches numpy.fft.fftn behavior (no normalization).
pub fn fft3d(data: &mut [Complex64], nx: usize, ny: usize, nz: usize) {
    transform_3d(data, nx, ny, nz, FftDirection::Forward);
}

/// 3D IFFT (in-place, complex-to-complex)
///
/// Transforms data in Fortran order with shape (nx, ny, nz).
/// Matches numpy.fft.ifftn behavior (includes 1/N normalization).
pub fn ifft3d(data: &mut [Complex64], nx: usize, ny: usize, nz: usize) {
    transform_3d(data, nx, ny, nz, FftDirection::Inverse);

    let n_total = (nx * ny * nz) as f64;
    for val in data.iter_mut() {
        *val /= n_total;
    }
}

fn transform_3d(data: &mut [Complex64], nx: usize, ny: usize, nz: usize, direction: FftDirection) {
    let dims = [nx, ny, nz, 1];
    let mut planner = FftPlanner::new();
    for axis in 0..3 {
        if dims[axis] > 1 {
            let fft = planner.plan_fft(dims[axis], direction);
            transform_axis(data, dims, axis, fft.as_ref());
        }
    }
}

/// Generate FFT frequency values for a given dimension
/// Matches numpy.fft.fftfreq(n, d)
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    let mut freq = vec![0.0; n];
    if n == 0 {
        return freq;
    }
    let val = 1.0 / (n as f64 * d);

    // [0, 1, ..., ceil(n/2)-1, -floor(n/2), ..., -1]
    for i in 0..(n + 1) / 2 {
        freq[i] = (i as f64) * val;
    }
    for i in (n + 1) / 2..n {
        freq[i] = ((i as i64) - (n as i64)) as f64 * val;
    }
    freq
}
