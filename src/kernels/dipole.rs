//! Dipole kernel
//!
//! The field perturbation induced by a susceptibility distribution is, in
//! k-space, the product with
//!
//! D(k) = 1/3 - (k·B)² / |k|²
//!
//! where B is the unit main-field direction.

use crate::fft::fftfreq;

/// Value used at k = 0, where the expression above is undefined
pub const DC_VALUE: f64 = 1.0 / 3.0;

/// Generate the dipole kernel in k-space, unshifted (DC at index 0)
///
/// # Arguments
/// * `nx`, `ny`, `nz` - Array dimensions
/// * `vsx`, `vsy`, `vsz` - Voxel sizes in mm
/// * `bdir` - B0 field direction as (bx, by, bz); normalised here
///
/// # Returns
/// Flattened kernel of size nx*ny*nz in Fortran order
pub fn dipole_kernel(
    nx: usize, ny: usize, nz: usize,
    vsx: f64, vsy: f64, vsz: f64,
    bdir: (f64, f64, f64),
) -> Vec<f64> {
    let mut d = vec![0.0; nx * ny * nz];

    let kx = fftfreq(nx, vsx);
    let ky = fftfreq(ny, vsy);
    let kz = fftfreq(nz, vsz);

    let (bx, by, bz) = bdir;
    let bnorm = (bx * bx + by * by + bz * bz).sqrt();
    let (bx, by, bz) = if bnorm > 0.0 {
        (bx / bnorm, by / bnorm, bz / bnorm)
    } else {
        (0.0, 0.0, 1.0)
    };

    for k in 0..nz {
        let kz_val = kz[k];
        for j in 0..ny {
            let ky_val = ky[j];
            for i in 0..nx {
                let kx_val = kx[i];

                let k_dot_b = kx_val * bx + ky_val * by + kz_val * bz;
                let k_squared = kx_val * kx_val + ky_val * ky_val + kz_val * kz_val;

                let idx = i + j * nx + k * nx * ny;
                d[idx] = if k_squared > 1e-20 {
                    DC_VALUE - (k_dot_b * k_dot_b) / k_squared
                } else {
                    DC_VALUE
                };
            }
        }
    }

    d
}
