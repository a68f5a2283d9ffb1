//! Padding utilities for FFT
//!
//! Zero-pad 3D arrays to power-of-two sizes so circular FFT convolution
//! does not wrap the field of one edge onto the other.

/// Smallest power of two >= `size` (1 for 0 and 1)
pub fn next_pow2(size: usize) -> usize {
    size.max(1).next_power_of_two()
}

/// Zero-pad a 3D array to the next power of two in each dimension
///
/// The original data occupies the low corner of the padded array.
///
/// # Returns
/// (padded_data, new_nx, new_ny, new_nz)
pub fn pad_to_pow2(
    data: &[f64],
    nx: usize, ny: usize, nz: usize,
) -> (Vec<f64>, usize, usize, usize) {
    let new_nx = next_pow2(nx);
    let new_ny = next_pow2(ny);
    let new_nz = next_pow2(nz);

    let mut padded = vec![0.0; new_nx * new_ny * new_nz];

    // Copy rows along x (Fortran order: index = i + j*nx + k*nx*ny)
    for k in 0..nz {
        for j in 0..ny {
            let old_start = j * nx + k * nx * ny;
            let new_start = j * new_nx + k * new_nx * new_ny;
            padded[new_start..new_start + nx].copy_from_slice(&data[old_start..old_start + nx]);
        }
    }

    (padded, new_nx, new_ny, new_nz)
}

/// Extract original-sized region from padded array
pub fn unpad(
    padded: &[f64],
    padded_nx: usize, padded_ny: usize,
    orig_nx: usize, orig_ny: usize, orig_nz: usize,
) -> Vec<f64> {
    let mut data = vec![0.0; orig_nx * orig_ny * orig_nz];

    for k in 0..orig_nz {
        for j in 0..orig_ny {
            let padded_start = j * padded_nx + k * padded_nx * padded_ny;
            let orig_start = j * orig_nx + k * orig_nx * orig_ny;
            data[orig_start..orig_start + orig_nx]
                .copy_from_slice(&padded[padded_start..padded_start + orig_nx]);
        }
    }

    data
}
