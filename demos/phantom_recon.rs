//! Simulate a two-coil Cartesian acquisition of a disk phantom, reconstruct
//! it with sum-of-squares, and compute the field map of a susceptibility
//! sphere.
//!
//! Run with `RUST_LOG=debug cargo run --example phantom_recon`.

use std::f64::consts::PI;

use log::info;
use mrsim_recon::fft::{centered_fft, idx3d};
use mrsim_recon::{
    compute_field_map, reconstruct, Acquisition, ChannelCombination, ChannelSamples, ComplexVolume,
    FieldParams, ReconMode, ReconParams, ReconRequest, SusceptibilityMap, Trajectory,
};
use num_complex::Complex64;

const N: usize = 64;

/// `value` inside a ball of `radius` voxels around `center`, 0 elsewhere
fn ball(dims: [usize; 3], center: [f64; 3], radius: f64, value: f64) -> Vec<f64> {
    let [nx, ny, nz] = dims;
    let mut map = vec![0.0; nx * ny * nz];
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let d = [i as f64 - center[0], j as f64 - center[1], k as f64 - center[2]];
                if d.iter().map(|v| v * v).sum::<f64>() <= radius * radius {
                    map[idx3d(i, j, k, nx, ny)] = value;
                }
            }
        }
    }
    map
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let c = (N as f64 - 1.0) / 2.0;
    let phantom = ball([N, N, 1], [c, c, 0.0], N as f64 * 0.35, 1.0);

    // Integer Cartesian coordinates, x fastest
    let half = (N / 2) as f64;
    let (mut kx, mut ky) = (Vec::with_capacity(N * N), Vec::with_capacity(N * N));
    for j in 0..N {
        for i in 0..N {
            kx.push(i as f64 - half);
            ky.push(j as f64 - half);
        }
    }
    let trajectory = Trajectory::new(kx, ky, vec![0.0; N * N])?;

    let mut channels = Vec::new();
    for coil in 0..2 {
        let weighted: Vec<Complex64> = phantom
            .iter()
            .enumerate()
            .map(|(idx, &v)| {
                let theta = 0.5 * PI * (idx % N) as f64 / (N as f64 - 1.0);
                let s = if coil == 0 { theta.cos() } else { theta.sin() };
                Complex64::new(v * s, 0.0)
            })
            .collect();
        let kspace = centered_fft(&ComplexVolume::new(weighted, [N, N, 1, 1])?, (0, 1))?;
        channels.push(ChannelSamples::new(coil, kspace.data));
    }
    let acquisition = Acquisition::contiguous(trajectory, channels)?;

    let request = ReconRequest::new(
        ReconMode::Cartesian,
        ChannelCombination::SumOfSquares,
        ReconParams { repetitions: Some(1), ..Default::default() },
    );
    let image = reconstruct(&acquisition, &request)?.magnitude();
    let max_err = image
        .data
        .iter()
        .zip(phantom.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    info!("sum-of-squares image {:?}, max error {:.3e}", image.dims, max_err);

    let n = 32;
    let center = n as f64 / 2.0;
    let chi = ball([n, n, n], [center; 3], 5.0, -9.05);
    let map = SusceptibilityMap::new(chi, [n, n, n], [1.0, 1.0, 1.0])?;
    let field = compute_field_map(&map, &FieldParams::default())?;
    let (lo, hi) = field
        .data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    info!("field map {:?} in {:?}: [{:.3}, {:.3}]", field.dims, field.units, lo, hi);

    Ok(())
}
