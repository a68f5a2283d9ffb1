//! Common test utilities for mrsim-recon integration tests

#![allow(dead_code)]

use std::f64::consts::PI;

use mrsim_recon::fft::{centered_fft, idx3d};
use mrsim_recon::{ChannelSamples, ComplexVolume, Trajectory};
use num_complex::Complex64;

/// Install env_logger once so `RUST_LOG=debug` shows library logs
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Compute RMSE between two arrays, only within mask (non-zero values)
pub fn rmse(a: &[f64], b: &[f64], mask: &[u8]) -> f64 {
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    for i in 0..a.len() {
        if mask[i] > 0 {
            let diff = a[i] - b[i];
            sum_sq += diff * diff;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    (sum_sq / count as f64).sqrt()
}

/// Compute NRMSE (normalized by range of ground truth within mask)
pub fn nrmse(a: &[f64], b: &[f64], mask: &[u8]) -> f64 {
    let rmse_val = rmse(a, b, mask);

    let mut min_b = f64::INFINITY;
    let mut max_b = f64::NEG_INFINITY;
    for i in 0..b.len() {
        if mask[i] > 0 {
            min_b = min_b.min(b[i]);
            max_b = max_b.max(b[i]);
        }
    }

    let range = max_b - min_b;
    if range == 0.0 {
        return 0.0;
    }
    rmse_val / range
}

/// Compute Pearson correlation coefficient within mask
pub fn correlation(a: &[f64], b: &[f64], mask: &[u8]) -> f64 {
    let mut sum_a = 0.0;
    let mut sum_b = 0.0;
    let mut sum_ab = 0.0;
    let mut sum_a2 = 0.0;
    let mut sum_b2 = 0.0;
    let mut n = 0usize;

    for i in 0..a.len() {
        if mask[i] > 0 {
            sum_a += a[i];
            sum_b += b[i];
            sum_ab += a[i] * b[i];
            sum_a2 += a[i] * a[i];
            sum_b2 += b[i] * b[i];
            n += 1;
        }
    }

    if n == 0 {
        return 0.0;
    }

    let n = n as f64;
    let numerator = n * sum_ab - sum_a * sum_b;
    let denominator = ((n * sum_a2 - sum_a * sum_a) * (n * sum_b2 - sum_b * sum_b)).sqrt();

    if denominator == 0.0 {
        return 0.0;
    }

    numerator / denominator
}

/// Mask selecting every voxel
pub fn full_mask(n: usize) -> Vec<u8> {
    vec![1; n]
}

/// Metrics of a reconstruction against a ground truth
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub rmse: f64,
    pub nrmse: f64,
    pub correlation: f64,
}

impl TestResult {
    pub fn new(name: &str, output: &[f64], ground_truth: &[f64], mask: &[u8]) -> Self {
        TestResult {
            name: name.to_string(),
            rmse: rmse(output, ground_truth, mask),
            nrmse: nrmse(output, ground_truth, mask),
            correlation: correlation(output, ground_truth, mask),
        }
    }

    pub fn print(&self) {
        println!("{:<15} RMSE={:.6}  NRMSE={:.4}  r={:.4}",
            self.name, self.rmse, self.nrmse, self.correlation);
    }
}

/// Sphere-valued map on an `nx x ny x nz` grid, 0 outside `radius`
pub fn sphere(nx: usize, ny: usize, nz: usize, center: (f64, f64, f64), radius: f64, value: f64) -> Vec<f64> {
    let mut map = vec![0.0; nx * ny * nz];
    let r2 = radius * radius;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let dx = i as f64 - center.0;
                let dy = j as f64 - center.1;
                let dz = k as f64 - center.2;
                if dx * dx + dy * dy + dz * dz <= r2 {
                    map[idx3d(i, j, k, nx, ny)] = value;
                }
            }
        }
    }
    map
}

/// Single-slice [`sphere`]
pub fn disk(nx: usize, ny: usize, center: (f64, f64), radius: f64, value: f64) -> Vec<f64> {
    sphere(nx, ny, 1, (center.0, center.1, 0.0), radius, value)
}

/// `n x n` disk phantom with a brighter inner disk, one frame
pub fn disk_phantom(n: usize) -> Vec<f64> {
    let c = (n as f64 - 1.0) / 2.0;
    let outer = disk(n, n, (c, c), n as f64 * 0.35, 1.0);
    let inner = disk(n, n, (c - n as f64 * 0.1, c), n as f64 * 0.12, 1.0);
    outer.iter().zip(inner.iter()).map(|(a, b)| a + b).collect()
}

/// Fully sampled Cartesian trajectory with integer coordinates
/// `-n/2 .. n - n/2`, x fastest, repeated `repetitions` times
pub fn cartesian_trajectory(n: usize, repetitions: usize) -> Trajectory {
    let half = (n / 2) as f64;
    let mut kx = Vec::with_capacity(n * n * repetitions);
    let mut ky = Vec::with_capacity(n * n * repetitions);
    for _ in 0..repetitions {
        for j in 0..n {
            for i in 0..n {
                kx.push(i as f64 - half);
                ky.push(j as f64 - half);
            }
        }
    }
    let kz = vec![0.0; kx.len()];
    Trajectory::new(kx, ky, kz).unwrap()
}

/// Fully sampled Cartesian trajectory in rad/mm for grid `n` at resolution `res`
pub fn nyquist_trajectory(n: usize, res: f64) -> Trajectory {
    let half = (n / 2) as f64;
    let step = 2.0 * PI / (n as f64 * res);
    let mut kx = Vec::with_capacity(n * n);
    let mut ky = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            kx.push((i as f64 - half) * step);
            ky.push((j as f64 - half) * step);
        }
    }
    let kz = vec![0.0; n * n];
    Trajectory::new(kx, ky, kz).unwrap()
}

/// Cartesian k-space samples of `image` (`n x n`) weighted by `sensitivity`
pub fn cartesian_channel(channel_id: usize, image: &[f64], sensitivity: &[f64], n: usize) -> ChannelSamples {
    let weighted: Vec<Complex64> = image
        .iter()
        .zip(sensitivity.iter())
        .map(|(&v, &s)| Complex64::new(v * s, 0.0))
        .collect();
    let volume = ComplexVolume::new(weighted, [n, n, 1, 1]).unwrap();
    let kspace = centered_fft(&volume, (0, 1)).unwrap();
    ChannelSamples::new(channel_id, kspace.data)
}

/// Two coil profiles with `s0² + s1² = 1` everywhere
pub fn quadrature_coils(n: usize) -> [Vec<f64>; 2] {
    let mut s0 = Vec::with_capacity(n * n);
    let mut s1 = Vec::with_capacity(n * n);
    for _j in 0..n {
        for i in 0..n {
            let theta = 0.5 * PI * i as f64 / (n as f64 - 1.0);
            s0.push(theta.cos());
            s1.push(theta.sin());
        }
    }
    [s0, s1]
}
