//! End-to-end reconstruction tests on simulated phantoms

mod common;

use common::*;
use mrsim_recon::nufft::Nufft;
use mrsim_recon::{
    reconstruct, Acquisition, ChannelCombination, ChannelSamples, ImageVolume, ReconError, ReconMode,
    ReconParams, ReconRequest, Trajectory,
};
use num_complex::Complex64;
use std::f64::consts::PI;

fn request(json: &str) -> ReconRequest {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_cartesian_sum_of_squares_recovers_phantom() {
    init_logger();
    let n = 32;
    let phantom = disk_phantom(n);
    let [s0, s1] = quadrature_coils(n);
    let acq = Acquisition::contiguous(
        cartesian_trajectory(n, 1),
        vec![
            cartesian_channel(0, &phantom, &s0, n),
            cartesian_channel(1, &phantom, &s1, n),
        ],
    )
    .unwrap();

    let req = request(r#"{"mode": "cartesian", "combination": {"policy": "sum_of_squares"}, "params": {"repetitions": 1}}"#);
    let image = reconstruct(&acq, &req).unwrap();
    assert!(matches!(image, ImageVolume::Magnitude(_)));
    assert_eq!(image.dims(), [n, n, 1, 1]);

    let mag = image.magnitude();
    let result = TestResult::new("cartesian SoS", &mag.data, &phantom, &full_mask(n * n));
    result.print();
    assert!(result.rmse < 1e-10, "RMSE too high: {}", result.rmse);
    assert!(result.correlation > 0.999999);
}

#[test]
fn test_cartesian_single_channel_keeps_coil_weighting() {
    let n = 16;
    let phantom = disk_phantom(n);
    let [s0, s1] = quadrature_coils(n);
    let acq = Acquisition::contiguous(
        cartesian_trajectory(n, 1),
        vec![
            cartesian_channel(0, &phantom, &s0, n),
            cartesian_channel(1, &phantom, &s1, n),
        ],
    )
    .unwrap();

    let req = request(r#"{"mode": "cartesian", "combination": {"policy": "single", "channel": 1}, "params": {"repetitions": 1}}"#);
    let image = reconstruct(&acq, &req).unwrap();
    let complex = image.as_complex().unwrap();
    for ((v, &p), &s) in complex.data.iter().zip(phantom.iter()).zip(s1.iter()) {
        assert!((v - Complex64::new(p * s, 0.0)).norm() < 1e-10);
    }
}

#[test]
fn test_cartesian_repetitions_are_frames() {
    let n = 8;
    let phantom = disk_phantom(n);
    let ones = vec![1.0; n * n];
    let doubled: Vec<f64> = phantom.iter().map(|v| 2.0 * v).collect();
    let mut samples = cartesian_channel(0, &phantom, &ones, n).samples;
    samples.extend(cartesian_channel(0, &doubled, &ones, n).samples);

    let acq = Acquisition::contiguous(cartesian_trajectory(n, 2), vec![ChannelSamples::new(0, samples)]).unwrap();
    let req = ReconRequest::new(
        ReconMode::Cartesian,
        ChannelCombination::Single { channel: 0 },
        ReconParams { repetitions: Some(2), ..Default::default() },
    );
    let image = reconstruct(&acq, &req).unwrap().magnitude();
    assert_eq!(image.dims, [n, n, 1, 2]);
    for i in 0..n * n {
        assert!((image.frame(0)[i] - phantom[i]).abs() < 1e-10);
        assert!((image.frame(1)[i] - doubled[i]).abs() < 1e-10);
    }
}

#[test]
fn test_naive_recovers_phantom_from_nyquist_sampling() {
    init_logger();
    let n = 16;
    let res = 2.0;
    let traj = nyquist_trajectory(n, res);
    let phantom = disk_phantom(n);

    let nodes: Vec<Vec<f64>> = [&traj.kx, &traj.ky]
        .iter()
        .map(|k| k.iter().map(|v| v * res / (2.0 * PI)).collect())
        .collect();
    let plan = Nufft::new(&[n, n], &nodes).unwrap();
    let image: Vec<Complex64> = phantom.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    let samples = plan.trafo(&image).unwrap();

    let acq = Acquisition::contiguous(traj, vec![ChannelSamples::new(0, samples)]).unwrap();
    let req = request(r#"{"mode": "naive", "params": {"fov": [32.0, 32.0], "resolution": [2.0, 2.0]}}"#);
    let out = reconstruct(&acq, &req).unwrap();
    assert_eq!(out.dims(), [n, n, 1, 1]);

    let mag = out.magnitude();
    let result = TestResult::new("naive", &mag.data, &phantom, &full_mask(n * n));
    result.print();
    assert!(result.rmse < 1e-7, "RMSE too high: {}", result.rmse);
}

#[test]
fn test_magnetization_timeline_pipeline() {
    // Every other timeline point is an ADC sample; the signal is My - i*Mx
    let n = 8;
    let phantom = disk_phantom(n);
    let ones = vec![1.0; n * n];
    let reference = cartesian_channel(0, &phantom, &ones, n);
    let cart = cartesian_trajectory(n, 1);

    let mut kx = Vec::new();
    let mut ky = Vec::new();
    for (&x, &y) in cart.kx.iter().zip(cart.ky.iter()) {
        kx.extend([x, 100.0]);
        ky.extend([y, -100.0]);
    }
    let kz = vec![0.0; kx.len()];
    let adc: Vec<usize> = (0..n * n).map(|i| 2 * i).collect();

    let mx: Vec<f64> = reference.samples.iter().map(|s| -s.im).collect();
    let my: Vec<f64> = reference.samples.iter().map(|s| s.re).collect();
    let channel = ChannelSamples::from_magnetization(3, &mx, &my).unwrap();

    let acq = Acquisition::from_timeline(&kx, &ky, &kz, adc, vec![channel]).unwrap();
    assert_eq!(acq.trajectory, cart);

    let req = request(r#"{"mode": "cartesian", "params": {"repetitions": 1}}"#);
    let image = reconstruct(&acq, &req).unwrap().magnitude();
    for (a, b) in image.data.iter().zip(phantom.iter()) {
        assert!((a - b).abs() < 1e-10);
    }
}

#[test]
fn test_epik_request() {
    let n = 4;
    let traj = cartesian_trajectory(n, 4);
    let samples = vec![Complex64::new(1.0, 0.0); traj.len()];
    let acq = Acquisition::contiguous(traj, vec![ChannelSamples::new(0, samples)]).unwrap();

    let req = request(r#"{"mode": "epik", "params": {"repetitions": 2, "shots": 2, "keyhole": 2, "epik_matrix": 4}}"#);
    let image = reconstruct(&acq, &req).unwrap();
    assert_eq!(image.dims(), [4, 4, 1, 4]);

    let bad = request(r#"{"mode": "epik", "params": {"repetitions": 3, "shots": 2, "keyhole": 2, "epik_matrix": 4}}"#);
    assert_eq!(
        reconstruct(&acq, &bad).unwrap_err(),
        ReconError::NotDivisible { param: "shots x subsamples", total: 64, parts: 6 }
    );

    let missing = request(r#"{"mode": "epik", "params": {"repetitions": 2, "shots": 2}}"#);
    assert_eq!(
        reconstruct(&acq, &missing).unwrap_err(),
        ReconError::MissingParameter { param: "keyhole", mode: "epik" }
    );
}

#[test]
fn test_cssme_request() {
    let traj = Trajectory::new(vec![0.0; 32], vec![0.0; 32], vec![0.0; 32]).unwrap();
    let samples: Vec<Complex64> = (0..32).map(|i| Complex64::new(i as f64, 0.0)).collect();
    let acq = Acquisition::contiguous(traj, vec![ChannelSamples::new(0, samples)]).unwrap();

    let req = request(r#"{"mode": "cssme", "combination": {"policy": "sum_of_squares"}, "params": {"echoes": 2, "phase_encodes": 4}}"#);
    let image = reconstruct(&acq, &req).unwrap();
    assert_eq!(image.dims(), [4, 4, 1, 2]);
}

#[test]
fn test_request_deserialisation() {
    let req = request(r#"{"mode": "cartesian"}"#);
    assert_eq!(req.combination, ChannelCombination::Single { channel: 0 });
    assert_eq!(req.params, ReconParams::default());
    assert_eq!(
        req.strategy().unwrap_err(),
        ReconError::MissingParameter { param: "repetitions", mode: "cartesian" }
    );

    assert!(serde_json::from_str::<ReconRequest>(r#"{"mode": "spiral"}"#).is_err());

    let roundtrip = serde_json::to_string(&req).unwrap();
    assert_eq!(request(&roundtrip), req);
}

#[test]
fn test_invalid_channel_index() {
    let n = 4;
    let samples = vec![Complex64::new(0.0, 0.0); n * n];
    let acq = Acquisition::contiguous(cartesian_trajectory(n, 1), vec![ChannelSamples::new(0, samples)]).unwrap();
    let req = request(r#"{"mode": "cartesian", "combination": {"policy": "single", "channel": 2}, "params": {"repetitions": 1}}"#);
    assert_eq!(
        reconstruct(&acq, &req).unwrap_err(),
        ReconError::InvalidChannel { index: 2, available: 1 }
    );
}
