//! Acquired samples and their k-space trajectory
//!
//! The simulator hands over a full k-space timeline, the set of timeline
//! indices at which the receiver digitises (ADC points), and one complex
//! signal per receive channel aligned with those ADC points.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ReconError, Result};

/// k-space coordinates (rad/mm) of each acquired sample, in acquisition order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub kx: Vec<f64>,
    pub ky: Vec<f64>,
    pub kz: Vec<f64>,
}

impl Trajectory {
    pub fn new(kx: Vec<f64>, ky: Vec<f64>, kz: Vec<f64>) -> Result<Self> {
        let traj = Self { kx, ky, kz };
        traj.validate()?;
        Ok(traj)
    }

    /// Select the ADC points of a full k-space timeline
    pub fn from_timeline(kx: &[f64], ky: &[f64], kz: &[f64], adc_indices: &[usize]) -> Result<Self> {
        check_len("ky timeline", kx.len(), ky.len())?;
        check_len("kz timeline", kx.len(), kz.len())?;
        if let Some(&bad) = adc_indices.iter().find(|&&i| i >= kx.len()) {
            return Err(ReconError::OutOfRange {
                param: "adc_indices",
                detail: format!("index {} beyond timeline of {} points", bad, kx.len()),
            });
        }

        let pick = |k: &[f64]| adc_indices.iter().map(|&i| k[i]).collect::<Vec<f64>>();
        Self::new(pick(kx), pick(ky), pick(kz))
    }

    pub fn len(&self) -> usize {
        self.kx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kx.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.kx.is_empty() {
            return Err(ReconError::Empty("trajectory"));
        }
        check_len("ky coordinates", self.kx.len(), self.ky.len())?;
        check_len("kz coordinates", self.kx.len(), self.kz.len())
    }
}

/// Complex samples of one receive channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSamples {
    pub channel_id: usize,
    pub samples: Vec<Complex64>,
}

impl ChannelSamples {
    pub fn new(channel_id: usize, samples: Vec<Complex64>) -> Self {
        Self { channel_id, samples }
    }

    /// Build the receive signal from simulated transverse magnetisation
    ///
    /// The signal is `S = My - i*Mx`.
    pub fn from_magnetization(channel_id: usize, mx: &[f64], my: &[f64]) -> Result<Self> {
        check_len("my samples", mx.len(), my.len())?;
        let samples = mx
            .iter()
            .zip(my.iter())
            .map(|(&x, &y)| Complex64::new(y, -x))
            .collect();
        Ok(Self { channel_id, samples })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Everything one reconstruction needs from a simulation result
///
/// Every channel and the ADC index set have exactly one entry per
/// trajectory sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    pub trajectory: Trajectory,
    pub adc_indices: Vec<usize>,
    pub channels: Vec<ChannelSamples>,
}

impl Acquisition {
    pub fn new(trajectory: Trajectory, adc_indices: Vec<usize>, channels: Vec<ChannelSamples>) -> Result<Self> {
        trajectory.validate()?;
        check_len("adc index set", trajectory.len(), adc_indices.len())?;
        for ch in &channels {
            check_len("channel samples", trajectory.len(), ch.len())?;
        }
        Ok(Self { trajectory, adc_indices, channels })
    }

    /// Build from a full k-space timeline and ADC-aligned channel samples
    pub fn from_timeline(
        kx: &[f64],
        ky: &[f64],
        kz: &[f64],
        adc_indices: Vec<usize>,
        channels: Vec<ChannelSamples>,
    ) -> Result<Self> {
        let trajectory = Trajectory::from_timeline(kx, ky, kz, &adc_indices)?;
        Self::new(trajectory, adc_indices, channels)
    }

    /// Acquisition whose ADC points are simply `0..n`
    pub fn contiguous(trajectory: Trajectory, channels: Vec<ChannelSamples>) -> Result<Self> {
        let adc_indices = (0..trajectory.len()).collect();
        Self::new(trajectory, adc_indices, channels)
    }

    pub fn n_samples(&self) -> usize {
        self.trajectory.len()
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Channel by position in the channel list
    pub fn channel(&self, index: usize) -> Result<&ChannelSamples> {
        self.channels.get(index).ok_or(ReconError::InvalidChannel {
            index,
            available: self.channels.len(),
        })
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(ReconError::ShapeMismatch { what, expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trajectory_length_mismatch() {
        let err = Trajectory::new(vec![0.0; 3], vec![0.0; 2], vec![0.0; 3]).unwrap_err();
        assert_eq!(err, ReconError::ShapeMismatch { what: "ky coordinates", expected: 3, found: 2 });
        assert_eq!(Trajectory::new(vec![], vec![], vec![]).unwrap_err(), ReconError::Empty("trajectory"));
    }

    #[test]
    fn test_from_timeline_selects_adc_points() {
        let kx = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ky = [10.0, 11.0, 12.0, 13.0, 14.0];
        let kz = [0.0; 5];
        let traj = Trajectory::from_timeline(&kx, &ky, &kz, &[1, 3, 4]).unwrap();
        assert_eq!(traj.kx, vec![1.0, 3.0, 4.0]);
        assert_eq!(traj.ky, vec![11.0, 13.0, 14.0]);

        assert!(matches!(
            Trajectory::from_timeline(&kx, &ky, &kz, &[5]),
            Err(ReconError::OutOfRange { param: "adc_indices", .. })
        ));
    }

    #[test]
    fn test_signal_from_magnetization() {
        let ch = ChannelSamples::from_magnetization(2, &[1.0, 0.0], &[0.0, 3.0]).unwrap();
        assert_eq!(ch.channel_id, 2);
        assert_eq!(ch.samples, vec![Complex64::new(0.0, -1.0), Complex64::new(3.0, 0.0)]);
        assert!(ChannelSamples::from_magnetization(0, &[1.0], &[]).is_err());
    }

    #[test]
    fn test_acquisition_validation() {
        let traj = Trajectory::new(vec![0.0, 1.0], vec![0.0, 0.0], vec![0.0, 0.0]).unwrap();
        let good = ChannelSamples::new(0, vec![Complex64::new(1.0, 0.0); 2]);
        let bad = ChannelSamples::new(1, vec![Complex64::new(1.0, 0.0); 3]);

        let acq = Acquisition::contiguous(traj.clone(), vec![good.clone()]).unwrap();
        assert_eq!(acq.n_samples(), 2);
        assert_eq!(acq.adc_indices, vec![0, 1]);
        assert_eq!(acq.channel(0).unwrap().channel_id, 0);
        assert_eq!(acq.channel(3).unwrap_err(), ReconError::InvalidChannel { index: 3, available: 1 });

        assert!(Acquisition::contiguous(traj.clone(), vec![good, bad]).is_err());
        assert!(Acquisition::new(traj, vec![0], vec![]).is_err());
    }
}
