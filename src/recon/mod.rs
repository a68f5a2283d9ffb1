//! Image reconstruction
//!
//! A [`ReconRequest`] names a mode, a channel combination policy, and the
//! parameters the mode needs. It is validated into a [`Strategy`] before any
//! array work starts; the strategy is then applied per channel by the
//! combiner.
//!
//! Modes:
//! - `naive`: iterative NUFFT on an arbitrary 2-D trajectory
//! - `cartesian`: nearest-cell gridding per repetition
//! - `epik`: multi-shot keyhole temporal reconstruction
//! - `cssme`: segmented multi-echo reordering

pub mod naive;
pub mod cartesian;
pub mod epik;
pub mod cssme;
pub mod combine;

pub use naive::NaiveParams;
pub use cartesian::CartesianParams;
pub use epik::EpikParams;
pub use cssme::CssmeParams;
pub use combine::{reconstruct_channels, sum_of_squares};

use log::info;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_count, ReconError, Result};
use crate::nufft::DEFAULT_ITERATIONS;
use crate::trajectory::{Acquisition, Trajectory};
use crate::volume::{ComplexVolume, ImageVolume};

/// Largest in-plane grid side any mode will allocate
pub const MAX_GRID_SIDE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconMode {
    Naive,
    Cartesian,
    Epik,
    Cssme,
}

impl ReconMode {
    pub fn name(self) -> &'static str {
        match self {
            ReconMode::Naive => "naive",
            ReconMode::Cartesian => "cartesian",
            ReconMode::Epik => "epik",
            ReconMode::Cssme => "cssme",
        }
    }
}

/// How receive channels are merged into one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum ChannelCombination {
    /// Reconstruct only the channel at this position
    Single { channel: usize },
    /// sqrt(Σ |I_c|²) over all channels
    SumOfSquares,
}

impl Default for ChannelCombination {
    fn default() -> Self {
        ChannelCombination::Single { channel: 0 }
    }
}

/// Mode parameters as supplied by the caller
///
/// Which fields are required depends on the mode:
/// - naive: `fov`, `resolution` (`nufft_iterations` defaults to 10)
/// - cartesian: `repetitions`
/// - epik: `repetitions` (shot cycles), `shots` (segments per cycle),
///   `keyhole` (`epik_matrix` defaults to 64)
/// - cssme: `echoes`, `phase_encodes`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconParams {
    pub fov: Option<[f64; 2]>,
    pub resolution: Option<[f64; 2]>,
    pub repetitions: Option<usize>,
    pub shots: Option<usize>,
    pub keyhole: Option<usize>,
    pub echoes: Option<usize>,
    pub phase_encodes: Option<usize>,
    pub nufft_iterations: Option<usize>,
    pub epik_matrix: Option<usize>,
}

/// A complete reconstruction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconRequest {
    pub mode: ReconMode,
    #[serde(default)]
    pub combination: ChannelCombination,
    #[serde(default)]
    pub params: ReconParams,
}

impl ReconRequest {
    pub fn new(mode: ReconMode, combination: ChannelCombination, params: ReconParams) -> Self {
        Self { mode, combination, params }
    }

    /// Validate the parameters for the selected mode
    pub fn strategy(&self) -> Result<Strategy> {
        let p = &self.params;
        let mode = self.mode.name();
        let require = |value: Option<usize>, param: &'static str| -> Result<usize> {
            let v = value.ok_or(ReconError::MissingParameter { param, mode })?;
            ensure_count(param, v)
        };

        let strategy = match self.mode {
            ReconMode::Naive => Strategy::Naive(NaiveParams {
                fov: p.fov.ok_or(ReconError::MissingParameter { param: "fov", mode })?,
                resolution: p.resolution.ok_or(ReconError::MissingParameter { param: "resolution", mode })?,
                iterations: p.nufft_iterations.unwrap_or(DEFAULT_ITERATIONS),
            }),
            ReconMode::Cartesian => Strategy::Cartesian(CartesianParams {
                repetitions: require(p.repetitions, "repetitions")?,
            }),
            ReconMode::Epik => Strategy::Epik(EpikParams {
                shots: require(p.repetitions, "repetitions")?,
                subsamples: require(p.shots, "shots")?,
                keyhole: require(p.keyhole, "keyhole")?,
                matrix: p.epik_matrix.unwrap_or(epik::DEFAULT_MATRIX),
            }),
            ReconMode::Cssme => Strategy::Cssme(CssmeParams {
                echoes: require(p.echoes, "echoes")?,
                phase_encodes: require(p.phase_encodes, "phase_encodes")?,
            }),
        };
        strategy.validate()?;
        Ok(strategy)
    }
}

/// A validated reconstruction algorithm with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Naive(NaiveParams),
    Cartesian(CartesianParams),
    Epik(EpikParams),
    Cssme(CssmeParams),
}

impl Strategy {
    pub fn mode(&self) -> ReconMode {
        match self {
            Strategy::Naive(_) => ReconMode::Naive,
            Strategy::Cartesian(_) => ReconMode::Cartesian,
            Strategy::Epik(_) => ReconMode::Epik,
            Strategy::Cssme(_) => ReconMode::Cssme,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Strategy::Naive(p) => p.validate(),
            Strategy::Cartesian(p) => ensure_count("repetitions", p.repetitions).map(|_| ()),
            Strategy::Epik(p) => p.validate(),
            Strategy::Cssme(p) => p.validate(),
        }
    }

    /// Check the segment arithmetic for `n_samples` samples
    pub fn check_sample_count(&self, n_samples: usize) -> Result<()> {
        if n_samples == 0 {
            return Err(ReconError::Empty("sample sequence"));
        }
        match self {
            Strategy::Naive(p) => p.grid_size().map(|_| ()),
            Strategy::Cartesian(p) => p.grid_side(n_samples).map(|_| ()),
            Strategy::Epik(p) => p.segment_len(n_samples).map(|_| ()),
            Strategy::Cssme(p) => p.readout_len(n_samples).map(|_| ()),
        }
    }

    /// Reconstruct the samples of a single channel
    pub fn reconstruct(&self, samples: &[Complex64], trajectory: &Trajectory) -> Result<ComplexVolume> {
        match self {
            Strategy::Naive(p) => naive::reconstruct(samples, trajectory, p),
            Strategy::Cartesian(p) => cartesian::reconstruct(samples, trajectory, p),
            Strategy::Epik(p) => epik::reconstruct(samples, trajectory, p),
            Strategy::Cssme(p) => cssme::reconstruct(samples, p),
        }
    }
}

/// Validate `request` and reconstruct `acquisition`
pub fn reconstruct(acquisition: &Acquisition, request: &ReconRequest) -> Result<ImageVolume> {
    let strategy = request.strategy()?;
    let image = reconstruct_channels(acquisition, &strategy, request.combination)?;
    info!(
        "{} reconstruction finished: {:?} from {} sample(s), {} channel(s)",
        request.mode.name(),
        image.dims(),
        acquisition.n_samples(),
        acquisition.n_channels()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameters() {
        let req = ReconRequest::new(ReconMode::Epik, ChannelCombination::SumOfSquares, ReconParams {
            repetitions: Some(2),
            shots: Some(4),
            ..Default::default()
        });
        assert_eq!(
            req.strategy().unwrap_err(),
            ReconError::MissingParameter { param: "keyhole", mode: "epik" }
        );

        let req = ReconRequest::new(ReconMode::Naive, ChannelCombination::default(), ReconParams::default());
        assert_eq!(
            req.strategy().unwrap_err(),
            ReconError::MissingParameter { param: "fov", mode: "naive" }
        );
    }

    #[test]
    fn test_non_positive_parameters() {
        let req = ReconRequest::new(ReconMode::Cartesian, ChannelCombination::default(), ReconParams {
            repetitions: Some(0),
            ..Default::default()
        });
        assert!(matches!(req.strategy(), Err(ReconError::NonPositive { param: "repetitions", .. })));

        let req = ReconRequest::new(ReconMode::Naive, ChannelCombination::default(), ReconParams {
            fov: Some([256.0, -1.0]),
            resolution: Some([4.0, 4.0]),
            ..Default::default()
        });
        assert!(matches!(req.strategy(), Err(ReconError::NonPositive { param: "fov", .. })));

        let req = ReconRequest::new(ReconMode::Naive, ChannelCombination::default(), ReconParams {
            fov: Some([256.0, 256.0]),
            resolution: Some([4.0, 4.0]),
            nufft_iterations: Some(0),
            ..Default::default()
        });
        assert!(matches!(req.strategy(), Err(ReconError::NonPositive { param: "nufft_iterations", .. })));
    }

    #[test]
    fn test_epik_parameter_mapping() {
        let req = ReconRequest::new(ReconMode::Epik, ChannelCombination::default(), ReconParams {
            repetitions: Some(3),
            shots: Some(4),
            keyhole: Some(8),
            ..Default::default()
        });
        assert_eq!(
            req.strategy().unwrap(),
            Strategy::Epik(EpikParams { shots: 3, subsamples: 4, keyhole: 8, matrix: 64 })
        );
    }

    #[test]
    fn test_defaults_applied() {
        let req = ReconRequest::new(ReconMode::Naive, ChannelCombination::default(), ReconParams {
            fov: Some([128.0, 128.0]),
            resolution: Some([2.0, 2.0]),
            ..Default::default()
        });
        match req.strategy().unwrap() {
            Strategy::Naive(p) => assert_eq!(p.iterations, 10),
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_oversized_requests_are_errors() {
        let req = ReconRequest::new(ReconMode::Epik, ChannelCombination::default(), ReconParams {
            repetitions: Some(usize::MAX / 2),
            shots: Some(4),
            keyhole: Some(8),
            ..Default::default()
        });
        assert!(matches!(req.strategy(), Err(ReconError::OutOfRange { param: "shots x subsamples", .. })));

        let req = ReconRequest::new(ReconMode::Cssme, ChannelCombination::default(), ReconParams {
            echoes: Some(usize::MAX),
            phase_encodes: Some(2),
            ..Default::default()
        });
        assert!(matches!(req.strategy(), Err(ReconError::OutOfRange { param: "phase_encodes x echoes", .. })));

        let req = ReconRequest::new(ReconMode::Naive, ChannelCombination::default(), ReconParams {
            fov: Some([1e30, 1e30]),
            resolution: Some([1.0, 1.0]),
            ..Default::default()
        });
        assert!(matches!(req.strategy(), Err(ReconError::OutOfRange { param: "fov", .. })));
    }

    #[test]
    fn test_check_sample_count() {
        let s = Strategy::Cssme(CssmeParams { echoes: 2, phase_encodes: 3 });
        assert!(s.check_sample_count(12).is_ok());
        assert!(matches!(s.check_sample_count(13), Err(ReconError::NotDivisible { .. })));
        assert_eq!(s.check_sample_count(0).unwrap_err(), ReconError::Empty("sample sequence"));
        assert_eq!(s.mode(), ReconMode::Cssme);
    }
}
