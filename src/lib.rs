//! mrsim-recon: MRI image reconstruction and susceptibility field engine
//!
//! Converts simulated k-space samples into images and computes the
//! off-resonance field induced by a susceptibility map.
//!
//! # Modules
//! - `trajectory`: k-space trajectory, channel samples, acquisitions
//! - `fft`: centered 2-D and plain 3-D FFTs using rustfft
//! - `gridding`: nearest-cell mapping of coordinates onto grids
//! - `nufft`: non-uniform Fourier transform and its iterative inverse
//! - `recon`: reconstruction modes and channel combination
//! - `kernels`: dipole and Kaiser-Bessel kernels
//! - `field`: susceptibility-to-field convolution and its cache
//! - `solvers`: CGNR
//! - `utils`: segmentation, padding, non-finite cleanup

// Core modules
pub mod error;
pub mod volume;
pub mod fft;
pub mod trajectory;
pub mod gridding;
pub mod nufft;

// Algorithm modules
pub mod recon;
pub mod kernels;
pub mod field;
pub mod solvers;
pub mod utils;

pub use error::{ReconError, Result};
pub use field::{compute_field_map, FieldMap, FieldMapCache, FieldParams, FieldUnits, SusceptibilityMap};
pub use recon::{reconstruct, ChannelCombination, ReconMode, ReconParams, ReconRequest, Strategy};
pub use trajectory::{Acquisition, ChannelSamples, Trajectory};
pub use volume::{ComplexVolume, ImageVolume, RealVolume, Volume};
