//! Susceptibility-induced field maps
//!
//! The field offset of a susceptibility distribution χ (ppm) is the dipole
//! convolution `Δb = F⁻¹[D · F[χ]]`, evaluated on the map zero-padded to the
//! next power of two per axis and cropped back, then scaled into Tesla,
//! Hertz, or rad/s.
//!
//! The computation is deterministic, so results are cached by the caller in
//! a [`FieldMapCache`] keyed by a BLAKE3 hash of the map and parameters.

use std::f64::consts::PI;

use log::{debug, info, warn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, ReconError, Result};
use crate::fft::{fft3d, idx3d, ifft3d};
use crate::kernels::dipole_kernel;
use crate::utils::{pad_to_pow2, unpad, zero_non_finite};

/// Proton gyromagnetic ratio γ/2π in Hz/T
pub const GYROMAGNETIC_RATIO_HZ_PER_T: f64 = 42.576e6;

/// Units of a computed field map
///
/// The simulator adds the field map to its off-resonance term in rad/s,
/// which is why [`FieldParams`] defaults to `RadiansPerSecond`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUnits {
    Tesla,
    Hertz,
    RadiansPerSecond,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldParams {
    /// Static field strength in Tesla
    pub b0: f64,
    /// Gyromagnetic ratio γ/2π in Hz/T
    pub gamma: f64,
    /// Main field direction, normalised before use
    pub b0_dir: (f64, f64, f64),
    pub units: FieldUnits,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            b0: 1.5,
            gamma: GYROMAGNETIC_RATIO_HZ_PER_T,
            b0_dir: (0.0, 0.0, 1.0),
            units: FieldUnits::RadiansPerSecond,
        }
    }
}

impl FieldParams {
    /// Factor from the dimensionless (ppm) convolution result to `units`
    pub fn scale(&self) -> f64 {
        let tesla = 1e-6 * self.b0;
        match self.units {
            FieldUnits::Tesla => tesla,
            FieldUnits::Hertz => tesla * self.gamma,
            FieldUnits::RadiansPerSecond => 2.0 * PI * tesla * self.gamma,
        }
    }

    fn validate(&self) -> Result<()> {
        ensure_positive("b0", self.b0)?;
        ensure_positive("gamma", self.gamma)?;
        let (x, y, z) = self.b0_dir;
        let norm = (x * x + y * y + z * z).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(ReconError::OutOfRange {
                param: "b0_dir",
                detail: format!("direction {:?} has no usable length", self.b0_dir),
            });
        }
        Ok(())
    }
}

/// 3-D susceptibility distribution in ppm, Fortran order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SusceptibilityMap {
    pub data: Vec<f64>,
    pub dims: [usize; 3],
    /// Voxel size in mm
    pub voxel_size: [f64; 3],
    /// Position of voxel (0, 0, 0) in mm
    pub offset: [f64; 3],
}

impl SusceptibilityMap {
    pub fn new(data: Vec<f64>, dims: [usize; 3], voxel_size: [f64; 3]) -> Result<Self> {
        let expected = dims.iter().product::<usize>();
        if expected == 0 {
            return Err(ReconError::Empty("susceptibility map"));
        }
        if data.len() != expected {
            return Err(ReconError::ShapeMismatch {
                what: "susceptibility map",
                expected,
                found: data.len(),
            });
        }
        for &vs in &voxel_size {
            ensure_positive("voxel_size", vs)?;
        }
        Ok(Self { data, dims, voxel_size, offset: [0.0; 3] })
    }

    pub fn with_offset(mut self, offset: [f64; 3]) -> Self {
        self.offset = offset;
        self
    }

    /// BLAKE3 hash of data and geometry
    pub fn content_hash(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        self.hash_into(&mut hasher);
        hasher.finalize()
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        for &d in &self.dims {
            hasher.update(&(d as u64).to_le_bytes());
        }
        for &v in self.voxel_size.iter().chain(self.offset.iter()) {
            hasher.update(&v.to_le_bytes());
        }
        for &v in &self.data {
            hasher.update(&v.to_le_bytes());
        }
    }
}

/// Field offset per voxel, same grid as the source map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    pub data: Vec<f64>,
    pub dims: [usize; 3],
    pub units: FieldUnits,
}

impl FieldMap {
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[idx3d(i, j, k, self.dims[0], self.dims[1])]
    }
}

/// Compute the field offset induced by `map`
///
/// # Arguments
/// * `map` - Susceptibility in ppm; NaN/Inf voxels are treated as 0
/// * `params` - Field strength, direction and output units
///
/// # Returns
/// Field map with the dims of `map`, in `params.units`
pub fn compute_field_map(map: &SusceptibilityMap, params: &FieldParams) -> Result<FieldMap> {
    params.validate()?;
    let [nx, ny, nz] = map.dims;
    if map.data.len() != nx * ny * nz {
        return Err(ReconError::ShapeMismatch {
            what: "susceptibility map",
            expected: nx * ny * nz,
            found: map.data.len(),
        });
    }

    let mut chi = map.data.clone();
    let replaced = zero_non_finite(&mut chi);
    if replaced > 0 {
        warn!("{} non-finite susceptibility value(s) set to zero", replaced);
    }

    let (padded, pnx, pny, pnz) = pad_to_pow2(&chi, nx, ny, nz);
    debug!("field map: {:?} padded to [{}, {}, {}]", map.dims, pnx, pny, pnz);

    let [vsx, vsy, vsz] = map.voxel_size;
    let d = dipole_kernel(pnx, pny, pnz, vsx, vsy, vsz, params.b0_dir);

    let mut spectrum: Vec<Complex64> = padded.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    fft3d(&mut spectrum, pnx, pny, pnz);
    for (s, &dk) in spectrum.iter_mut().zip(d.iter()) {
        *s *= dk;
    }
    ifft3d(&mut spectrum, pnx, pny, pnz);

    let field_padded: Vec<f64> = spectrum.iter().map(|c| c.re).collect();
    let mut data = unpad(&field_padded, pnx, pny, nx, ny, nz);

    let scale = params.scale();
    for v in data.iter_mut() {
        *v *= scale;
    }
    let replaced = zero_non_finite(&mut data);
    if replaced > 0 {
        warn!("{} non-finite field value(s) set to zero", replaced);
    }

    info!("computed {:?} field map for B0 = {} T", params.units, params.b0);
    Ok(FieldMap { data, dims: map.dims, units: params.units })
}

/// Caller-owned cache for the most recent field map
///
/// Holds one entry keyed by the BLAKE3 hash of the susceptibility map and
/// the field parameters; a different map or parameter set recomputes.
#[derive(Debug, Default)]
pub struct FieldMapCache {
    entry: Option<(blake3::Hash, FieldMap)>,
}

impl FieldMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached field map for `map`/`params`, computing it on a miss
    pub fn get_or_compute(&mut self, map: &SusceptibilityMap, params: &FieldParams) -> Result<&FieldMap> {
        let key = cache_key(map, params);
        let hit = matches!(&self.entry, Some((k, _)) if *k == key);
        if hit {
            debug!("field map cache hit");
        } else {
            let field = compute_field_map(map, params)?;
            self.entry = Some((key, field));
        }
        match &self.entry {
            Some((_, field)) => Ok(field),
            None => Err(ReconError::Empty("field map cache")),
        }
    }

    pub fn is_cached_for(&self, map: &SusceptibilityMap, params: &FieldParams) -> bool {
        matches!(&self.entry, Some((k, _)) if *k == cache_key(map, params))
    }

    pub fn cached(&self) -> Option<&FieldMap> {
        self.entry.as_ref().map(|(_, f)| f)
    }

    /// Drop the cached entry, e.g. after the phantom's tissue assignment changed
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

fn cache_key(map: &SusceptibilityMap, params: &FieldParams) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    map.hash_into(&mut hasher);
    let (x, y, z) = params.b0_dir;
    for v in [params.b0, params.gamma, x, y, z] {
        hasher.update(&v.to_le_bytes());
    }
    let units: u8 = match params.units {
        FieldUnits::Tesla => 0,
        FieldUnits::Hertz => 1,
        FieldUnits::RadiansPerSecond => 2,
    };
    hasher.update(&[units]);
    hasher.finalize()
}
