//! 4-D image volumes
//!
//! Volumes are stored flat in Fortran (column-major) order with shape
//! `[nx, ny, nz, frames]`, so `index = x + y*nx + z*nx*ny + f*nx*ny*nz`.
//! The frame axis holds repetitions, contrasts or echoes.

use num_complex::Complex64;

use crate::error::{ReconError, Result};

/// Owned 4-D array in column-major order
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    pub data: Vec<T>,
    pub dims: [usize; 4],
}

pub type ComplexVolume = Volume<Complex64>;
pub type RealVolume = Volume<f64>;

/// Index into a 4-D array stored in Fortran order
#[inline(always)]
pub fn idx4d(i: usize, j: usize, k: usize, f: usize, dims: [usize; 4]) -> usize {
    i + dims[0] * (j + dims[1] * (k + dims[2] * f))
}

impl<T: Clone> Volume<T> {
    /// Wrap existing data, checking it matches the requested shape
    pub fn new(data: Vec<T>, dims: [usize; 4]) -> Result<Self> {
        let expected: usize = dims.iter().product();
        if data.len() != expected {
            return Err(ReconError::ShapeMismatch {
                what: "volume data",
                expected,
                found: data.len(),
            });
        }
        Ok(Self { data, dims })
    }

    pub fn filled(value: T, dims: [usize; 4]) -> Self {
        Self {
            data: vec![value; dims.iter().product()],
            dims,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn n_frames(&self) -> usize {
        self.dims[3]
    }

    /// Number of voxels in one frame (nx * ny * nz)
    pub fn frame_len(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    pub fn frame(&self, f: usize) -> &[T] {
        let n = self.frame_len();
        &self.data[f * n..(f + 1) * n]
    }

    pub fn frame_mut(&mut self, f: usize) -> &mut [T] {
        let n = self.frame_len();
        &mut self.data[f * n..(f + 1) * n]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize, f: usize) -> &T {
        &self.data[idx4d(i, j, k, f, self.dims)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, f: usize, value: T) {
        let idx = idx4d(i, j, k, f, self.dims);
        self.data[idx] = value;
    }

    /// Confirm the backing data still matches `dims`
    pub(crate) fn check_shape(&self, what: &'static str) -> Result<()> {
        let expected: usize = self.dims.iter().product();
        if self.data.len() != expected {
            return Err(ReconError::ShapeMismatch { what, expected, found: self.data.len() });
        }
        Ok(())
    }
}

impl ComplexVolume {
    pub fn zeros(dims: [usize; 4]) -> Self {
        Self::filled(Complex64::new(0.0, 0.0), dims)
    }

    /// Elementwise magnitude
    pub fn magnitude(&self) -> RealVolume {
        Volume {
            data: self.data.iter().map(|c| c.norm()).collect(),
            dims: self.dims,
        }
    }

    /// Replace NaN/Inf entries with zero, returning how many were replaced
    pub fn zero_non_finite(&mut self) -> usize {
        let mut count = 0;
        for c in self.data.iter_mut() {
            if !c.re.is_finite() || !c.im.is_finite() {
                *c = Complex64::new(0.0, 0.0);
                count += 1;
            }
        }
        count
    }
}

impl RealVolume {
    pub fn zeros(dims: [usize; 4]) -> Self {
        Self::filled(0.0, dims)
    }

    pub fn zero_non_finite(&mut self) -> usize {
        crate::utils::zero_non_finite(&mut self.data)
    }
}

/// Result of a reconstruction request
///
/// Single-channel reconstructions keep the complex image; sum-of-squares
/// combination keeps only magnitude.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageVolume {
    Complex(ComplexVolume),
    Magnitude(RealVolume),
}

impl ImageVolume {
    pub fn dims(&self) -> [usize; 4] {
        match self {
            ImageVolume::Complex(v) => v.dims,
            ImageVolume::Magnitude(v) => v.dims,
        }
    }

    /// Magnitude image, whatever the underlying representation
    pub fn magnitude(&self) -> RealVolume {
        match self {
            ImageVolume::Complex(v) => v.magnitude(),
            ImageVolume::Magnitude(v) => v.clone(),
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexVolume> {
        match self {
            ImageVolume::Complex(v) => Some(v),
            ImageVolume::Magnitude(_) => None,
        }
    }

    /// Zero any non-finite voxel before handing the image to a viewer
    pub fn zero_non_finite(&mut self) -> usize {
        match self {
            ImageVolume::Complex(v) => v.zero_non_finite(),
            ImageVolume::Magnitude(v) => v.zero_non_finite(),
        }
    }
}
