//! Segmented multi-echo ("cssme") reconstruction
//!
//! The readout is ordered phase-encode major, then echo, then readout
//! point: flat index `pe * (echoes * nread) + echo * nread + r`. Each echo
//! becomes one frame with x = readout and y = phase encode.

use num_complex::Complex64;

use crate::error::{checked_product, ensure_count, ReconError, Result};
use crate::fft::centered_ifft;
use crate::utils::segment_len;
use crate::volume::{idx4d, ComplexVolume};

#[derive(Debug, Clone, PartialEq)]
pub struct CssmeParams {
    pub echoes: usize,
    pub phase_encodes: usize,
}

impl CssmeParams {
    /// Number of readout lines, `phase_encodes * echoes`
    pub fn n_lines(&self) -> Result<usize> {
        let echoes = ensure_count("echoes", self.echoes)?;
        let pe = ensure_count("phase_encodes", self.phase_encodes)?;
        checked_product("phase_encodes x echoes", &[pe, echoes])
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.n_lines().map(|_| ())
    }

    /// Readout length implied by `n_samples`
    pub fn readout_len(&self, n_samples: usize) -> Result<usize> {
        let nread = segment_len(n_samples, self.n_lines()?, "phase_encodes x echoes")?;
        if nread == 0 {
            return Err(ReconError::Empty("sample sequence"));
        }
        Ok(nread)
    }
}

/// Reorder the flat sample sequence into k-space, shape `[nread, pe, 1, echoes]`
pub fn reorder(samples: &[Complex64], params: &CssmeParams) -> Result<ComplexVolume> {
    let nread = params.readout_len(samples.len())?;
    let (pe, echoes) = (params.phase_encodes, params.echoes);
    let dims = [nread, pe, 1, echoes];
    let mut kspace = ComplexVolume::zeros(dims);

    for (line, chunk) in samples.chunks_exact(nread).enumerate() {
        let (p, e) = (line / echoes, line % echoes);
        let start = idx4d(0, p, 0, e, dims);
        kspace.data[start..start + nread].copy_from_slice(chunk);
    }
    Ok(kspace)
}

/// Reconstruct one channel; output shape `[nread, phase_encodes, 1, echoes]`
pub fn reconstruct(samples: &[Complex64], params: &CssmeParams) -> Result<ComplexVolume> {
    let kspace = reorder(samples, params)?;
    centered_ifft(&kspace, (0, 1))
}
