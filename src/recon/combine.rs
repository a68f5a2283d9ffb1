//! Per-channel reconstruction and channel combination

use log::{debug, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{ChannelCombination, Strategy};
use crate::error::{ReconError, Result};
use crate::trajectory::Acquisition;
use crate::volume::{ComplexVolume, ImageVolume, RealVolume};

/// Reconstruct `acquisition` with `strategy` and merge the channels
///
/// Sample-count arithmetic is checked once up front so a malformed request
/// fails before any channel is transformed.
///
/// # Returns
/// The complex image of the selected channel for [`ChannelCombination::Single`],
/// or the sum-of-squares magnitude for [`ChannelCombination::SumOfSquares`]
pub fn reconstruct_channels(
    acquisition: &Acquisition,
    strategy: &Strategy,
    combination: ChannelCombination,
) -> Result<ImageVolume> {
    strategy.check_sample_count(acquisition.n_samples())?;
    let trajectory = &acquisition.trajectory;

    let mut image = match combination {
        ChannelCombination::Single { channel } => {
            let ch = acquisition.channel(channel)?;
            debug!("reconstructing channel {} (id {})", channel, ch.channel_id);
            ImageVolume::Complex(strategy.reconstruct(&ch.samples, trajectory)?)
        }
        ChannelCombination::SumOfSquares => {
            if acquisition.channels.is_empty() {
                return Err(ReconError::Empty("channel list"));
            }
            debug!("reconstructing {} channel(s) for sum of squares", acquisition.n_channels());

            #[cfg(feature = "parallel")]
            let images: Result<Vec<ComplexVolume>> = acquisition
                .channels
                .par_iter()
                .map(|ch| strategy.reconstruct(&ch.samples, trajectory))
                .collect();
            #[cfg(not(feature = "parallel"))]
            let images: Result<Vec<ComplexVolume>> = acquisition
                .channels
                .iter()
                .map(|ch| strategy.reconstruct(&ch.samples, trajectory))
                .collect();

            ImageVolume::Magnitude(sum_of_squares(&images?)?)
        }
    };

    let zeroed = image.zero_non_finite();
    if zeroed > 0 {
        warn!("{} non-finite voxel(s) in reconstructed image set to zero", zeroed);
    }
    Ok(image)
}

/// Root-sum-of-squares magnitude over channel images of equal shape
///
/// # Arguments
/// * `images` - One complex image per channel
///
/// # Returns
/// sqrt(Σ_c |I_c|²) voxel-wise, with the shared shape
pub fn sum_of_squares(images: &[ComplexVolume]) -> Result<RealVolume> {
    let first = images.first().ok_or(ReconError::Empty("channel list"))?;
    let dims = first.dims;
    let mut result = RealVolume::zeros(dims);

    for img in images {
        if img.dims != dims {
            return Err(ReconError::ShapeMismatch {
                what: "channel image",
                expected: first.len(),
                found: img.len(),
            });
        }
        for (acc, v) in result.data.iter_mut().zip(img.data.iter()) {
            *acc += v.norm_sqr();
        }
    }

    for v in result.data.iter_mut() {
        *v = v.sqrt();
    }
    Ok(result)
}
