//! # Image preprocessing
//!
//! Maps a decoded image into the numeric tensor a classification model expects.
//!
//! [`preprocess`] is the pure core: every channel value `c` of the pixel at `(x, y)`
//! is transformed according to the configured [`Normalization`] and written to
//! `tensor[[0, x, y, channel]]`. [`prepare_image`] additionally applies a [`Resize`]
//! profile to a [`DynamicImage`] first.
mod resize;

pub use resize::Resize;

use image::{DynamicImage, GenericImageView, RgbImage};
use log::debug;
use ndarray::{Array4, ShapeError};
use rayon::ThreadPool;
use thiserror::Error;

use crate::{
    providers::{NaiveProvider, Provider},
    tensor::Layout,
};

/// Per-channel mean of the ImageNet training set, in `[0, 1]` units.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel standard deviation of the ImageNet training set, in `[0, 1]` units.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];
/// Maps `0..=255` channel values into `[0, 1]`.
pub const DEFAULT_SCALE: f32 = 1.0 / 255.0;

#[derive(Error, Debug)]
pub enum PrepareError {
    #[error("The image must have a positive size, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("The prepared data does not fit the tensor shape: {0}")]
    Shape(#[from] ShapeError),
}

/// How a scaled channel value is shifted after multiplying by [`PrepareConfig::scale`].
///
/// Two revisions of the mean/std pipeline disagree on operator precedence, and no
/// revision says which one a given model was trained with. Both are available;
/// pick the one matching the model you integrate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// `c * scale - mean[ch] / std[ch]`
    ShiftByRatio { mean: [f32; 3], std: [f32; 3] },
    /// `(c * scale - mean[ch]) / std[ch]`
    Standardize { mean: [f32; 3], std: [f32; 3] },
    /// `c * scale`, i.e. values in `[0, 1]` with the default scale.
    UnitRange,
}

impl Normalization {
    /// [`Normalization::ShiftByRatio`] with the ImageNet constants.
    pub fn imagenet_shift_by_ratio() -> Self {
        Normalization::ShiftByRatio {
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// [`Normalization::Standardize`] with the ImageNet constants.
    pub fn imagenet_standardize() -> Self {
        Normalization::Standardize {
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// Transforms a single raw channel value.
    ///
    /// `channel` must be `0`, `1` or `2` (R, G, B).
    #[inline]
    pub fn apply(&self, channel: usize, value: u8, scale: f32) -> f32 {
        let scaled = value as f32 * scale;
        match self {
            Normalization::ShiftByRatio { mean, std } => scaled - mean[channel] / std[channel],
            Normalization::Standardize { mean, std } => (scaled - mean[channel]) / std[channel],
            Normalization::UnitRange => scaled,
        }
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Normalization::imagenet_shift_by_ratio()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrepareConfig {
    pub scale: f32,
    pub normalization: Normalization,
    /// Only used by [`prepare_image`]; [`preprocess`] takes the image as it is.
    pub resize: Resize,
    pub layout: Layout,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            normalization: Normalization::default(),
            resize: Resize::None,
            layout: Layout::default(),
        }
    }
}

impl PrepareConfig {
    /// Bilinear resize to 224x224, values in `[0, 1]`.
    pub fn unit_range() -> Self {
        Self {
            normalization: Normalization::UnitRange,
            resize: Resize::Bilinear {
                width: 224,
                height: 224,
            },
            ..Default::default()
        }
    }

    /// Center-cropped 244x244 thumbnail, ImageNet mean/std shift.
    pub fn thumbnail() -> Self {
        Self {
            normalization: Normalization::imagenet_shift_by_ratio(),
            resize: Resize::Thumbnail {
                width: 244,
                height: 244,
            },
            ..Default::default()
        }
    }
}

/// Converts an RGB image into a `[1, W, H, 3]` tensor (or the configured [`Layout`]).
///
/// This is a pure function of its inputs: the same image and configuration always
/// give a bit-identical tensor. The [`Resize`] profile of the configuration is not
/// applied here, see [`prepare_image`].
pub fn preprocess(image: &RgbImage, config: &PrepareConfig) -> Result<Array4<f32>, PrepareError> {
    check_dimensions(image.width(), image.height())?;
    let tensor = NaiveProvider::fill(image, config)?;
    Ok(config.layout.arrange(tensor))
}

/// Same as [`preprocess`], but fills the tensor with the chosen execution provider.
pub fn preprocess_with_provider<P: Provider>(
    thread_pool: &ThreadPool,
    image: &RgbImage,
    config: &PrepareConfig,
) -> Result<Array4<f32>, PrepareError> {
    check_dimensions(image.width(), image.height())?;
    let tensor = P::normalize(thread_pool, image, config)?;
    Ok(config.layout.arrange(tensor))
}

/// Resizes a decoded image according to the configured profile and preprocesses it.
///
/// Alpha is discarded.
pub fn prepare_image(
    image: &DynamicImage,
    config: &PrepareConfig,
) -> Result<Array4<f32>, PrepareError> {
    check_dimensions(image.width(), image.height())?;
    let resized = config.resize.apply(image);
    debug!(
        "Resized {}x{} image to {}x{}",
        image.width(),
        image.height(),
        resized.width(),
        resized.height()
    );
    preprocess(&resized, config)
}

/// [`prepare_image`] with the chosen execution provider.
pub fn prepare_image_with_provider<P: Provider>(
    thread_pool: &ThreadPool,
    image: &DynamicImage,
    config: &PrepareConfig,
) -> Result<Array4<f32>, PrepareError> {
    check_dimensions(image.width(), image.height())?;
    let resized = config.resize.apply(image);
    preprocess_with_provider::<P>(thread_pool, &resized, config)
}

fn check_dimensions(width: u32, height: u32) -> Result<(), PrepareError> {
    if width == 0 || height == 0 {
        return Err(PrepareError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Normalization, IMAGENET_MEAN, IMAGENET_STD};

    #[test]
    fn precedence_of_the_two_mean_std_variants() {
        let scale = 1.0 / 255.0;
        let shift = Normalization::imagenet_shift_by_ratio();
        let standardize = Normalization::imagenet_standardize();

        // white pixel, red channel
        let expected_shift = 1.0 - IMAGENET_MEAN[0] / IMAGENET_STD[0];
        let expected_standardize = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!((shift.apply(0, 255, scale) - expected_shift).abs() < 1e-6);
        assert!((standardize.apply(0, 255, scale) - expected_standardize).abs() < 1e-6);
        assert!((shift.apply(0, 255, scale) - standardize.apply(0, 255, scale)).abs() > 1.0);
    }

    #[test]
    fn unit_range_ignores_channel() {
        let scale = 1.0 / 255.0;
        for channel in 0..3 {
            assert_eq!(Normalization::UnitRange.apply(channel, 0, scale), 0.0);
            assert_eq!(Normalization::UnitRange.apply(channel, 255, scale), 1.0);
        }
    }
}
