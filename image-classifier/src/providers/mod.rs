mod naive;
mod parallel;

pub use naive::*;
pub use parallel::*;

use image::RgbImage;
use ndarray::Array4;
use rayon::ThreadPool;

use crate::prepare::{PrepareConfig, PrepareError};

pub type DefaultProvider = ParNaiveProvider;

/// A trait that has to be implemented by all the execution providers.
///
/// A provider fills the `[1, width, height, 3]` tensor of an image. Every pixel is
/// independent of the others, so providers are free to pick any iteration order,
/// but all of them must produce bit-identical results for the same input.
pub trait Provider {
    /// Normalizes every channel of every pixel of `image` as described by `config`.
    ///
    /// The layout of `config` is not applied: the result is always `[1, W, H, 3]`.
    /// Callers must reject empty images beforehand.
    fn normalize(
        thread_pool: &ThreadPool,
        image: &RgbImage,
        config: &PrepareConfig,
    ) -> Result<Array4<f32>, PrepareError>;
}
