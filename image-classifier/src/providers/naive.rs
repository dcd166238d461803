use image::RgbImage;
use ndarray::Array4;
use rayon::ThreadPool;

use crate::{
    prepare::{PrepareConfig, PrepareError},
    tensor::CHANNELS,
};

use super::Provider;

pub struct NaiveProvider;

impl NaiveProvider {
    /// Sequential fill, usable without a thread pool.
    pub fn fill(image: &RgbImage, config: &PrepareConfig) -> Result<Array4<f32>, PrepareError> {
        let (width, height) = image.dimensions();
        let PrepareConfig {
            scale,
            normalization,
            ..
        } = config;
        Ok(Array4::from_shape_fn(
            (1, width as usize, height as usize, CHANNELS),
            |(_, x, y, c)| normalization.apply(c, image.get_pixel(x as u32, y as u32)[c], *scale),
        ))
    }
}

impl Provider for NaiveProvider {
    fn normalize(
        _thread_pool: &ThreadPool,
        image: &RgbImage,
        config: &PrepareConfig,
    ) -> Result<Array4<f32>, PrepareError> {
        Self::fill(image, config)
    }
}
