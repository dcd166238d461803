use image::RgbImage;
use ndarray::Array4;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::{
    prepare::{PrepareConfig, PrepareError},
    tensor::CHANNELS,
};

use super::{NaiveProvider, Provider};

pub struct ParNaiveProvider;

impl Provider for ParNaiveProvider {
    fn normalize(
        thread_pool: &ThreadPool,
        image: &RgbImage,
        config: &PrepareConfig,
    ) -> Result<Array4<f32>, PrepareError> {
        if thread_pool.current_num_threads() == 1 {
            return NaiveProvider::normalize(thread_pool, image, config);
        }
        let (width, height) = image.dimensions();
        let PrepareConfig {
            scale,
            normalization,
            ..
        } = config;

        // in [1, W, H, 3] standard order every x owns a contiguous run of H * 3 values
        let column_len = height as usize * CHANNELS;
        let mut data = vec![0_f32; width as usize * column_len];
        thread_pool.install(|| {
            data.par_chunks_mut(column_len)
                .enumerate()
                .for_each(|(x, column)| {
                    for (y, pixel) in column.chunks_mut(CHANNELS).enumerate() {
                        let raw = image.get_pixel(x as u32, y as u32);
                        for (c, value) in pixel.iter_mut().enumerate() {
                            *value = normalization.apply(c, raw[c], *scale);
                        }
                    }
                });
        });

        let tensor =
            Array4::from_shape_vec((1, width as usize, height as usize, CHANNELS), data)?;
        Ok(tensor)
    }
}
