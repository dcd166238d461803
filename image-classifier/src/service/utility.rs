use std::path::Path;

use image::DynamicImage;
use ndarray::Array4;

use crate::prepare::{prepare_image, PrepareConfig};

use super::ServiceError;

/// Read and decode an image file. The format is guessed from the file content.
pub fn read_image<P>(path: P) -> Result<DynamicImage, ServiceError>
where
    P: AsRef<Path>,
{
    Ok(image::open(path)?)
}

/// Read an image and prepare it with the given configuration.
///
/// It will return an array4 with a batch dimension equal to 1.
pub fn read_and_prepare_image<P>(
    path: P,
    config: &PrepareConfig,
) -> Result<Array4<f32>, ServiceError>
where
    P: AsRef<Path>,
{
    let image = read_image(path)?;
    Ok(prepare_image(&image, config)?)
}
