use image::{imageops::FilterType, DynamicImage, GenericImageView, RgbImage};

/// Resize strategy applied by [`prepare_image`](super::prepare_image) before normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resize {
    /// Keep the decoded size.
    #[default]
    None,
    /// Stretch to exactly `width` x `height` with a bilinear filter.
    Bilinear { width: u32, height: u32 },
    /// Scale until the image covers `width` x `height`, keeping the aspect ratio,
    /// then crop the center.
    Thumbnail { width: u32, height: u32 },
}

impl Resize {
    /// Target size of the profile, if it has one.
    pub fn target(&self) -> Option<(u32, u32)> {
        match *self {
            Resize::None => None,
            Resize::Bilinear { width, height } | Resize::Thumbnail { width, height } => {
                Some((width, height))
            }
        }
    }

    /// Applies the profile and drops the alpha channel.
    pub fn apply(&self, image: &DynamicImage) -> RgbImage {
        match *self {
            Resize::None => image.to_rgb8(),
            Resize::Bilinear { width, height } => image
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgb8(),
            Resize::Thumbnail { width, height } => {
                let (crop_w, crop_h) = crop_size_for_aspect_ratio(image, width, height);
                crop_image_from_center(image, crop_w, crop_h)
                    .resize_exact(width, height, FilterType::Triangle)
                    .to_rgb8()
            }
        }
    }
}

/// Crop an image from its center
fn crop_image_from_center(
    image: &DynamicImage,
    crop_w: u32,
    crop_h: u32,
) -> DynamicImage {
    let (width, height) = image.dimensions();
    let start_x = width.saturating_sub(crop_w) / 2;
    let start_y = height.saturating_sub(crop_h) / 2;
    image.crop_imm(start_x, start_y, crop_w, crop_h)
}

/// Largest window of the source with the aspect ratio of `target_w` x `target_h`.
///
/// Cropping before resizing keeps the intermediate image no larger than the source.
fn crop_size_for_aspect_ratio(image: &DynamicImage, target_w: u32, target_h: u32) -> (u32, u32) {
    let (width, height) = image.dimensions();
    let (width, height) = (width as u64, height as u64);
    let (target_w, target_h) = (target_w.max(1) as u64, target_h.max(1) as u64);
    if width * target_h > height * target_w {
        // wider than the target: keep the full height
        let crop_w = (height * target_w + target_h / 2) / target_h;
        (crop_w.clamp(1, width) as u32, height as u32)
    } else {
        let crop_h = (width * target_h + target_w / 2) / target_w;
        (width as u32, crop_h.clamp(1, height) as u32)
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

    use super::Resize;

    #[test]
    fn bilinear_stretches_to_target() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(300, 100));
        let resized = Resize::Bilinear {
            width: 224,
            height: 224,
        }
        .apply(&image);
        assert_eq!(resized.dimensions(), (224, 224));
    }

    #[test]
    fn thumbnail_keeps_the_center() {
        // left and right thirds are black, the middle third is white
        let image = RgbImage::from_fn(300, 100, |x, _| {
            if (100..200).contains(&x) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let resized = Resize::Thumbnail {
            width: 50,
            height: 50,
        }
        .apply(&DynamicImage::ImageRgb8(image));

        assert_eq!(resized.dimensions(), (50, 50));
        assert_eq!(resized.get_pixel(25, 25), &Rgb([255, 255, 255]));
    }

    #[test]
    fn thumbnail_of_a_thin_strip() {
        // 1 pixel wide, only the middle rows are white
        let image = RgbImage::from_fn(1, 3000, |_, y| {
            if (1400..1600).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let resized = Resize::Thumbnail {
            width: 244,
            height: 244,
        }
        .apply(&DynamicImage::ImageRgb8(image));

        assert_eq!(resized.dimensions(), (244, 244));
        assert_eq!(resized.get_pixel(122, 122), &Rgb([255, 255, 255]));
    }

    #[test]
    fn thumbnail_crop_window_matches_target_ratio() {
        let wide = DynamicImage::new_rgb8(300, 100);
        assert_eq!(super::crop_size_for_aspect_ratio(&wide, 244, 244), (100, 100));

        let tall = DynamicImage::new_rgb8(1, 3000);
        assert_eq!(super::crop_size_for_aspect_ratio(&tall, 244, 244), (1, 1));

        let landscape_target = DynamicImage::new_rgb8(400, 400);
        assert_eq!(
            super::crop_size_for_aspect_ratio(&landscape_target, 200, 100),
            (400, 200)
        );
    }

    #[test]
    fn none_drops_alpha_only() {
        let image = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 0]));
        let resized = Resize::None.apply(&DynamicImage::ImageRgba8(image));
        assert_eq!(resized.dimensions(), (3, 2));
        assert_eq!(resized.get_pixel(2, 1), &Rgb([10, 20, 30]));
        assert_eq!(Resize::None.target(), None);
    }
}
