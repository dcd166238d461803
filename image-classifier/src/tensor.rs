//! # Tensor layouts
//!
//! Preprocessing always fills a `[batch, width, height, channel]` array first.
//! [`Layout`] selects the axis order handed to the model; the values do not change,
//! only where they live.
use ndarray::Array4;

/// Number of color channels kept from a decoded image (alpha is discarded).
pub const CHANNELS: usize = 3;

/// Axis order of a prepared tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// `[1, width, height, 3]`, indexed as `tensor[[0, x, y, c]]`.
    #[default]
    Nwhc,
    /// `[1, height, width, 3]`, the row-major layout of most TFLite models.
    Nhwc,
    /// `[1, 3, height, width]`, the layout of most ONNX ImageNet models.
    Nchw,
}

impl Layout {
    /// Shape of a tensor holding a `width` x `height` image in this layout.
    pub fn shape(&self, width: usize, height: usize) -> [usize; 4] {
        match self {
            Layout::Nwhc => [1, width, height, CHANNELS],
            Layout::Nhwc => [1, height, width, CHANNELS],
            Layout::Nchw => [1, CHANNELS, height, width],
        }
    }

    /// Reorders a `[1, W, H, 3]` tensor into this layout.
    ///
    /// The result is always in standard (row-major) memory order, so it can be
    /// flattened and handed to an engine as a contiguous buffer.
    pub fn arrange(&self, tensor: Array4<f32>) -> Array4<f32> {
        match self {
            Layout::Nwhc => tensor,
            Layout::Nhwc => tensor.permuted_axes([0, 2, 1, 3]).as_standard_layout().into_owned(),
            Layout::Nchw => tensor.permuted_axes([0, 3, 2, 1]).as_standard_layout().into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array4;

    use super::Layout;

    #[test]
    fn arrange_moves_axes_without_changing_values() {
        // 2 (width) x 3 (height) image, every element encodes its own position
        let tensor = Array4::from_shape_fn((1, 2, 3, 3), |(_, x, y, c)| {
            (x * 100 + y * 10 + c) as f32
        });

        let nhwc = Layout::Nhwc.arrange(tensor.clone());
        assert_eq!(nhwc.shape(), &Layout::Nhwc.shape(2, 3));
        assert_eq!(nhwc[[0, 2, 1, 0]], 120.0);

        let nchw = Layout::Nchw.arrange(tensor.clone());
        assert_eq!(nchw.shape(), &Layout::Nchw.shape(2, 3));
        assert_eq!(nchw[[0, 1, 2, 1]], 121.0);
        assert!(nchw.is_standard_layout());

        assert_eq!(Layout::Nwhc.arrange(tensor.clone()), tensor);
    }
}
