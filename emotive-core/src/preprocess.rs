//! Frame preprocessing for the YuNet detector.

use anyhow::Result;
use emotive_utils::{compute_resize_scales, resize_exact, rgb_to_bgr_chw, timing_guard};
use image::{RgbImage, imageops::FilterType};
use tract_onnx::prelude::Tensor;

/// Detector input resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

impl InputSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `[1, 3, H, W]`
    pub fn tensor_shape(self) -> [usize; 4] {
        [1, 3, self.height as usize, self.width as usize]
    }
}

impl Default for InputSize {
    fn default() -> Self {
        Self::new(640, 640)
    }
}

/// A detector-ready tensor plus the factors that map results back to the frame.
#[derive(Debug)]
pub struct PreprocessOutput {
    pub tensor: Tensor,
    pub scale_x: f32,
    pub scale_y: f32,
    pub original_size: (u32, u32),
}

/// Resize `frame` to `input` and lay it out as a BGR CHW `[1, 3, H, W]` tensor.
pub fn preprocess_frame(frame: &RgbImage, input: InputSize) -> Result<PreprocessOutput> {
    let _guard = timing_guard("emotive_core::preprocess_frame", log::Level::Trace);
    anyhow::ensure!(
        input.width > 0 && input.height > 0,
        "input dimensions must be greater than zero"
    );
    let original_size = frame.dimensions();
    let (scale_x, scale_y) = compute_resize_scales(original_size, (input.width, input.height))?;

    let resized = resize_exact(frame, input.width, input.height, FilterType::Nearest);
    let chw = rgb_to_bgr_chw(&resized);
    let (data, offset) = chw.into_raw_vec_and_offset();
    debug_assert_eq!(offset, Some(0), "expected contiguous array");
    let tensor = Tensor::from_shape(&input.tensor_shape(), &data)
        .map_err(|e| anyhow::anyhow!("failed to build detector tensor: {e}"))?;

    Ok(PreprocessOutput {
        tensor,
        scale_x,
        scale_y,
        original_size,
    })
}
