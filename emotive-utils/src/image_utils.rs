use anyhow::Result;
use image::{RgbImage, imageops, imageops::FilterType};
use ndarray::{Array3, Array4};

/// Resize an RGB frame to exactly `width` x `height`.
///
/// Returns the input unchanged (cloned) when it already has the target size.
pub fn resize_exact(image: &RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, filter)
}

/// Shrink an image to fit inside `max_w` x `max_h`, preserving aspect ratio.
///
/// Images that already fit are returned as-is; nothing is ever enlarged.
pub fn fit_within(image: &RgbImage, max_w: u32, max_h: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w <= max_w && h <= max_h {
        return image.clone();
    }
    let scale = (max_w as f32 / w as f32).min(max_h as f32 / h as f32);
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    imageops::thumbnail(image, new_w, new_h)
}

/// Copy the `(x, y, w, h)` window out of `image`, clipped to its bounds.
///
/// Returns `None` when the clipped window is empty.
pub fn crop_clamped(image: &RgbImage, x: u32, y: u32, w: u32, h: u32) -> Option<RgbImage> {
    let (img_w, img_h) = image.dimensions();
    if x >= img_w || y >= img_h {
        return None;
    }
    let w = w.min(img_w - x);
    let h = h.min(img_h - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(imageops::crop_imm(image, x, y, w, h).to_image())
}

/// Convert an RGB image into a BGR CHW array matching OpenCV's `blobFromImage`.
pub fn rgb_to_bgr_chw(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut array = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        array[(0, yi, xi)] = pixel[2] as f32;
        array[(1, yi, xi)] = pixel[1] as f32;
        array[(2, yi, xi)] = pixel[0] as f32;
    }
    array
}

/// Convert an RGB image to a `[1, 1, H, W]` grayscale array with raw 0-255 intensities.
pub fn to_gray_tensor(image: &RgbImage) -> Array4<f32> {
    let gray = imageops::grayscale(image);
    let (width, height) = gray.dimensions();
    let mut array = Array4::<f32>::zeros((1, 1, height as usize, width as usize));
    for (x, y, pixel) in gray.enumerate_pixels() {
        array[(0, 0, y as usize, x as usize)] = pixel[0] as f32;
    }
    array
}

/// Scale factors that map model-space coordinates back to the original image.
pub fn compute_resize_scales(original: (u32, u32), target: (u32, u32)) -> Result<(f32, f32)> {
    let (orig_w, orig_h) = original;
    let (target_w, target_h) = target;
    anyhow::ensure!(
        target_w > 0 && target_h > 0,
        "target dimensions must be non-zero"
    );
    anyhow::ensure!(
        orig_w > 0 && orig_h > 0,
        "original dimensions must be non-zero"
    );
    Ok((
        orig_w as f32 / target_w as f32,
        orig_h as f32 / target_h as f32,
    ))
}
