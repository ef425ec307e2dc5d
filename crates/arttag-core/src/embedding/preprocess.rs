//! Image preprocessing for CLIP embedding generation.
//!
//! CLIP ViT-B/32 expects:
//! - Shortest side resized to 224 (bicubic), then a centered 224×224 crop
//! - Channel order: RGB
//! - Normalization: (pixel/255 - mean) / std with the CLIP channel statistics
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel).
const NORM_MEAN: [f32; CHANNELS] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std (per-channel).
const NORM_STD: [f32; CHANNELS] = [0.268_629_54, 0.261_302_58, 0.275_777_1];

/// Preprocess an image for CLIP inference.
///
/// Resizes the shortest side to `image_size`, center-crops to a square,
/// normalizes each channel and returns an NCHW tensor for ONNX Runtime.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let short_side = width.min(height).max(1) as f32;
    let scale = image_size as f32 / short_side;
    let resized_w = ((width as f32 * scale).round() as u32).max(image_size);
    let resized_h = ((height as f32 * scale).round() as u32).max(image_size);

    let resized = image.resize_exact(
        resized_w,
        resized_h,
        image::imageops::FilterType::CatmullRom,
    );
    let left = (resized_w - image_size) / 2;
    let top = (resized_h - image_size) / 2;
    let rgb = resized
        .crop_imm(left, top, image_size, image_size)
        .to_rgb8();

    let size = image_size as usize;
    Array4::from_shape_fn((1, CHANNELS, size, size), |(_, c, y, x)| {
        let value = rgb.get_pixel(x as u32, y as u32)[c];
        (value as f32 / 255.0 - NORM_MEAN[c]) / NORM_STD[c]
    })
}
