//! Turns an uploaded JPEG/PNG into the model's NHWC input tensor.

use image::imageops::FilterType;
use image::ImageFormat;
use ndarray::Array4;

use crate::error::DecodeError;

/// Decode `bytes`, resize to `size`x`size` with nearest-neighbour sampling and
/// lay the RGB pixels out as `(1, size, size, 3)`. Pixel values are cast to
/// f32 without normalization.
pub fn preprocess(bytes: &[u8], size: u32) -> Result<Array4<f32>, DecodeError> {
    let format = image::guess_format(bytes).map_err(|_| DecodeError::UnsupportedFormat)?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(DecodeError::UnsupportedFormat);
    }

    let img = image::load_from_memory_with_format(bytes, format)?;
    let resized = img.resize_exact(size, size, FilterType::Nearest).to_rgb8();

    let side = size as usize;
    Ok(Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32
    }))
}
