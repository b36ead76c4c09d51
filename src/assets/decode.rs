use anyhow::Context;

use crate::assets::RasterImage;
use crate::foundation::core::premultiply_rgba8_in_place;
use crate::foundation::error::TextBehindResult;

/// Decode encoded image bytes (any format the `image` crate reads) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> TextBehindResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    RasterImage::from_premul(width, height, rgba8_premul)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
