use std::sync::Arc;

use crate::foundation::error::{TextBehindError, TextBehindResult};

pub(crate) mod color;
pub(crate) mod decode;
pub(crate) mod font;
pub(crate) mod source;

/// Decoded raster image at its natural size.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap premultiplied RGBA8 pixels, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> TextBehindResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(TextBehindError::validation(format!(
                "raster byte len {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Build from straight-alpha RGBA8 pixels.
    pub fn from_straight(width: u32, height: u32, mut rgba8: Vec<u8>) -> TextBehindResult<Self> {
        crate::foundation::core::premultiply_rgba8_in_place(&mut rgba8);
        Self::from_premul(width, height, rgba8)
    }

    /// A `width x height` image filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = crate::foundation::core::Rgba8Premul::from_straight_rgba(
            rgba[0], rgba[1], rgba[2], rgba[3],
        )
        .to_array();
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        }
    }

    /// Return `true` when both images share the same dimensions.
    pub fn same_size(&self, other: &RasterImage) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Premultiplied pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.rgba8_premul.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}
