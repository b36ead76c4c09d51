//! Foreground extraction seam.
//!
//! No segmentation model ships with this crate. The adapters here apply a result produced
//! elsewhere: an already cut-out image, or a mask.

use crate::assets::RasterImage;
use crate::foundation::error::{TextBehindError, TextBehindResult};

/// Produces the foreground of an image with the background made transparent.
///
/// The result must have the same dimensions as the input.
#[allow(async_fn_in_trait)]
pub trait BackgroundRemover {
    /// Return a copy of `image` whose background pixels are transparent.
    async fn remove_background(&self, image: &RasterImage) -> TextBehindResult<RasterImage>;
}

impl<R: BackgroundRemover + ?Sized> BackgroundRemover for &R {
    async fn remove_background(&self, image: &RasterImage) -> TextBehindResult<RasterImage> {
        (**self).remove_background(image).await
    }
}

/// Remover that returns a cut-out computed ahead of time.
#[derive(Clone, Debug)]
pub struct PrecomputedForeground {
    foreground: RasterImage,
}

impl PrecomputedForeground {
    /// Use `foreground` as the extraction result.
    pub fn new(foreground: RasterImage) -> Self {
        Self { foreground }
    }
}

impl BackgroundRemover for PrecomputedForeground {
    async fn remove_background(&self, image: &RasterImage) -> TextBehindResult<RasterImage> {
        ensure_same_size("foreground", &self.foreground, image)?;
        Ok(self.foreground.clone())
    }
}

/// Remover that keeps the parts of the source selected by a mask.
///
/// Per pixel the source is scaled by `mask alpha * mask luma`: opaque white keeps the pixel,
/// black or transparent removes it.
#[derive(Clone, Debug)]
pub struct MaskRemover {
    mask: RasterImage,
}

impl MaskRemover {
    /// Apply `mask` to every image passed to [`BackgroundRemover::remove_background`].
    pub fn new(mask: RasterImage) -> Self {
        Self { mask }
    }
}

impl BackgroundRemover for MaskRemover {
    async fn remove_background(&self, image: &RasterImage) -> TextBehindResult<RasterImage> {
        ensure_same_size("mask", &self.mask, image)?;
        let out = apply_mask(&image.rgba8_premul, &self.mask.rgba8_premul);
        tracing::debug!(width = image.width, height = image.height, "applied mask");
        RasterImage::from_premul(image.width, image.height, out)
    }
}

fn ensure_same_size(what: &str, got: &RasterImage, want: &RasterImage) -> TextBehindResult<()> {
    if got.same_size(want) {
        return Ok(());
    }
    Err(TextBehindError::extraction(format!(
        "{what} is {}x{} but the image is {}x{}",
        got.width, got.height, want.width, want.height
    )))
}

/// Scale premultiplied `src` pixels by the coverage encoded in premultiplied `mask` pixels.
///
/// With premultiplied mask bytes, Rec. 601 luma of the stored channels already equals
/// `straight luma * alpha`.
pub(crate) fn apply_mask(src: &[u8], mask: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    for (s, m) in src.chunks_exact(4).zip(mask.chunks_exact(4)) {
        let luma = (299 * u32::from(m[0]) + 587 * u32::from(m[1]) + 114 * u32::from(m[2]))
            .min(255_000);
        for &c in s {
            out.push(((u32::from(c) * luma + 127_500) / 255_000) as u8);
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/extract.rs"]
mod tests;
