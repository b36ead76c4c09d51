//! Output encoding of composited frames.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use image::ImageEncoder as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::unpremultiply_rgba8_in_place;
use crate::foundation::error::{TextBehindError, TextBehindResult};
use crate::render::FrameRGBA;

/// JPEG quality used for `jpg` output.
pub const JPEG_QUALITY: u8 = 92;

/// Encoded output format.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG, straight alpha.
    #[default]
    Png,
    /// JPEG, alpha composited over black.
    #[serde(alias = "jpeg")]
    #[value(alias = "jpeg")]
    Jpg,
    /// Lossless WebP, straight alpha.
    Webp,
}

impl OutputFormat {
    /// MIME type of encoded bytes.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = TextBehindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::Webp),
            other => Err(TextBehindError::validation(format!(
                "unsupported output format \"{other}\" (expected png, jpg or webp)"
            ))),
        }
    }
}

/// Encoded image bytes tagged with their format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    /// Format of `bytes`.
    pub format: OutputFormat,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// MIME type of the encoded bytes.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `data:` URL carrying the bytes in base64.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Encode a surface snapshot.
///
/// PNG and WebP keep the alpha channel (straight). JPEG has none: the premultiplied color is
/// written as is, which is the frame composited over black.
pub fn encode_frame(frame: &FrameRGBA, format: OutputFormat) -> TextBehindResult<EncodedImage> {
    frame.validate()?;
    let (w, h) = (frame.width, frame.height);
    let mut bytes = Vec::new();

    let res = match format {
        OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut bytes).write_image(
            &straight_rgba(frame),
            w,
            h,
            image::ExtendedColorType::Rgba8,
        ),
        OutputFormat::Webp => image::codecs::webp::WebPEncoder::new_lossless(&mut bytes)
            .write_image(&straight_rgba(frame), w, h, image::ExtendedColorType::Rgba8),
        OutputFormat::Jpg => image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut bytes,
            JPEG_QUALITY,
        )
        .write_image(&rgb_over_black(frame), w, h, image::ExtendedColorType::Rgb8),
    };
    res.map_err(|e| TextBehindError::encode(format!("{format} encoding failed: {e}")))?;

    tracing::debug!(%format, width = w, height = h, bytes = bytes.len(), "encoded frame");
    Ok(EncodedImage { format, bytes })
}

fn straight_rgba(frame: &FrameRGBA) -> Vec<u8> {
    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut data);
    }
    data
}

fn rgb_over_black(frame: &FrameRGBA) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((frame.data.len() / 4) * 3);
    for px in frame.data.chunks_exact(4) {
        if frame.premultiplied {
            rgb.extend_from_slice(&px[..3]);
        } else {
            let a = u16::from(px[3]);
            rgb.extend(
                px[..3]
                    .iter()
                    .map(|&c| ((u16::from(c) * a + 127) / 255) as u8),
            );
        }
    }
    rgb
}

#[cfg(test)]
#[path = "../tests/unit/encode.rs"]
mod tests;
