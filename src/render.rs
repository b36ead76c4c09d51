use crate::foundation::error::{TextBehindError, TextBehindResult};

pub(crate) mod cpu;
pub(crate) mod recording;
pub(crate) mod surface;

/// A surface snapshot as RGBA8 pixels.
///
/// Snapshots are **premultiplied alpha** unless `premultiplied` says otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Check that `data` holds exactly `width * height` pixels.
    pub fn validate(&self) -> TextBehindResult<()> {
        let expected = (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4);
        if self.data.len() != expected {
            return Err(TextBehindError::validation(format!(
                "frame byte len {} does not match {}x{}",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    /// Pixel at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}
