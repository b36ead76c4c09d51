use crate::assets::RasterImage;
use crate::foundation::core::{Affine, Point, Vec2, premul_over_px};
use crate::foundation::error::{TextBehindError, TextBehindResult};
use crate::render::FrameRGBA;
use crate::render::surface::{
    DrawingSurface, StateStack, SurfaceProvider, SurfaceState, TextAlign, TextBaseline,
    text_anchor_offset,
};
use crate::text::FontSpec;

/// Advance of one character, as a fraction of the font size, for block-stamped text.
const BLOCK_ADVANCE: f64 = 0.6;
const BLOCK_ASCENT: f64 = 0.8;
const BLOCK_DESCENT: f64 = 0.2;

/// One `fill_text` call together with the state it was issued under.
#[derive(Clone, Debug, PartialEq)]
pub struct TextDraw {
    /// Text passed to `fill_text`.
    pub text: String,
    /// User-space anchor x.
    pub x: f64,
    /// User-space anchor y.
    pub y: f64,
    /// Surface state at the time of the call.
    pub state: SurfaceState,
}

impl TextDraw {
    /// Anchor in surface pixels after applying the transform.
    pub fn device_anchor(&self) -> Point {
        self.state.transform * Point::new(self.x, self.y)
    }

    /// Angle of the text's reading direction on the surface, in radians.
    pub fn device_angle(&self) -> f64 {
        let c = self.state.transform.as_coeffs();
        c[1].atan2(c[0])
    }
}

/// A call recorded by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    /// `save()`.
    Save,
    /// `restore()`.
    Restore,
    /// `set_transform(..)`.
    SetTransform(Affine),
    /// `rotate(radians)`.
    Rotate(f64),
    /// `translate(dx, dy)`.
    Translate(Vec2),
    /// `set_font(..)`, in CSS shorthand.
    SetFont(String),
    /// `set_fill_color(..)`, verbatim.
    SetFillColor(String),
    /// `set_text_align(..)`.
    SetTextAlign(TextAlign),
    /// `set_text_baseline(..)`.
    SetTextBaseline(TextBaseline),
    /// `draw_image(..)`.
    DrawImage {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// User-space x.
        x: f64,
        /// User-space y.
        y: f64,
        /// Transform at the time of the call.
        transform: Affine,
    },
    /// `fill_text(..)`.
    FillText(TextDraw),
}

/// In-memory surface that records every call, for tests and debugging.
///
/// Images are composited with source-over at integer offsets (translation-only transforms).
/// Text is not shaped: each non-empty `fill_text` stamps a solid block in the fill color covering
/// the box the text would occupy (`0.6 * size` per character by `size`), mapped through the
/// transform. That is enough to check placement and layering without fonts.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    states: StateStack,
    ops: Vec<SurfaceOp>,
    pixels: Vec<u8>,
}

impl RecordingSurface {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            states: StateStack::default(),
            ops: Vec::new(),
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Recorded calls, in order.
    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    /// Recorded `fill_text` calls, in order.
    pub fn text_draws(&self) -> impl Iterator<Item = &TextDraw> {
        self.ops.iter().filter_map(|op| match op {
            SurfaceOp::FillText(t) => Some(t),
            _ => None,
        })
    }

    fn blend_px(&mut self, x: u32, y: u32, src: [u8; 4]) {
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let dst = [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ];
        self.pixels[i..i + 4].copy_from_slice(&premul_over_px(dst, src));
    }

    fn stamp_text_block(&mut self, text: &str, x: f64, y: f64) {
        let state = self.states.current().clone();
        let size = state.font.size_px;
        let chars = text.chars().count() as f64;
        let width = BLOCK_ADVANCE * size * chars;
        let ascent = BLOCK_ASCENT * size;
        let descent = BLOCK_DESCENT * size;
        let off = text_anchor_offset(
            width,
            ascent,
            descent,
            ascent,
            state.text_align,
            state.text_baseline,
        );

        let x0 = x + off.x;
        let y0 = y + off.y;
        let corners = [
            Point::new(x0, y0),
            Point::new(x0 + width, y0),
            Point::new(x0, y0 + size),
            Point::new(x0 + width, y0 + size),
        ]
        .map(|p| state.transform * p);
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let src = state.fill.premultiplied().to_array();
        for py in 0..self.height {
            let cy = f64::from(py) + 0.5;
            if cy < min_y || cy > max_y {
                continue;
            }
            for px in 0..self.width {
                let cx = f64::from(px) + 0.5;
                if cx >= min_x && cx <= max_x {
                    self.blend_px(px, py, src);
                }
            }
        }
    }
}

impl DrawingSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn states(&self) -> &StateStack {
        &self.states
    }

    fn states_mut(&mut self) -> &mut StateStack {
        &mut self.states
    }

    fn save(&mut self) {
        self.ops.push(SurfaceOp::Save);
        self.states.save();
    }

    fn restore(&mut self) {
        self.ops.push(SurfaceOp::Restore);
        self.states.restore();
    }

    fn set_transform(&mut self, transform: Affine) {
        self.ops.push(SurfaceOp::SetTransform(transform));
        self.states.current_mut().transform = transform;
    }

    fn rotate(&mut self, radians: f64) {
        self.ops.push(SurfaceOp::Rotate(radians));
        let state = self.states.current_mut();
        state.transform = state.transform * Affine::rotate(radians);
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.ops.push(SurfaceOp::Translate(Vec2::new(dx, dy)));
        let state = self.states.current_mut();
        state.transform = state.transform * Affine::translate(Vec2::new(dx, dy));
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.ops.push(SurfaceOp::SetFont(font.to_string()));
        self.states.current_mut().font = font.clone();
    }

    fn set_fill_color(&mut self, color: &str) {
        self.ops.push(SurfaceOp::SetFillColor(color.to_string()));
        match crate::assets::color::parse_css_color(color) {
            Ok(fill) => self.states.current_mut().fill = fill,
            Err(reason) => {
                tracing::warn!(color = %color, %reason, "ignoring unparseable fill color");
            }
        }
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.ops.push(SurfaceOp::SetTextAlign(align));
        self.states.current_mut().text_align = align;
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.ops.push(SurfaceOp::SetTextBaseline(baseline));
        self.states.current_mut().text_baseline = baseline;
    }

    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64) -> TextBehindResult<()> {
        let transform = self.states.current().transform;
        self.ops.push(SurfaceOp::DrawImage {
            width: image.width,
            height: image.height,
            x,
            y,
            transform,
        });

        let t = (transform * Affine::translate(Vec2::new(x, y))).as_coeffs();
        let is_translation = t[0] == 1.0 && t[1] == 0.0 && t[2] == 0.0 && t[3] == 1.0;
        if !is_translation || t[4].fract() != 0.0 || t[5].fract() != 0.0 {
            return Err(TextBehindError::validation(
                "recording surface only composites images at integer translations",
            ));
        }
        let (ox, oy) = (t[4] as i64, t[5] as i64);

        for sy in 0..image.height {
            let dy = oy + i64::from(sy);
            if dy < 0 || dy >= i64::from(self.height) {
                continue;
            }
            for sx in 0..image.width {
                let dx = ox + i64::from(sx);
                if dx < 0 || dx >= i64::from(self.width) {
                    continue;
                }
                if let Some(src) = image.pixel(sx, sy) {
                    self.blend_px(dx as u32, dy as u32, src);
                }
            }
        }
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> TextBehindResult<()> {
        self.ops.push(SurfaceOp::FillText(TextDraw {
            text: text.to_string(),
            x,
            y,
            state: self.states.current().clone(),
        }));
        if !text.is_empty() {
            self.stamp_text_block(text, x, y);
        }
        Ok(())
    }

    fn snapshot(&mut self) -> TextBehindResult<FrameRGBA> {
        Ok(FrameRGBA {
            width: self.width,
            height: self.height,
            data: self.pixels.clone(),
            premultiplied: true,
        })
    }
}

/// Provider of [`RecordingSurface`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordingSurfaceProvider;

impl SurfaceProvider for RecordingSurfaceProvider {
    type Surface = RecordingSurface;

    fn create_surface(&self, width: u32, height: u32) -> TextBehindResult<RecordingSurface> {
        if width == 0 || height == 0 {
            return Err(TextBehindError::surface_unavailable(format!(
                "cannot allocate a {width}x{height} surface"
            )));
        }
        Ok(RecordingSurface::new(width, height))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/recording.rs"]
mod tests;
