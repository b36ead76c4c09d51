use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::RasterImage;
use crate::assets::font::{FontBook, FontFace, TextBrushRgba8, TextLayoutEngine};
use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::{TextBehindError, TextBehindResult};
use crate::render::FrameRGBA;
use crate::render::surface::{DrawingSurface, StateStack, SurfaceProvider, text_anchor_offset};

/// Allocates [`CpuSurface`]s that share one read-only [`FontBook`].
#[derive(Clone, Debug, Default)]
pub struct CpuSurfaceProvider {
    fonts: Arc<FontBook>,
}

impl CpuSurfaceProvider {
    /// Provider drawing text with the families in `fonts`.
    pub fn new(fonts: Arc<FontBook>) -> Self {
        Self { fonts }
    }
}

impl SurfaceProvider for CpuSurfaceProvider {
    type Surface = CpuSurface;

    fn create_surface(&self, width: u32, height: u32) -> TextBehindResult<CpuSurface> {
        CpuSurface::new(width, height, self.fonts.clone())
    }
}

/// Raster surface backed by `vello_cpu`, with Parley text shaping.
///
/// Draw calls are recorded into a `vello_cpu::RenderContext` in order and rasterized by
/// [`DrawingSurface::snapshot`], so later draws cover earlier ones.
pub struct CpuSurface {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
    states: StateStack,
    fonts: Arc<FontBook>,
    text_engine: TextLayoutEngine,
    font_data: HashMap<String, vello_cpu::peniko::FontData>,
}

impl CpuSurface {
    /// Allocate a transparent surface.
    ///
    /// Both dimensions must be in `1..=65535`.
    pub fn new(width: u32, height: u32, fonts: Arc<FontBook>) -> TextBehindResult<Self> {
        let w = surface_dim(width, "width")?;
        let h = surface_dim(height, "height")?;
        tracing::debug!(width, height, "allocate cpu surface");
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            width: w,
            height: h,
            states: StateStack::default(),
            fonts,
            text_engine: TextLayoutEngine::new(),
            font_data: HashMap::new(),
        })
    }

    fn font_data_for(&mut self, face: &FontFace) -> vello_cpu::peniko::FontData {
        self.font_data
            .entry(face.family().to_string())
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(face.bytes().as_ref().clone()),
                    0,
                )
            })
            .clone()
    }
}

fn surface_dim(v: u32, axis: &str) -> TextBehindResult<u16> {
    u16::try_from(v)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            TextBehindError::surface_unavailable(format!(
                "surface {axis} {v} is outside 1..=65535"
            ))
        })
}

impl DrawingSurface for CpuSurface {
    fn width(&self) -> u32 {
        u32::from(self.width)
    }

    fn height(&self) -> u32 {
        u32::from(self.height)
    }

    fn states(&self) -> &StateStack {
        &self.states
    }

    fn states_mut(&mut self) -> &mut StateStack {
        &mut self.states
    }

    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64) -> TextBehindResult<()> {
        let pixmap = pixmap_from_premul_bytes(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        let tr = self.states.current().transform * Affine::translate(Vec2::new(x, y));

        self.ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(tr));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.width),
            f64::from(image.height),
        ));
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> TextBehindResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let state = self.states.current().clone();
        let face = self
            .fonts
            .resolve(&state.font.family)
            .cloned()
            .ok_or_else(|| {
                TextBehindError::validation(format!(
                    "cannot draw text in \"{}\": no fonts registered",
                    state.font
                ))
            })?;

        let fill = state.fill;
        let brush = TextBrushRgba8 {
            r: fill.r,
            g: fill.g,
            b: fill.b,
            a: fill.a,
        };
        let layout =
            self.text_engine
                .layout_line(text, &face, state.font.size_px as f32, brush)?;
        let Some(line) = layout.lines().next() else {
            return Ok(());
        };
        let metrics = line.metrics();
        let off = text_anchor_offset(
            f64::from(layout.width()),
            f64::from(metrics.ascent),
            f64::from(metrics.descent),
            f64::from(metrics.baseline),
            state.text_align,
            state.text_baseline,
        );
        let font = self.font_data_for(&face);

        self.ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(
            state.transform * Affine::translate(Vec2::new(x + off.x, y + off.y)),
        ));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn snapshot(&mut self) -> TextBehindResult<FrameRGBA> {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> TextBehindResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TextBehindError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TextBehindError::validation("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(TextBehindError::validation("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
