use std::f64::consts::FRAC_PI_2;

use crate::foundation::error::TextBehindResult;
use crate::render::surface::{DrawingSurface, StateGuard, TextAlign, TextBaseline};
use crate::text::{Orientation, TextConfig};

/// Draw `cfg.content` on `surface`, centered on `cfg.position`.
///
/// Only pixels change: the transform, font, fill and alignment in effect before the call are
/// back in effect when it returns, on success and on error alike.
///
/// Vertical text is rotated a quarter turn counter-clockwise (reading bottom-to-top). With the
/// y axis pointing down, `rotate(-π/2)` maps user-space `(-y, x)` to surface `(x, y)`, so the
/// anchor stays where a horizontal string would have been centered.
pub fn render_text<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    cfg: &TextConfig,
) -> TextBehindResult<()> {
    let mut s = StateGuard::new(surface);
    s.set_font(&cfg.font_spec());
    s.set_fill_color(&cfg.color);
    s.set_text_align(TextAlign::Center);
    s.set_text_baseline(TextBaseline::Middle);

    let (x, y) = (cfg.position.x, cfg.position.y);
    match cfg.orientation {
        Orientation::Horizontal => s.fill_text(&cfg.content, x, y),
        Orientation::Vertical => {
            s.rotate(-FRAC_PI_2);
            s.fill_text(&cfg.content, -y, x)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/render.rs"]
mod tests;
