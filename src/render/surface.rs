use std::ops::{Deref, DerefMut};

use crate::assets::RasterImage;
use crate::assets::color::parse_css_color;
use crate::foundation::core::{Affine, Rgba8, Vec2};
use crate::foundation::error::TextBehindResult;
use crate::render::FrameRGBA;
use crate::text::FontSpec;

/// Horizontal placement of text relative to its anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    /// Text starts at the anchor.
    #[default]
    Start,
    /// Text is centered on the anchor.
    Center,
    /// Text ends at the anchor.
    End,
}

/// Vertical placement of text relative to its anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextBaseline {
    /// The alphabetic baseline sits on the anchor.
    #[default]
    Alphabetic,
    /// The top of the em box sits on the anchor.
    Top,
    /// The middle of the em box sits on the anchor.
    Middle,
    /// The bottom of the em box sits on the anchor.
    Bottom,
}

/// Mutable drawing state, saved and restored as a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceState {
    /// Current transform from user space to surface pixels.
    pub transform: Affine,
    /// Current font.
    pub font: FontSpec,
    /// Current fill color (straight alpha).
    pub fill: Rgba8,
    /// Current horizontal text alignment.
    pub text_align: TextAlign,
    /// Current text baseline.
    pub text_baseline: TextBaseline,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            font: FontSpec::default(),
            fill: Rgba8::BLACK,
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
        }
    }
}

/// Current state plus the stack of saved states.
#[derive(Clone, Debug, Default)]
pub struct StateStack {
    current: SurfaceState,
    saved: Vec<SurfaceState>,
}

impl StateStack {
    /// Current state.
    pub fn current(&self) -> &SurfaceState {
        &self.current
    }

    /// Current state, mutably.
    pub fn current_mut(&mut self) -> &mut SurfaceState {
        &mut self.current
    }

    /// Push a copy of the current state.
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Pop the last saved state. Restoring with nothing saved is a no-op.
    pub fn restore(&mut self) {
        if let Some(prev) = self.saved.pop() {
            self.current = prev;
        }
    }

    /// Number of saved states.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// 2D raster target with a canvas-style state model.
///
/// Coordinates are surface pixels with the y axis pointing down. Transforms compose by
/// post-multiplication: `rotate` and `translate` apply in the current user space.
pub trait DrawingSurface {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
    /// State stack.
    fn states(&self) -> &StateStack;
    /// State stack, mutably.
    fn states_mut(&mut self) -> &mut StateStack;

    /// Draw an image at its natural size with its top-left corner at `(x, y)` in user space.
    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64) -> TextBehindResult<()>;

    /// Fill `text` anchored at `(x, y)` with the current font, fill, alignment and transform.
    ///
    /// Empty text draws nothing.
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> TextBehindResult<()>;

    /// Render everything drawn so far and read back the pixels.
    fn snapshot(&mut self) -> TextBehindResult<FrameRGBA>;

    /// Current state.
    fn state(&self) -> &SurfaceState {
        self.states().current()
    }

    /// Save the current state.
    fn save(&mut self) {
        self.states_mut().save();
    }

    /// Restore the most recently saved state.
    fn restore(&mut self) {
        self.states_mut().restore();
    }

    /// Current transform.
    fn transform(&self) -> Affine {
        self.state().transform
    }

    /// Replace the current transform.
    fn set_transform(&mut self, transform: Affine) {
        self.states_mut().current_mut().transform = transform;
    }

    /// Rotate the user space by `radians` about its origin.
    fn rotate(&mut self, radians: f64) {
        let state = self.states_mut().current_mut();
        state.transform = state.transform * Affine::rotate(radians);
    }

    /// Move the user-space origin by `(dx, dy)`.
    fn translate(&mut self, dx: f64, dy: f64) {
        let state = self.states_mut().current_mut();
        state.transform = state.transform * Affine::translate(Vec2::new(dx, dy));
    }

    /// Set the font.
    fn set_font(&mut self, font: &FontSpec) {
        self.states_mut().current_mut().font = font.clone();
    }

    /// Set the fill color from a CSS color string.
    ///
    /// Unparseable colors are ignored and the previous fill is kept.
    fn set_fill_color(&mut self, color: &str) {
        match parse_css_color(color) {
            Ok(fill) => self.states_mut().current_mut().fill = fill,
            Err(reason) => {
                tracing::warn!(color = %color, %reason, "ignoring unparseable fill color");
            }
        }
    }

    /// Set the horizontal text alignment.
    fn set_text_align(&mut self, align: TextAlign) {
        self.states_mut().current_mut().text_align = align;
    }

    /// Set the text baseline.
    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.states_mut().current_mut().text_baseline = baseline;
    }
}

/// Scoped state override.
///
/// Saves the surface state when created and restores it when dropped, so early returns and
/// unwinding cannot leak a transform or style change. Guards nest.
pub struct StateGuard<'a, S: DrawingSurface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: DrawingSurface + ?Sized> StateGuard<'a, S> {
    /// Save the state of `surface`.
    pub fn new(surface: &'a mut S) -> Self {
        surface.save();
        Self { surface }
    }
}

impl<S: DrawingSurface + ?Sized> Deref for StateGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> DerefMut for StateGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> Drop for StateGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}

/// Allocates drawing surfaces.
pub trait SurfaceProvider {
    /// Surface type produced.
    type Surface: DrawingSurface;

    /// Allocate a transparent `width x height` surface.
    ///
    /// Fails with `SurfaceUnavailable` when the platform cannot provide one.
    fn create_surface(&self, width: u32, height: u32) -> TextBehindResult<Self::Surface>;
}

/// Offset from the anchor to the layout origin of a single line of text.
///
/// Layout space has its origin at the top-left of the line box with `baseline_y` the distance
/// from the top to the alphabetic baseline; `ascent` and `descent` are both positive.
pub(crate) fn text_anchor_offset(
    width: f64,
    ascent: f64,
    descent: f64,
    baseline_y: f64,
    align: TextAlign,
    baseline: TextBaseline,
) -> Vec2 {
    let dx = match align {
        TextAlign::Start => 0.0,
        TextAlign::Center => -width / 2.0,
        TextAlign::End => -width,
    };
    let anchor_y = match baseline {
        TextBaseline::Alphabetic => baseline_y,
        TextBaseline::Top => baseline_y - ascent,
        TextBaseline::Middle => baseline_y - (ascent - descent) / 2.0,
        TextBaseline::Bottom => baseline_y + descent,
    };
    Vec2::new(dx, -anchor_y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
