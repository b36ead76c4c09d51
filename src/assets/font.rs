use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{TextBehindError, TextBehindResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    /// Red channel.
    pub(crate) r: u8,
    /// Green channel.
    pub(crate) g: u8,
    /// Blue channel.
    pub(crate) b: u8,
    /// Alpha channel.
    pub(crate) a: u8,
}

/// One registered font file and the family name it declares.
#[derive(Clone)]
pub struct FontFace {
    family: String,
    bytes: Arc<Vec<u8>>,
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl FontFace {
    /// Family name read from the font's name table.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Raw font file bytes.
    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }
}

/// Read-only set of fonts available to text rendering, keyed by family name.
///
/// Surfaces never scan system fonts; every family they can draw must be registered here.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    faces: Vec<FontFace>,
}

impl FontBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register font bytes and return the declared family name.
    ///
    /// Registering a family twice replaces the earlier face.
    pub fn register_bytes(&mut self, bytes: Vec<u8>) -> TextBehindResult<String> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            TextBehindError::validation("no font families registered from font bytes")
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| TextBehindError::validation("registered font family has no name"))?
            .to_string();

        self.faces
            .retain(|f| !f.family.eq_ignore_ascii_case(&family));
        self.faces.push(FontFace {
            family: family.clone(),
            bytes: Arc::new(bytes),
        });
        tracing::debug!(family = %family, "registered font");
        Ok(family)
    }

    /// Read a font file from disk and register it.
    pub fn register_file(&mut self, path: impl AsRef<Path>) -> TextBehindResult<String> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        self.register_bytes(bytes)
    }

    /// Registered family names, in registration order.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(|f| f.family.as_str())
    }

    /// Return `true` when no font has been registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Find the face for a font-family identifier.
    ///
    /// Only the first entry of a comma-separated family list is considered; surrounding quotes
    /// are stripped and matching is case-insensitive. Unknown families fall back to the first
    /// registered face, as a browser falls back to its default font.
    pub fn resolve(&self, family: &str) -> Option<&FontFace> {
        let wanted = primary_family(family);
        self.faces
            .iter()
            .find(|f| f.family.eq_ignore_ascii_case(wanted))
            .or_else(|| {
                let fallback = self.faces.first();
                if let Some(f) = fallback {
                    tracing::warn!(
                        requested = %wanted,
                        fallback = %f.family,
                        "font family not registered; using fallback"
                    );
                }
                fallback
            })
    }
}

fn primary_family(family: &str) -> &str {
    let first = family.split(',').next().unwrap_or(family).trim();
    first.trim_matches(|c| c == '"' || c == '\'').trim()
}

/// Per-surface Parley contexts for single-line layout.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: HashSet<String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashSet::new(),
        }
    }

    /// Shape one unwrapped line of text in the face's family.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        face: &FontFace,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> TextBehindResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(TextBehindError::validation(
                "font size must be finite and > 0",
            ));
        }

        if self.registered.insert(face.family.clone()) {
            self.font_ctx.collection.register_fonts(
                parley::fontique::Blob::from(face.bytes.as_ref().clone()),
                None,
            );
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Single(parley::style::FontFamily::Named(Cow::Owned(
                face.family.clone(),
            ))),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/font.rs"]
mod tests;
