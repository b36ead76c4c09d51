//! Text configuration and the text renderer.
//!
//! [`TextSettings`] is the boundary form (every field optional, deserialized from JSON or built
//! from CLI flags). [`TextSettings::resolve`] merges it with the default table and yields a
//! [`TextConfig`], in which every field is present.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{TextBehindError, TextBehindResult};

pub(crate) mod render;

/// Default font family.
pub const DEFAULT_FONT: &str = "Arial";
/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE: f64 = 20.0;
/// Default fill color.
pub const DEFAULT_COLOR: &str = "black";

/// Text direction on the surface.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Left-to-right along the x axis.
    #[default]
    Horizontal,
    /// Rotated 90 degrees, reading bottom-to-top.
    Vertical,
}

/// Anchor point in surface pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (y axis points down).
    pub y: f64,
}

impl Position {
    /// Construct a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fully resolved text configuration for one pipeline run.
#[derive(Clone, Debug, PartialEq)]
pub struct TextConfig {
    /// Font-family identifier.
    pub font: String,
    /// Font size in pixels, finite and > 0.
    pub font_size: f64,
    /// CSS fill color.
    pub color: String,
    /// Orientation.
    pub orientation: Orientation,
    /// Text to draw; empty draws nothing.
    pub content: String,
    /// Anchor point; for vertical text this is the anchor in the rotated, final view.
    pub position: Position,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_COLOR.to_string(),
            orientation: Orientation::Horizontal,
            content: String::new(),
            position: Position::default(),
        }
    }
}

impl TextConfig {
    /// Surface font for this configuration.
    pub fn font_spec(&self) -> FontSpec {
        FontSpec {
            size_px: self.font_size,
            family: self.font.clone(),
        }
    }

    /// Check the numeric invariants.
    pub fn validate(&self) -> TextBehindResult<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(TextBehindError::validation(format!(
                "font size must be finite and > 0 (got {})",
                self.font_size
            )));
        }
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(TextBehindError::validation("text position must be finite"));
        }
        if self.font.trim().is_empty() {
            return Err(TextBehindError::validation("font family must be non-empty"));
        }
        Ok(())
    }
}

/// Partial text settings as supplied by a caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TextSettings {
    /// Font-family identifier.
    pub font: Option<String>,
    /// Font size in pixels.
    pub font_size: Option<f64>,
    /// CSS fill color.
    pub color: Option<String>,
    /// Orientation.
    pub orientation: Option<Orientation>,
    /// Text to draw.
    pub content: Option<String>,
    /// Anchor point.
    pub position: Option<Position>,
}

impl TextSettings {
    /// Overlay `other` on top of `self`: fields set in `other` win.
    pub fn merged_with(self, other: TextSettings) -> TextSettings {
        TextSettings {
            font: other.font.or(self.font),
            font_size: other.font_size.or(self.font_size),
            color: other.color.or(self.color),
            orientation: other.orientation.or(self.orientation),
            content: other.content.or(self.content),
            position: other.position.or(self.position),
        }
    }

    /// Fill missing fields from the default table and validate.
    pub fn resolve(self) -> TextBehindResult<TextConfig> {
        let defaults = TextConfig::default();
        let cfg = TextConfig {
            font: self.font.unwrap_or(defaults.font),
            font_size: self.font_size.unwrap_or(defaults.font_size),
            color: self.color.unwrap_or(defaults.color),
            orientation: self.orientation.unwrap_or(defaults.orientation),
            content: self.content.unwrap_or(defaults.content),
            position: self.position.unwrap_or(defaults.position),
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Surface font in CSS shorthand form, `"{size}px {family}"`.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Font size in pixels.
    pub size_px: f64,
    /// Font-family identifier.
    pub family: String,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size_px: 10.0,
            family: "sans-serif".to_string(),
        }
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

impl FromStr for FontSpec {
    type Err = TextBehindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (size, family) = s
            .split_once(char::is_whitespace)
            .ok_or_else(|| TextBehindError::validation(format!("invalid font \"{s}\"")))?;
        let size_px = size
            .strip_suffix("px")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| TextBehindError::validation(format!("invalid font size in \"{s}\"")))?;
        let family = family.trim();
        if family.is_empty() {
            return Err(TextBehindError::validation(format!(
                "missing font family in \"{s}\""
            )));
        }
        Ok(Self {
            size_px,
            family: family.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/text/config.rs"]
mod tests;
