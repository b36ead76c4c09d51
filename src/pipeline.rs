//! The text-behind-image pipeline.
//!
//! acquire -> allocate surface -> base layer -> text -> extract foreground -> foreground layer ->
//! encode. The text ends up between the photograph and its cut-out subject.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use crate::assets::RasterImage;
use crate::assets::font::FontBook;
use crate::assets::source::{AcquireRequest, ImageAcquirer, ImageSource, acquire_with_deadline};
use crate::encode::{EncodedImage, OutputFormat, encode_frame};
use crate::extract::BackgroundRemover;
use crate::foundation::error::{TextBehindError, TextBehindResult};
use crate::render::cpu::CpuSurfaceProvider;
use crate::render::surface::{DrawingSurface, SurfaceProvider};
use crate::text::render::render_text;
use crate::text::{TextConfig, TextSettings};

/// One pipeline invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineRequest {
    /// Source photograph.
    pub image: ImageSource,
    /// Text drawn between the photograph and its foreground.
    pub text: TextConfig,
    /// Output encoding.
    pub format: OutputFormat,
}

/// Serialized form of [`PipelineRequest`]: `{"image": "...", "text": {...}, "format": "png"}`.
///
/// `text` and every field inside it are optional; `format` defaults to `png`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineRequestDef {
    /// Source reference: path, `file://`, `data:` or `http(s)://` URL.
    pub image: ImageSource,
    /// Partial text settings.
    #[serde(default)]
    pub text: TextSettings,
    /// Output encoding.
    #[serde(default)]
    pub format: OutputFormat,
}

impl PipelineRequest {
    /// Resolve text defaults and validate.
    pub fn from_def(def: PipelineRequestDef) -> TextBehindResult<Self> {
        Ok(Self {
            image: def.image,
            text: def.text.resolve()?,
            format: def.format,
        })
    }

    /// Parse a JSON request.
    pub fn from_json_str(json: &str) -> TextBehindResult<Self> {
        let def: PipelineRequestDef = serde_json::from_str(json)
            .map_err(|e| TextBehindError::validation(format!("invalid request JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Read and parse a JSON request file.
    pub fn from_path(path: impl AsRef<Path>) -> TextBehindResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read request '{}'", path.display()))?;
        Self::from_json_str(&json)
    }
}

/// Options for [`Compositor::compose`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ComposeOpts {
    /// Give up on image acquisition after this long. `None` waits indefinitely.
    pub acquire_timeout: Option<Duration>,
}

/// Runs the pipeline against its collaborators.
///
/// Each [`compose`](Self::compose) call allocates its own surface; nothing is carried over
/// between calls.
#[derive(Clone, Debug)]
pub struct Compositor<A, R, P> {
    acquirer: A,
    remover: R,
    surfaces: P,
    opts: ComposeOpts,
}

impl<A, R, P> Compositor<A, R, P>
where
    A: ImageAcquirer,
    R: BackgroundRemover,
    P: SurfaceProvider,
{
    /// Compositor with default options.
    pub fn new(acquirer: A, remover: R, surfaces: P) -> Self {
        Self {
            acquirer,
            remover,
            surfaces,
            opts: ComposeOpts::default(),
        }
    }

    /// Replace the options.
    pub fn with_opts(mut self, opts: ComposeOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Current options.
    pub fn opts(&self) -> &ComposeOpts {
        &self.opts
    }

    /// Produce the encoded composite for `request`.
    ///
    /// Errors from the acquirer and the remover are returned unchanged; no partial output is
    /// produced. The surface is allocated before background removal starts, so
    /// `SurfaceUnavailable` never costs a removal.
    #[tracing::instrument(skip_all, fields(source = %request.image, format = %request.format))]
    pub async fn compose(&self, request: &PipelineRequest) -> TextBehindResult<EncodedImage> {
        request.text.validate()?;

        let acquire = AcquireRequest::same_origin(request.image.clone());
        let image = acquire_with_deadline(&self.acquirer, &acquire, self.opts.acquire_timeout)
            .await
            .into_result()?;
        tracing::debug!(width = image.width, height = image.height, "image acquired");

        let mut surface = self.surfaces.create_surface(image.width, image.height)?;
        surface.draw_image(&image, 0.0, 0.0)?;
        tracing::debug!("base layer drawn");

        render_text(&mut surface, &request.text)?;
        tracing::debug!(
            chars = request.text.content.chars().count(),
            orientation = ?request.text.orientation,
            "text rendered"
        );

        let foreground = self.remover.remove_background(&image).await?;
        check_foreground(&image, &foreground)?;
        tracing::debug!("foreground extracted");

        surface.draw_image(&foreground, 0.0, 0.0)?;
        tracing::debug!("foreground layer drawn");

        let frame = surface.snapshot()?;
        encode_frame(&frame, request.format)
    }
}

fn check_foreground(image: &RasterImage, foreground: &RasterImage) -> TextBehindResult<()> {
    if foreground.same_size(image) {
        return Ok(());
    }
    Err(TextBehindError::extraction(format!(
        "foreground is {}x{} but the source image is {}x{}",
        foreground.width, foreground.height, image.width, image.height
    )))
}

/// Compose `request` on a CPU surface drawing text with `fonts`.
pub async fn compose_text_behind_image<A, R>(
    request: &PipelineRequest,
    acquirer: A,
    remover: R,
    fonts: Arc<FontBook>,
) -> TextBehindResult<EncodedImage>
where
    A: ImageAcquirer,
    R: BackgroundRemover,
{
    Compositor::new(acquirer, remover, CpuSurfaceProvider::new(fonts))
        .compose(request)
        .await
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
