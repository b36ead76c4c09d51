//! Text-behind-image compositing.
//!
//! Given a photograph, draws text *between* the photograph and its foreground subject: the
//! image is painted, the text is stamped over it, then the cut-out subject is painted again on
//! top so it occludes the text.
//!
//! - Describe one run with a [`PipelineRequest`] (or its JSON form, [`PipelineRequestDef`])
//! - Supply an [`ImageAcquirer`] and a [`BackgroundRemover`]
//! - Run [`compose_text_behind_image`] (CPU surface) or a [`Compositor`] over any
//!   [`SurfaceProvider`]
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub mod encode;
pub mod extract;
pub mod pipeline;
/// Drawing surfaces.
pub mod render;
pub mod text;

pub use crate::assets::RasterImage;
pub use crate::assets::color::parse_css_color;
pub use crate::assets::decode::decode_image;
pub use crate::assets::font::{FontBook, FontFace};
pub use crate::assets::source::{
    AcquireRequest, Acquisition, CredentialsMode, ImageAcquirer, ImageSource, LocalImageAcquirer,
    acquire_with_deadline,
};
pub use crate::encode::{EncodedImage, OutputFormat, encode_frame};
pub use crate::extract::{BackgroundRemover, MaskRemover, PrecomputedForeground};
pub use crate::foundation::core::{Affine, Point, Rgba8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{TextBehindError, TextBehindResult};
pub use crate::pipeline::{
    ComposeOpts, Compositor, PipelineRequest, PipelineRequestDef, compose_text_behind_image,
};
pub use crate::render::FrameRGBA;
pub use crate::render::cpu::{CpuSurface, CpuSurfaceProvider};
pub use crate::render::recording::{
    RecordingSurface, RecordingSurfaceProvider, SurfaceOp, TextDraw,
};
pub use crate::render::surface::{
    DrawingSurface, StateGuard, StateStack, SurfaceProvider, SurfaceState, TextAlign,
    TextBaseline,
};
pub use crate::text::render::render_text;
pub use crate::text::{FontSpec, Orientation, Position, TextConfig, TextSettings};
