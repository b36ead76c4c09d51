use std::time::Duration;

pub type TextBehindResult<T> = Result<T, TextBehindError>;

#[derive(thiserror::Error, Debug)]
pub enum TextBehindError {
    #[error("surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("image acquisition failed: {0}")]
    Acquisition(String),

    #[error("image acquisition timed out after {0:?}")]
    AcquisitionTimedOut(Duration),

    #[error("background extraction failed: {0}")]
    Extraction(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TextBehindError {
    pub fn surface_unavailable(msg: impl Into<String>) -> Self {
        Self::SurfaceUnavailable(msg.into())
    }

    pub fn acquisition(msg: impl Into<String>) -> Self {
        Self::Acquisition(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
