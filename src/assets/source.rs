use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::assets::RasterImage;
use crate::assets::decode::decode_image;
use crate::foundation::error::{TextBehindError, TextBehindResult};

/// Where the source photograph comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Filesystem path; relative paths resolve against the acquirer's root.
    Path(PathBuf),
    /// `file://` URL, already converted to a path.
    FileUrl(PathBuf),
    /// Complete `data:` URL.
    DataUrl(String),
    /// `http://` or `https://` URL.
    Remote(String),
    /// Encoded image bytes held in memory.
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    /// Classify a source reference by its scheme.
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("data:") {
            Self::DataUrl(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote(trimmed.to_string())
        } else if lower.starts_with("file://") {
            let rest = &trimmed["file://".len()..];
            // `file://localhost/x` and `file:///x` both name `/x`.
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            let decoded = percent_decode(rest);
            Self::FileUrl(PathBuf::from(String::from_utf8_lossy(&decoded).into_owned()))
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    /// Wrap encoded bytes.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<&str> for ImageSource {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::FileUrl(p) => write!(f, "file://{}", p.display()),
            Self::DataUrl(s) => {
                let head = s.split(',').next().unwrap_or("data:");
                write!(f, "{head},<{} chars>", s.len())
            }
            Self::Remote(url) => f.write_str(url),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ImageSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.trim().is_empty() {
            return Err(serde::de::Error::custom("image source must be non-empty"));
        }
        Ok(Self::parse(&s))
    }
}

/// Credential policy attached to an acquisition, mirroring fetch/CORS credential modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CredentialsMode {
    /// Never send credentials.
    Omit,
    /// Send credentials only to the same origin.
    #[default]
    SameOrigin,
    /// Always send credentials.
    Include,
}

/// One image acquisition request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquireRequest {
    /// Source reference.
    pub source: ImageSource,
    /// Credential policy for network sources.
    pub credentials: CredentialsMode,
}

impl AcquireRequest {
    /// Request with same-origin credential semantics.
    pub fn same_origin(source: ImageSource) -> Self {
        Self {
            source,
            credentials: CredentialsMode::SameOrigin,
        }
    }
}

/// Fetches and decodes the source photograph.
///
/// Implementations resolve once the image is fully decoded and its natural size is known, or fail
/// when the source cannot be fetched or decoded.
#[allow(async_fn_in_trait)]
pub trait ImageAcquirer {
    /// Acquire and decode one image.
    async fn acquire(&self, request: &AcquireRequest) -> TextBehindResult<RasterImage>;
}

impl<A: ImageAcquirer + ?Sized> ImageAcquirer for &A {
    async fn acquire(&self, request: &AcquireRequest) -> TextBehindResult<RasterImage> {
        (**self).acquire(request).await
    }
}

/// Acquirer for local sources: paths, `file://` and `data:` URLs, and in-memory bytes.
#[derive(Clone, Debug)]
pub struct LocalImageAcquirer {
    root: PathBuf,
}

impl LocalImageAcquirer {
    /// Resolve relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    async fn read_file(&self, path: &Path) -> TextBehindResult<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| {
            TextBehindError::acquisition(format!("failed to read '{}': {e}", path.display()))
        })
    }
}

impl Default for LocalImageAcquirer {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ImageAcquirer for LocalImageAcquirer {
    async fn acquire(&self, request: &AcquireRequest) -> TextBehindResult<RasterImage> {
        tracing::debug!(
            source = %request.source,
            credentials = ?request.credentials,
            "acquire image"
        );
        let decoded = match &request.source {
            ImageSource::Path(p) => decode_image(&self.read_file(&self.resolve_path(p)).await?),
            ImageSource::FileUrl(p) => decode_image(&self.read_file(p).await?),
            ImageSource::DataUrl(url) => decode_image(&decode_data_url(url)?),
            ImageSource::Bytes(bytes) => decode_image(bytes),
            ImageSource::Remote(url) => {
                return Err(TextBehindError::acquisition(format!(
                    "remote fetch is not supported by the local acquirer: {url}"
                )));
            }
        };
        decoded.map_err(|e| {
            TextBehindError::acquisition(format!("{}: {}", request.source, describe(&e)))
        })
    }
}

fn describe(err: &TextBehindError) -> String {
    match err {
        TextBehindError::Other(e) => format!("{e:#}"),
        e => e.to_string(),
    }
}

/// Decode the payload of a `data:` URL.
pub(crate) fn decode_data_url(url: &str) -> TextBehindResult<Vec<u8>> {
    let rest = url
        .get(..5)
        .filter(|scheme| scheme.eq_ignore_ascii_case("data:"))
        .map(|_| &url[5..])
        .ok_or_else(|| TextBehindError::acquisition("not a data: URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| TextBehindError::acquisition("data: URL has no ',' separator"))?;

    if meta.to_ascii_lowercase().ends_with(";base64") {
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| TextBehindError::acquisition(format!("invalid base64 in data: URL: {e}")))
    } else {
        Ok(percent_decode(payload))
    }
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(v) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Outcome of a time-bounded acquisition.
#[derive(Debug)]
pub enum Acquisition {
    /// The image decoded.
    Ready(RasterImage),
    /// The acquirer reported a failure.
    Failed(TextBehindError),
    /// The deadline passed first.
    TimedOut(Duration),
}

impl Acquisition {
    /// Collapse into a result.
    pub fn into_result(self) -> TextBehindResult<RasterImage> {
        match self {
            Self::Ready(img) => Ok(img),
            Self::Failed(e) => Err(e),
            Self::TimedOut(after) => Err(TextBehindError::AcquisitionTimedOut(after)),
        }
    }
}

/// Run an acquisition, bounded by `timeout` when one is given.
///
/// With `timeout == None` this waits for as long as the acquirer takes.
pub async fn acquire_with_deadline<A: ImageAcquirer>(
    acquirer: &A,
    request: &AcquireRequest,
    timeout: Option<Duration>,
) -> Acquisition {
    let outcome = match timeout {
        None => acquirer.acquire(request).await,
        Some(after) => match tokio::time::timeout(after, acquirer.acquire(request)).await {
            Ok(outcome) => outcome,
            Err(_) => return Acquisition::TimedOut(after),
        },
    };
    match outcome {
        Ok(img) => Acquisition::Ready(img),
        Err(e) => Acquisition::Failed(e),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
