use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;
use textbehind::{
    BackgroundRemover, ComposeOpts, Compositor, CpuSurfaceProvider, FontBook, ImageSource,
    LocalImageAcquirer, MaskRemover, Orientation, OutputFormat, PipelineRequest,
    PipelineRequestDef, Position, PrecomputedForeground, RasterImage, TextBehindResult,
    TextSettings,
};

#[derive(Parser, Debug)]
#[command(name = "textbehind", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw text between a photograph and its foreground subject.
    Compose(ComposeArgs),
    /// Print the family name and SHA-256 of font files.
    Fonts(FontsArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Source image: path, file://, data: or http(s):// URL. Overrides the request's image.
    #[arg(long, required_unless_present = "request")]
    image: Option<String>,

    /// Pre-cut foreground PNG (background already transparent).
    #[arg(long, required_unless_present = "mask")]
    foreground: Option<PathBuf>,

    /// Foreground mask; white keeps a pixel, black or transparent removes it.
    #[arg(long, conflicts_with = "foreground")]
    mask: Option<PathBuf>,

    /// Request JSON (`{"image": .., "text": {..}, "format": ..}`). Flags override its fields.
    #[arg(long)]
    request: Option<PathBuf>,

    /// Text to draw.
    #[arg(long)]
    text: Option<String>,

    /// Font family.
    #[arg(long)]
    font: Option<String>,

    /// Font size in pixels.
    #[arg(long)]
    size: Option<f64>,

    /// CSS fill color.
    #[arg(long)]
    color: Option<String>,

    /// Anchor x in image pixels.
    #[arg(long, allow_hyphen_values = true)]
    x: Option<f64>,

    /// Anchor y in image pixels.
    #[arg(long, allow_hyphen_values = true)]
    y: Option<f64>,

    /// Text orientation; `vertical` reads bottom-to-top.
    #[arg(long, value_enum)]
    orientation: Option<Orientation>,

    /// Font file to register (repeatable). The first one is the fallback family.
    #[arg(long = "font-file")]
    font_files: Vec<PathBuf>,

    /// Output format; defaults to the request's, then the `--out` extension, then png.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Fail if the image is not acquired within this many milliseconds.
    #[arg(long)]
    acquire_timeout_ms: Option<u64>,

    /// Output file.
    #[arg(long, required_unless_present = "data_url")]
    out: Option<PathBuf>,

    /// Print a `data:` URL to stdout instead of writing a file.
    #[arg(long, conflicts_with = "out")]
    data_url: bool,
}

#[derive(Parser, Debug)]
struct FontsArgs {
    /// Font files.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args).await,
        Command::Fonts(args) => cmd_fonts(args),
    }
}

/// Foreground source chosen on the command line.
enum Cutout {
    Foreground(PrecomputedForeground),
    Mask(MaskRemover),
}

impl BackgroundRemover for Cutout {
    async fn remove_background(&self, image: &RasterImage) -> TextBehindResult<RasterImage> {
        match self {
            Self::Foreground(r) => r.remove_background(image).await,
            Self::Mask(r) => r.remove_background(image).await,
        }
    }
}

async fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let (request, assets_root) = build_request(&args)?;

    let mut fonts = FontBook::new();
    for path in &args.font_files {
        let family = fonts.register_file(path)?;
        tracing::info!(path = %path.display(), %family, "font registered");
    }

    let cutout = match (&args.foreground, &args.mask) {
        (Some(path), _) => Cutout::Foreground(PrecomputedForeground::new(read_image(path)?)),
        (None, Some(path)) => Cutout::Mask(MaskRemover::new(read_image(path)?)),
        (None, None) => anyhow::bail!("one of --foreground or --mask is required"),
    };

    let opts = ComposeOpts {
        acquire_timeout: args.acquire_timeout_ms.map(Duration::from_millis),
    };
    let compositor = Compositor::new(
        LocalImageAcquirer::new(assets_root),
        cutout,
        CpuSurfaceProvider::new(Arc::new(fonts)),
    )
    .with_opts(opts);
    let encoded = compositor
        .compose(&request)
        .await
        .with_context(|| format!("compose '{}'", request.image))?;

    if args.data_url {
        println!("{}", encoded.to_data_url());
        return Ok(());
    }
    let Some(out) = &args.out else {
        anyhow::bail!("one of --out or --data-url is required");
    };
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(out, &encoded.bytes)
        .with_context(|| format!("write {} '{}'", encoded.format, out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

/// Merge the request file (if any) with flags. Returns the request and the directory relative
/// image paths resolve against.
fn build_request(args: &ComposeArgs) -> anyhow::Result<(PipelineRequest, PathBuf)> {
    let mut assets_root = PathBuf::from(".");
    let file_def = match &args.request {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read request '{}'", path.display()))?;
            let def: PipelineRequestDef = serde_json::from_str(&json)
                .with_context(|| format!("parse request '{}'", path.display()))?;
            assets_root = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            Some(def)
        }
        None => None,
    };

    let image = match (&args.image, &file_def) {
        (Some(image), _) => {
            assets_root = PathBuf::from(".");
            ImageSource::parse(image)
        }
        (None, Some(def)) => def.image.clone(),
        (None, None) => anyhow::bail!("--image is required without --request"),
    };

    let base_text = file_def
        .as_ref()
        .map(|d| d.text.clone())
        .unwrap_or_default();
    let position = match (args.x, args.y) {
        (None, None) => None,
        (x, y) => {
            let base = base_text.position.unwrap_or_default();
            Some(Position::new(x.unwrap_or(base.x), y.unwrap_or(base.y)))
        }
    };
    let flags = TextSettings {
        font: args.font.clone(),
        font_size: args.size,
        color: args.color.clone(),
        orientation: args.orientation,
        content: args.text.clone(),
        position,
    };

    let format = args
        .format
        .or(file_def.as_ref().map(|d| d.format))
        .or_else(|| {
            args.out
                .as_ref()
                .and_then(|p| p.extension())
                .and_then(|e| e.to_str())
                .and_then(|e| e.parse().ok())
        })
        .unwrap_or_default();

    let request = PipelineRequest::from_def(PipelineRequestDef {
        image,
        text: base_text.merged_with(flags),
        format,
    })?;
    Ok((request, assets_root))
}

fn read_image(path: &Path) -> anyhow::Result<RasterImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    Ok(textbehind::decode_image(&bytes).with_context(|| format!("decode '{}'", path.display()))?)
}

fn cmd_fonts(args: FontsArgs) -> anyhow::Result<()> {
    for path in &args.paths {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        let sha = sha256_hex(&bytes);
        let family = FontBook::new()
            .register_bytes(bytes)
            .with_context(|| format!("load font '{}'", path.display()))?;
        println!("{}", path.display());
        println!("  family: {family}");
        println!("  sha256: {sha}");
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
