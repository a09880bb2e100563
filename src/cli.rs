//! CLI argument parsing with clap.

use clap::Parser;

/// Krea AI image CLI - generate, edit and upscale images.
///
/// Put the prompt before `-e`/`-u` when those flags are given without a value,
/// otherwise the prompt is taken as the image reference.
#[derive(Parser, Debug)]
#[command(name = "krea", version, about)]
pub struct Cli {
    /// Text prompt. Required for generation and editing; guides Bloom upscales.
    pub prompt: Option<String>,

    /// Model: nano ($0.08, default) or pro ($0.30).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Number of images to generate (1-10).
    #[arg(short = 'n', long = "num", default_value = "1")]
    pub count: u32,

    /// Aspect ratio (default 1:1, or inherited from the source when editing).
    #[arg(short, long)]
    pub aspect_ratio: Option<String>,

    /// Resolution for the pro model: 1K, 2K, 4K.
    #[arg(short, long)]
    pub resolution: Option<String>,

    /// Edit an image: `last` (default), a URL, or a local file.
    #[arg(short, long, value_name = "IMAGE", num_args = 0..=1, default_missing_value = "last")]
    pub edit: Option<String>,

    /// Edit strength: how much of the source to preserve (0.0-1.0, default 0.8).
    #[arg(short, long)]
    pub strength: Option<f64>,

    /// Upscale an image: `last` (default), a URL, or a local file.
    #[arg(short, long, value_name = "IMAGE", num_args = 0..=1, default_missing_value = "last")]
    pub upscale: Option<String>,

    /// Ask for the image type and upscale settings interactively.
    #[arg(short, long)]
    pub interactive: bool,

    /// Upscale factor (1-32, default 2).
    #[arg(short = 'x', long)]
    pub scale: Option<u32>,

    /// Upscale engine: topaz ($0.15, fast) or bloom ($0.75, creative).
    #[arg(long)]
    pub engine: Option<String>,

    /// Upscale preset: portrait, photo, artwork, cgi, lowres, text, creative.
    #[arg(long)]
    pub preset: Option<String>,

    /// Upscale output format: png, jpg, webp.
    #[arg(long)]
    pub format: Option<String>,

    /// Topaz model (e.g. "Standard V2", "High Fidelity V2", "CGI").
    #[arg(long)]
    pub upscale_model: Option<String>,

    /// Topaz sharpening (0.0-1.0).
    #[arg(long)]
    pub sharpen: Option<f64>,

    /// Topaz denoising (0.0-1.0).
    #[arg(long)]
    pub denoise: Option<f64>,

    /// Topaz compression artifact removal (0.0-1.0).
    #[arg(long)]
    pub fix_compression: Option<f64>,

    /// Topaz face enhancement.
    #[arg(long)]
    pub face_enhancement: bool,

    /// Bloom creativity level (1-9).
    #[arg(long)]
    pub creativity: Option<u32>,

    /// Bloom face preservation.
    #[arg(long)]
    pub face_preservation: bool,

    /// Bloom color preservation.
    #[arg(long)]
    pub color_preservation: bool,

    /// Do not open the output folder afterwards.
    #[arg(long)]
    pub no_open: bool,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The first upscale-only flag that was given, if any.
    #[must_use]
    pub fn upscale_flag_in_use(&self) -> Option<&'static str> {
        [
            ("interactive", self.interactive),
            ("scale", self.scale.is_some()),
            ("engine", self.engine.is_some()),
            ("preset", self.preset.is_some()),
            ("format", self.format.is_some()),
        ]
        .into_iter()
        .chain(self.topaz_flags())
        .chain(self.bloom_flags())
        .find_map(|(name, used)| used.then_some(name))
    }

    /// Topaz-only flags and whether each was given.
    #[must_use]
    pub fn topaz_flags(&self) -> [(&'static str, bool); 5] {
        [
            ("upscale-model", self.upscale_model.is_some()),
            ("sharpen", self.sharpen.is_some()),
            ("denoise", self.denoise.is_some()),
            ("fix-compression", self.fix_compression.is_some()),
            ("face-enhancement", self.face_enhancement),
        ]
    }

    /// Bloom-only flags and whether each was given.
    #[must_use]
    pub fn bloom_flags(&self) -> [(&'static str, bool); 3] {
        [
            ("creativity", self.creativity.is_some()),
            ("face-preservation", self.face_preservation),
            ("color-preservation", self.color_preservation),
        ]
    }
}
