//! Resolves CLI flags and config defaults into one validated request.
//!
//! Resolution is pure: no network access and no file-system reads.

use crate::asset::AssetReference;
use crate::cli::Cli;
use crate::config::DefaultsConfig;
use crate::error::ConfigError;
use crate::model::{Engine, Model, TopazModel};
use crate::params::{
    validate_aspect_ratio, validate_creativity, validate_range, validate_resolution,
    validate_scale, validate_unit, OutputFormat,
};
use crate::presets;

/// Most images one invocation may generate.
pub const MAX_COUNT: u32 = 10;

/// Edit strength used when `-s` is absent.
pub const DEFAULT_STRENGTH: f64 = 0.8;

/// Upscale factor used when `-x` is absent.
pub const DEFAULT_SCALE: u32 = 2;

/// The operation an invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Text to image.
    Generate,
    /// Image plus prompt to image.
    Edit,
    /// Enlarge an existing image.
    Upscale,
}

/// A validated request. Exactly one mode is active by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestConfig {
    /// Generate new images from a prompt.
    Generate(ImageSettings),
    /// Edit an existing image guided by a prompt.
    Edit {
        /// Prompt and model settings.
        image: ImageSettings,
        /// Image to edit.
        source: AssetReference,
        /// How much of the source to preserve (0.0-1.0).
        strength: f64,
    },
    /// Upscale an existing image.
    Upscale {
        /// Image to upscale.
        source: AssetReference,
        /// Engine settings, or a request to ask for them.
        plan: UpscalePlan,
    },
}

impl RequestConfig {
    /// The active mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self {
            Self::Generate(_) => Mode::Generate,
            Self::Edit { .. } => Mode::Edit,
            Self::Upscale { .. } => Mode::Upscale,
        }
    }
}

/// Prompt and model settings shared by generation and editing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSettings {
    /// Text prompt.
    pub prompt: String,
    /// Generation model.
    pub model: Model,
    /// Aspect ratio to request.
    pub aspect_ratio: String,
    /// Use the source image's aspect ratio instead, when it is known.
    pub inherit_aspect_ratio: bool,
    /// Resolution; only set for the pro model.
    pub resolution: Option<String>,
    /// Number of images.
    pub count: u32,
}

impl ImageSettings {
    /// The aspect ratio to send, given the one inherited from a source image.
    #[must_use]
    pub fn effective_aspect_ratio(&self, inherited: Option<&str>) -> String {
        match inherited {
            Some(ratio) if self.inherit_aspect_ratio => ratio.to_string(),
            _ => self.aspect_ratio.clone(),
        }
    }
}

/// How upscale settings are obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum UpscalePlan {
    /// Ask on the terminal.
    Interactive {
        /// Output format.
        format: OutputFormat,
    },
    /// Fully specified by flags, preset and defaults.
    Configured(UpscaleSettings),
}

/// Complete settings for one upscale.
#[derive(Debug, Clone, PartialEq)]
pub struct UpscaleSettings {
    /// Scale factor (1-32).
    pub scale: u32,
    /// Output format.
    pub format: OutputFormat,
    /// Engine and its options.
    pub engine: EngineOptions,
}

/// Engine selection together with that engine's options.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOptions {
    /// Topaz standard enhance.
    Topaz(TopazOptions),
    /// Topaz Bloom creative enhance.
    Bloom(BloomOptions),
}

impl EngineOptions {
    /// The engine these options belong to.
    #[must_use]
    pub fn engine(&self) -> Engine {
        match self {
            Self::Topaz(_) => Engine::Topaz,
            Self::Bloom(_) => Engine::Bloom,
        }
    }
}

/// Topaz options.
#[derive(Debug, Clone, PartialEq)]
pub struct TopazOptions {
    /// Enhancement model.
    pub model: TopazModel,
    /// Sharpening (0.0-1.0).
    pub sharpen: f64,
    /// Denoising (0.0-1.0).
    pub denoise: f64,
    /// Compression artifact removal (0.0-1.0).
    pub fix_compression: f64,
    /// Face enhancement.
    pub face_enhancement: bool,
}

impl Default for TopazOptions {
    fn default() -> Self {
        Self {
            model: TopazModel::StandardV2,
            sharpen: 0.5,
            denoise: 0.3,
            fix_compression: 0.5,
            face_enhancement: false,
        }
    }
}

/// Bloom options.
#[derive(Debug, Clone, PartialEq)]
pub struct BloomOptions {
    /// Creativity (1-9).
    pub creativity: u32,
    /// Keep faces accurate.
    pub face_preservation: bool,
    /// Keep the original colors.
    pub color_preservation: bool,
    /// Optional guidance prompt.
    pub prompt: Option<String>,
}

impl Default for BloomOptions {
    fn default() -> Self {
        Self { creativity: 3, face_preservation: false, color_preservation: false, prompt: None }
    }
}

/// Resolve CLI flags and config defaults into a [`RequestConfig`].
///
/// # Errors
///
/// Returns a [`ConfigError`] naming the first offending field.
pub fn resolve(cli: &Cli, defaults: &DefaultsConfig) -> Result<RequestConfig, ConfigError> {
    match (&cli.edit, &cli.upscale) {
        (Some(_), Some(_)) => {
            Err(ConfigError::new("mode", "--edit and --upscale cannot be combined"))
        }
        (None, Some(reference)) => resolve_upscale(cli, defaults, reference),
        (edit, None) => {
            if let Some(flag) = cli.upscale_flag_in_use() {
                return Err(ConfigError::new(flag, "only applies to upscaling (-u)"));
            }
            let Some(reference) = edit else {
                if cli.strength.is_some() {
                    return Err(ConfigError::new("strength", "only applies to editing (-e)"));
                }
                return Ok(RequestConfig::Generate(resolve_image(cli, defaults, false)?));
            };
            let source = AssetReference::parse(reference)?;
            let strength = validate_unit("strength", cli.strength.unwrap_or(DEFAULT_STRENGTH))?;
            let image = resolve_image(cli, defaults, true)?;
            Ok(RequestConfig::Edit { image, source, strength })
        }
    }
}

fn resolve_image(
    cli: &Cli,
    defaults: &DefaultsConfig,
    editing: bool,
) -> Result<ImageSettings, ConfigError> {
    let prompt = cli.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty()).ok_or_else(|| {
        ConfigError::new("prompt", "a prompt is required for generation and editing. Use -u to upscale")
    })?;

    let model = Model::parse(cli.model.as_deref().unwrap_or("nano"))?;
    let count = validate_range("num", cli.count, 1, MAX_COUNT)?;

    let aspect_ratio = cli
        .aspect_ratio
        .clone()
        .or_else(|| defaults.aspect_ratio.clone())
        .unwrap_or_else(|| "1:1".to_string());
    validate_aspect_ratio(&aspect_ratio)?;

    let resolution = match (model, cli.resolution.as_deref()) {
        (Model::Pro, explicit) => {
            let resolution = explicit.or(defaults.resolution.as_deref()).unwrap_or("1K");
            validate_resolution(resolution)?;
            Some(resolution.to_string())
        }
        (Model::Nano, Some(explicit)) => {
            validate_resolution(explicit)?;
            if explicit != "1K" {
                return Err(ConfigError::new(
                    "resolution",
                    format!("{explicit} needs the pro model; add -m pro to opt in"),
                ));
            }
            None
        }
        (Model::Nano, None) => None,
    };

    Ok(ImageSettings {
        prompt: prompt.to_string(),
        model,
        aspect_ratio,
        inherit_aspect_ratio: editing && cli.aspect_ratio.is_none(),
        resolution,
        count,
    })
}

fn resolve_upscale(
    cli: &Cli,
    defaults: &DefaultsConfig,
    reference: &str,
) -> Result<RequestConfig, ConfigError> {
    for (field, used) in [
        ("model", cli.model.is_some()),
        ("aspect-ratio", cli.aspect_ratio.is_some()),
        ("resolution", cli.resolution.is_some()),
        ("strength", cli.strength.is_some()),
    ] {
        if used {
            return Err(ConfigError::new(field, "does not apply to upscaling"));
        }
    }
    if cli.count != 1 {
        return Err(ConfigError::new("num", "upscaling produces a single image"));
    }

    let source = AssetReference::parse(reference)?;
    let format = OutputFormat::parse(
        cli.format.as_deref().or(defaults.format.as_deref()).unwrap_or("png"),
    )?;

    if cli.interactive {
        let preset_flags = [
            ("scale", cli.scale.is_some()),
            ("engine", cli.engine.is_some()),
            ("preset", cli.preset.is_some()),
            ("prompt", cli.prompt.is_some()),
        ];
        if let Some((flag, _)) = preset_flags
            .into_iter()
            .chain(cli.topaz_flags())
            .chain(cli.bloom_flags())
            .find(|(_, used)| *used)
        {
            return Err(ConfigError::new(flag, "cannot be combined with --interactive"));
        }
        return Ok(RequestConfig::Upscale { source, plan: UpscalePlan::Interactive { format } });
    }

    let preset = match cli.preset.as_deref() {
        Some(name) => Some(presets::find(name).ok_or_else(|| {
            ConfigError::new(
                "preset",
                format!("unknown preset '{name}'. Valid: {}", presets::names().join(", ")),
            )
        })?),
        None => None,
    };

    let engine = match (cli.engine.as_deref(), &preset, defaults.engine.as_deref()) {
        (Some(name), _, _) => Engine::parse(name)?,
        (None, Some(preset), _) => preset.engine,
        (None, None, Some(name)) => Engine::parse(name)?,
        (None, None, None) => Engine::Topaz,
    };

    let scale = validate_scale(cli.scale.unwrap_or(DEFAULT_SCALE))?;

    let engine = match engine {
        Engine::Topaz => {
            reject_foreign_flags(&cli.bloom_flags(), "bloom")?;
            if cli.prompt.is_some() {
                return Err(ConfigError::new("prompt", "only Bloom upscales take a prompt"));
            }
            let mut options = preset.map(|p| p.topaz).unwrap_or_default();
            if let Some(ref name) = cli.upscale_model {
                options.model = TopazModel::parse(name)?;
            }
            if let Some(v) = cli.sharpen {
                options.sharpen = validate_unit("sharpen", v)?;
            }
            if let Some(v) = cli.denoise {
                options.denoise = validate_unit("denoise", v)?;
            }
            if let Some(v) = cli.fix_compression {
                options.fix_compression = validate_unit("fix-compression", v)?;
            }
            options.face_enhancement |= cli.face_enhancement;
            EngineOptions::Topaz(options)
        }
        Engine::Bloom => {
            reject_foreign_flags(&cli.topaz_flags(), "topaz")?;
            let mut options = preset.map(|p| p.bloom).unwrap_or_default();
            if let Some(v) = cli.creativity {
                options.creativity = validate_creativity(v)?;
            }
            options.face_preservation |= cli.face_preservation;
            options.color_preservation |= cli.color_preservation;
            options.prompt = cli.prompt.clone().filter(|p| !p.trim().is_empty());
            EngineOptions::Bloom(options)
        }
    };

    Ok(RequestConfig::Upscale {
        source,
        plan: UpscalePlan::Configured(UpscaleSettings { scale, format, engine }),
    })
}

fn reject_foreign_flags(flags: &[(&'static str, bool)], owner: &str) -> Result<(), ConfigError> {
    match flags.iter().find(|(_, used)| *used) {
        Some(&(flag, _)) => Err(ConfigError::new(flag, format!("only applies to --engine {owner}"))),
        None => Ok(()),
    }
}
