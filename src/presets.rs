//! Upscale presets per kind of image.

use crate::model::{Engine, TopazModel};
use crate::request::{BloomOptions, TopazOptions};

/// Settings tuned for one kind of source image.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    /// Preset name used on the command line.
    pub name: &'static str,
    /// One-line description shown in interactive mode.
    pub description: &'static str,
    /// Engine recommended for this kind of image.
    pub engine: Engine,
    /// Settings when upscaling with Topaz.
    pub topaz: TopazOptions,
    /// Settings when upscaling with Bloom.
    pub bloom: BloomOptions,
}

/// All presets, in menu order.
#[must_use]
pub fn all() -> Vec<Preset> {
    vec![
        preset(
            "portrait",
            "Portrait photograph (face preservation enabled)",
            Engine::Topaz,
            (TopazModel::HighFidelityV2, 0.4, 0.3, 0.4, true),
            (2, true, true),
        ),
        preset(
            "photo",
            "General photograph (realistic, preserve details)",
            Engine::Topaz,
            (TopazModel::HighFidelityV2, 0.5, 0.3, 0.5, false),
            (2, false, true),
        ),
        preset(
            "artwork",
            "Digital art, illustration, or AI-generated image",
            Engine::Topaz,
            (TopazModel::StandardV2, 0.6, 0.2, 0.3, false),
            (4, false, false),
        ),
        preset(
            "cgi",
            "3D render or CGI content",
            Engine::Topaz,
            (TopazModel::Cgi, 0.5, 0.1, 0.2, false),
            (3, false, true),
        ),
        preset(
            "lowres",
            "Low resolution or heavily compressed source",
            Engine::Bloom,
            (TopazModel::LowResolutionV2, 0.3, 0.7, 0.8, false),
            (5, false, false),
        ),
        preset(
            "text",
            "Image with important text/typography",
            Engine::Topaz,
            (TopazModel::TextRefine, 0.7, 0.2, 0.5, false),
            (1, false, true),
        ),
        preset(
            "creative",
            "Creative reimagining (adds details, more artistic)",
            Engine::Bloom,
            (TopazModel::StandardV2, 0.5, 0.3, 0.5, false),
            (6, false, false),
        ),
    ]
}

/// Look up a preset by name.
#[must_use]
pub fn find(name: &str) -> Option<Preset> {
    all().into_iter().find(|p| p.name == name)
}

/// Names of all presets, for error messages.
#[must_use]
pub fn names() -> Vec<&'static str> {
    all().iter().map(|p| p.name).collect()
}

fn preset(
    name: &'static str,
    description: &'static str,
    engine: Engine,
    (model, sharpen, denoise, fix_compression, face_enhancement): (TopazModel, f64, f64, f64, bool),
    (creativity, face_preservation, color_preservation): (u32, bool, bool),
) -> Preset {
    Preset {
        name,
        description,
        engine,
        topaz: TopazOptions { model, sharpen, denoise, fix_compression, face_enhancement },
        bloom: BloomOptions { creativity, face_preservation, color_preservation, prompt: None },
    }
}
