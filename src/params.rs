//! Validation of individual CLI parameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Aspect ratios the generation models accept.
pub const ASPECT_RATIOS: [&str; 10] =
    ["1:1", "16:9", "9:16", "4:3", "3:4", "3:2", "2:3", "5:4", "4:5", "21:9"];

/// Upscale output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG.
    Png,
    /// JPEG.
    Jpg,
    /// WebP.
    Webp,
}

impl OutputFormat {
    /// Parse a format name. `jpeg` is accepted as `jpg`.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is not recognized.
    pub fn parse(format: &str) -> Result<Self, ConfigError> {
        match format {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::Webp),
            other => {
                Err(ConfigError::new("format", format!("unsupported format '{other}'. Valid: png, jpg, webp")))
            }
        }
    }

    /// File extension, also the value sent to the API.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }
}

/// Validate an aspect ratio.
///
/// # Errors
///
/// Returns an error if the ratio is not recognized.
pub fn validate_aspect_ratio(ratio: &str) -> Result<(), ConfigError> {
    if ASPECT_RATIOS.contains(&ratio) {
        Ok(())
    } else {
        Err(ConfigError::new(
            "aspect-ratio",
            format!("unsupported aspect ratio '{ratio}'. Valid: {}", ASPECT_RATIOS.join(", ")),
        ))
    }
}

/// Validate the Pro resolution parameter.
///
/// # Errors
///
/// Returns an error if the resolution is not recognized.
pub fn validate_resolution(resolution: &str) -> Result<(), ConfigError> {
    match resolution {
        "1K" | "2K" | "4K" => Ok(()),
        _ => Err(ConfigError::new(
            "resolution",
            format!("unsupported resolution '{resolution}'. Valid: 1K, 2K, 4K"),
        )),
    }
}

/// Check that a fractional option lies in `0.0..=1.0`.
///
/// # Errors
///
/// Returns an error naming `field` when the value is out of range or not finite.
pub fn validate_unit(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::new(field, format!("{value} is outside 0.0-1.0")))
    }
}

/// Check that an integer option lies in `min..=max`.
///
/// # Errors
///
/// Returns an error naming `field` when the value is out of range.
pub fn validate_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::new(field, format!("{value} is outside {min}-{max}")))
    }
}

/// Validate the upscale factor (1-32).
///
/// # Errors
///
/// Returns an error when the factor is out of range.
pub fn validate_scale(scale: u32) -> Result<u32, ConfigError> {
    validate_range("scale", scale, 1, 32)
}

/// Validate Bloom creativity (1-9).
///
/// # Errors
///
/// Returns an error when the level is out of range.
pub fn validate_creativity(creativity: u32) -> Result<u32, ConfigError> {
    validate_range("creativity", creativity, 1, 9)
}
