//! Generation models, upscale engines and their endpoints and prices.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Base URL of the Krea API.
pub const DEFAULT_BASE_URL: &str = "https://api.krea.ai";

/// Text-to-image models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    /// Nano Banana, the default.
    Nano,
    /// Nano Banana Pro. Markedly more expensive; only used when asked for.
    Pro,
}

impl Model {
    /// Parse a CLI model name.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `nano` or `pro`.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "nano" => Ok(Self::Nano),
            "pro" => Ok(Self::Pro),
            other => Err(ConfigError::new("model", format!("unknown model '{other}'. Valid: nano, pro"))),
        }
    }

    /// Short name used in file names and the log.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Nano => "nano",
            Self::Pro => "pro",
        }
    }

    /// Human-readable model name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Nano => "Nano Banana",
            Self::Pro => "Nano Banana Pro",
        }
    }

    /// API path of the generation endpoint.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Nano => "/generate/image/google/nano-banana",
            Self::Pro => "/generate/image/google/nano-banana-pro",
        }
    }

    /// Estimated cost per image in USD.
    #[must_use]
    pub fn cost(self) -> f64 {
        match self {
            Self::Nano => 0.08,
            Self::Pro => 0.30,
        }
    }
}

/// Remote upscaling backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Topaz standard enhance: fast and faithful.
    Topaz,
    /// Topaz Bloom: slow, adds invented detail.
    Bloom,
}

impl Engine {
    /// Parse a CLI engine name.
    ///
    /// # Errors
    ///
    /// Returns an error for anything other than `topaz` or `bloom`.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "topaz" => Ok(Self::Topaz),
            "bloom" => Ok(Self::Bloom),
            other => {
                Err(ConfigError::new("engine", format!("unknown engine '{other}'. Valid: topaz, bloom")))
            }
        }
    }

    /// CLI and log name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Topaz => "topaz",
            Self::Bloom => "bloom",
        }
    }

    /// API path of the enhance endpoint.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Topaz => "/generate/enhance/topaz/standard-enhance",
            Self::Bloom => "/generate/enhance/topaz/bloom-enhance",
        }
    }

    /// Estimated cost per upscale in USD.
    #[must_use]
    pub fn cost(self) -> f64 {
        match self {
            Self::Topaz => 0.15,
            Self::Bloom => 0.75,
        }
    }

    /// Largest output side the engine accepts, in pixels.
    #[must_use]
    pub fn max_dimension(self) -> u32 {
        match self {
            Self::Topaz => 22_000,
            Self::Bloom => 10_000,
        }
    }
}

/// Topaz enhancement models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopazModel {
    /// General purpose.
    #[serde(rename = "Standard V2")]
    StandardV2,
    /// For very low resolution sources.
    #[serde(rename = "Low Resolution V2")]
    LowResolutionV2,
    /// For 3D renders.
    #[serde(rename = "CGI")]
    Cgi,
    /// Maximum detail.
    #[serde(rename = "High Fidelity V2")]
    HighFidelityV2,
    /// Keeps text legible.
    #[serde(rename = "Text Refine")]
    TextRefine,
}

impl TopazModel {
    /// All models, in menu order.
    pub const ALL: [Self; 5] =
        [Self::StandardV2, Self::HighFidelityV2, Self::LowResolutionV2, Self::Cgi, Self::TextRefine];

    /// Parse the API name of a model (e.g. `"High Fidelity V2"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a Topaz model.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        Self::ALL.into_iter().find(|m| m.api_name().eq_ignore_ascii_case(name)).ok_or_else(|| {
            let valid: Vec<&str> = Self::ALL.iter().map(|m| m.api_name()).collect();
            ConfigError::new(
                "upscale-model",
                format!("unknown Topaz model '{name}'. Valid: {}", valid.join(", ")),
            )
        })
    }

    /// Name the API expects.
    #[must_use]
    pub fn api_name(self) -> &'static str {
        match self {
            Self::StandardV2 => "Standard V2",
            Self::LowResolutionV2 => "Low Resolution V2",
            Self::Cgi => "CGI",
            Self::HighFidelityV2 => "High Fidelity V2",
            Self::TextRefine => "Text Refine",
        }
    }
}
