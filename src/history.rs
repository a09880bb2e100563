//! Append-only JSONL log of completed operations.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::KreaError;
use crate::model::{Engine, Model, TopazModel};

/// File name of the log inside the output directory.
pub const LOG_FILE_NAME: &str = "generation_log.jsonl";

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One completed operation, as written to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the result was saved.
    pub timestamp: DateTime<Local>,
    /// Where the image was saved.
    pub local_path: PathBuf,
    /// Where the service hosts the result.
    pub krea_url: String,
    /// Estimated cost in USD.
    pub cost: f64,
    /// Operation-specific fields.
    #[serde(flatten)]
    pub details: OperationDetails,
}

/// The fields that differ per operation, tagged by `operation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationDetails {
    /// Text-to-image generation or an edit.
    Generate {
        /// Prompt sent.
        prompt: String,
        /// Model id.
        model: Model,
        /// Human-readable model name.
        model_name: String,
        /// Aspect ratio sent.
        aspect_ratio: String,
        /// Whether this was an edit of an existing image.
        is_edit: bool,
        /// Edited image.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_image_url: Option<String>,
        /// Edit strength.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        edit_strength: Option<f64>,
        /// Pro resolution.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolution: Option<String>,
    },
    /// Topaz standard enhance.
    UpscaleTopaz {
        /// Always `topaz`.
        engine: Engine,
        /// Upscaled image.
        source_url: String,
        /// Scale factor.
        scale_factor: u32,
        /// Topaz model.
        upscale_model: TopazModel,
        /// Requested output size, `WxH`.
        target_dimensions: String,
        /// Sharpening.
        sharpen: f64,
        /// Denoising.
        denoise: f64,
        /// Compression fix.
        fix_compression: f64,
        /// Face enhancement.
        face_enhancement: bool,
    },
    /// Topaz Bloom creative enhance.
    UpscaleBloom {
        /// Always `bloom`.
        engine: Engine,
        /// Upscaled image.
        source_url: String,
        /// Scale factor.
        scale_factor: u32,
        /// Creativity.
        creativity: u32,
        /// Face preservation.
        face_preservation: bool,
        /// Color preservation.
        color_preservation: bool,
        /// Requested output size, `WxH`.
        target_dimensions: String,
        /// Guidance prompt.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
    },
}

impl LogEntry {
    /// Aspect ratio of a generated image; upscales do not record one.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<&str> {
        match &self.details {
            OperationDetails::Generate { aspect_ratio, .. } => Some(aspect_ratio),
            _ => None,
        }
    }
}

/// The log file under an output directory.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    /// The log inside `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        Self { path: output_dir.join(LOG_FILE_NAME) }
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub fn append(&self, entry: &LogEntry) -> Result<(), KreaError> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| KreaError::Io(std::io::Error::other(e)))?;
        line.push('\n');
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// The most recent readable entry, or `None` for a missing or empty log.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn latest(&self) -> Result<Option<LogEntry>, KreaError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entry = content.lines().rev().filter(|l| !l.trim().is_empty()).find_map(|line| {
            match serde_json::from_str::<LogEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("skipping unreadable log line: {e}");
                    None
                }
            }
        });
        Ok(entry)
    }
}
