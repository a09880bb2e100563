//! Resolves image references to URLs the API can fetch.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, KreaError};
use crate::history::{Dimensions, LogEntry};
use crate::ports::AssetUploader;

/// Size assumed when the source file cannot be read.
pub const FALLBACK_DIMENSIONS: Dimensions = Dimensions { width: 1024, height: 1024 };

/// Which image an edit or upscale operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetReference {
    /// The most recent image in the log.
    Last,
    /// A public http(s) URL.
    Url(String),
    /// A file on this machine.
    Local(PathBuf),
}

impl AssetReference {
    /// Classify a `-e`/`-u` argument.
    ///
    /// # Errors
    ///
    /// Returns an error for URLs that do not parse or use a scheme other
    /// than http and https.
    pub fn parse(reference: &str) -> Result<Self, ConfigError> {
        if reference == "last" {
            return Ok(Self::Last);
        }
        if !reference.contains("://") {
            return Ok(Self::Local(PathBuf::from(reference)));
        }
        let url = reqwest::Url::parse(reference)
            .map_err(|e| ConfigError::new("image", format!("invalid URL '{reference}': {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Url(reference.to_string())),
            scheme => Err(ConfigError::new(
                "image",
                format!("unsupported URL scheme '{scheme}'; use http(s) or a local path"),
            )),
        }
    }
}

/// A reference resolved to a fetchable URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    /// URL the API will fetch.
    pub url: String,
    /// Local copy, when one is known.
    pub local_path: Option<PathBuf>,
    /// Aspect ratio of the source generation, when known.
    pub aspect_ratio: Option<String>,
}

/// Resolve `reference` to a URL, uploading local files.
///
/// `last` is the most recent log entry, read by the caller.
///
/// # Errors
///
/// Returns [`KreaError::NoPriorImage`] for `Last` with an empty log, and
/// [`KreaError::Upload`] when a local file cannot be published.
pub async fn resolve(
    reference: &AssetReference,
    last: Option<&LogEntry>,
    uploader: Option<&dyn AssetUploader>,
) -> Result<ResolvedAsset, KreaError> {
    match reference {
        AssetReference::Last => {
            let entry = last.ok_or(KreaError::NoPriorImage)?;
            tracing::debug!(url = %entry.krea_url, "using last image");
            Ok(ResolvedAsset {
                url: entry.krea_url.clone(),
                local_path: Some(entry.local_path.clone()),
                aspect_ratio: entry.aspect_ratio().map(str::to_string),
            })
        }
        AssetReference::Url(url) => {
            Ok(ResolvedAsset { url: url.clone(), local_path: None, aspect_ratio: None })
        }
        AssetReference::Local(path) => {
            let uploader = uploader.ok_or_else(|| {
                KreaError::Upload(
                    "FTP not configured. Set FTP_HOST, FTP_USER, FTP_PASS and FTP_PUBLIC_URL \
                     or the [ftp] config section"
                        .to_string(),
                )
            })?;
            if !path.is_file() {
                return Err(KreaError::Upload(format!("file not found: {}", path.display())));
            }
            eprintln!("Uploading {}...", path.display());
            let url = uploader.upload(path).await?;
            tracing::info!(%url, "uploaded local image");
            Ok(ResolvedAsset { url, local_path: Some(path.clone()), aspect_ratio: None })
        }
    }
}

/// Pixel size of the source image, read from the file header when possible.
#[must_use]
pub fn source_dimensions(local_path: Option<&Path>) -> Dimensions {
    let Some(path) = local_path else {
        return FALLBACK_DIMENSIONS;
    };
    match image::image_dimensions(path) {
        Ok((width, height)) => Dimensions { width, height },
        Err(e) => {
            tracing::debug!("cannot read size of {}: {e}; assuming 1024x1024", path.display());
            FALLBACK_DIMENSIONS
        }
    }
}
