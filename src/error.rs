//! Unified error type for krea.

use thiserror::Error;

use crate::cassette::replayer::ReplayError;

/// An invalid command-line input, tied to the flag that caused it.
#[derive(Debug, Error, PartialEq)]
#[error("Invalid {field}: {message}")]
pub struct ConfigError {
    /// Name of the offending field (e.g. `"strength"`).
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    /// Create a config error for `field`.
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

/// Errors that can occur while generating, editing or upscaling.
#[derive(Debug, Error)]
pub enum KreaError {
    /// Bad command-line input.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The config file could not be read or parsed.
    #[error("Config file error: {0}")]
    ConfigFile(String),

    /// Missing or rejected credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The account balance does not cover the request.
    #[error("Insufficient credits: {0}")]
    Quota(String),

    /// The service rejected the prompt or parameters.
    #[error("Request rejected: {0}. Rephrase the prompt or adjust the parameters.")]
    Validation(String),

    /// A network or server-side failure that outlived its retries.
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The job did not reach a terminal state in time.
    #[error("Job {job_id} did not finish within {waited_secs}s; check its status manually")]
    Timeout {
        /// Remote job identifier.
        job_id: String,
        /// Seconds spent waiting.
        waited_secs: u64,
    },

    /// The remote job ended in failure.
    #[error("Job {job_id} failed: {message}")]
    JobFailed {
        /// Remote job identifier.
        job_id: String,
        /// Reason reported by the service.
        message: String,
    },

    /// A local image could not be made available by URL.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// No earlier image is recorded in the log.
    #[error("No previous image found. Generate an image first or provide a URL.")]
    NoPriorImage,

    /// An API returned an unexpected error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// A cassette could not serve the requested interaction.
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KreaError {
    /// Classify a non-success HTTP status from the API.
    #[must_use]
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth(format!("the API key was rejected ({status}). Check KREA_API_KEY.")),
            402 => Self::Quota("top up at krea.ai".to_string()),
            400 | 422 => Self::Validation(body),
            429 | 500..=599 => Self::Transient(format!("HTTP {status}: {body}")),
            _ => Self::Api { status, message: body },
        }
    }

    /// Classify a non-success status from a result download.
    ///
    /// Result URLs are fetched without the API key, so a 401 or 403 means
    /// the URL itself was refused.
    #[must_use]
    pub fn from_download_status(status: u16, url: &str, body: &str) -> Self {
        let message = format!("download of {url} failed: {body}");
        match status {
            429 | 500..=599 => Self::Transient(format!("HTTP {status}: {message}")),
            _ => Self::Api { status, message },
        }
    }

    /// Whether retrying the same idempotent request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Network(_))
    }

    /// Process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }
}
