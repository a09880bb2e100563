//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::model::DEFAULT_BASE_URL;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API key configuration.
    #[serde(default)]
    pub keys: KeysConfig,

    /// API endpoint configuration.
    #[serde(default)]
    pub api: ApiConfig,

    /// FTP channel used to publish local images.
    #[serde(default)]
    pub ftp: FtpConfig,

    /// Where images and the generation log are written.
    #[serde(default)]
    pub output: OutputConfig,

    /// Default parameter values, used when the matching CLI flag is absent.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// API key configuration.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Krea API key.
    pub krea: Option<String>,
}

/// API endpoint configuration.
#[derive(Debug, Default, Deserialize)]
pub struct ApiConfig {
    /// Base URL override.
    pub base_url: Option<String>,
}

/// FTP settings as written in the config file.
#[derive(Debug, Default, Deserialize)]
pub struct FtpConfig {
    /// Server host name.
    pub host: Option<String>,
    /// Server port (21 when unset).
    pub port: Option<u16>,
    /// Login user.
    pub user: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Remote directory uploads go to.
    pub remote_path: Option<String>,
    /// Public URL that serves `remote_path`.
    pub public_url: Option<String>,
}

/// A complete FTP channel configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpSettings {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Remote directory uploads go to.
    pub remote_path: String,
    /// Public URL that serves `remote_path`.
    pub public_url: String,
}

/// Output locations.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Directory holding `images/` and `generation_log.jsonl`.
    pub dir: Option<PathBuf>,
    /// Reveal the output folder in the file browser after a run.
    pub open_folder: Option<bool>,
}

/// Default parameter values from the config file.
///
/// Has no model entry: Pro is only selected with `-m pro`.
#[derive(Debug, Default, Deserialize)]
pub struct DefaultsConfig {
    /// Default aspect ratio.
    pub aspect_ratio: Option<String>,
    /// Default resolution for the pro model.
    pub resolution: Option<String>,
    /// Default upscale engine.
    pub engine: Option<String>,
    /// Default upscale output format.
    pub format: Option<String>,
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
    }

    /// Get the Krea API key, preferring environment variable.
    #[must_use]
    pub fn krea_key(&self) -> Option<String> {
        env("KREA_API_KEY").or_else(|| self.keys.krea.clone())
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string()
    }

    /// The FTP channel, if host, user, password and public URL are all set.
    ///
    /// Each value prefers its `FTP_*` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if `FTP_PORT` is not a port number.
    pub fn ftp(&self) -> Result<Option<FtpSettings>, String> {
        let port = match env("FTP_PORT") {
            Some(p) => p.parse().map_err(|e| format!("Invalid FTP_PORT '{p}': {e}"))?,
            None => self.ftp.port.unwrap_or(21),
        };
        let host = env("FTP_HOST").or_else(|| self.ftp.host.clone());
        let user = env("FTP_USER").or_else(|| self.ftp.user.clone());
        let password = env("FTP_PASS").or_else(|| self.ftp.password.clone());
        let public_url = env("FTP_PUBLIC_URL").or_else(|| self.ftp.public_url.clone());
        let remote_path = env("FTP_REMOTE_PATH")
            .or_else(|| self.ftp.remote_path.clone())
            .unwrap_or_else(|| "/".to_string());

        let (Some(host), Some(user), Some(password), Some(public_url)) =
            (host, user, password, public_url)
        else {
            return Ok(None);
        };
        Ok(Some(FtpSettings { host, port, user, password, remote_path, public_url }))
    }

    /// Output directory: `KREA_OUTPUT_DIR`, the config file, or
    /// `~/.local/share/krea`.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        if let Some(dir) = env("KREA_OUTPUT_DIR") {
            return PathBuf::from(dir);
        }
        if let Some(ref dir) = self.output.dir {
            return dir.clone();
        }
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".local/share/krea"),
            Err(_) => PathBuf::from("krea-output"),
        }
    }

    /// Whether to reveal the output folder after a run.
    #[must_use]
    pub fn open_folder(&self) -> bool {
        self.output.open_folder.unwrap_or(true)
    }
}

/// A non-empty environment variable.
fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `KREA_CONFIG` environment variable
/// 3. `~/.config/krea/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Some(p) = env("KREA_CONFIG") {
        return PathBuf::from(p);
    }

    default_config_path()
}

/// Default config path: `~/.config/krea/config.toml`.
fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/krea/config.toml")
    } else {
        PathBuf::from("krea.toml")
    }
}
