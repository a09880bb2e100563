//! Service context that bundles all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::ftp::FtpUploader;
use crate::adapters::live::krea::KreaClient;
use crate::adapters::recording::asset_uploader::RecordingAssetUploader;
use crate::adapters::recording::krea_api::RecordingKreaApi;
use crate::adapters::replaying::asset_uploader::ReplayingAssetUploader;
use crate::adapters::replaying::krea_api::ReplayingKreaApi;
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Config;
use crate::error::KreaError;
use crate::ports::{AssetUploader, KreaApi};

/// Bundles all port trait objects into a single context.
pub struct ServiceContext {
    /// Krea API port.
    pub api: Box<dyn KreaApi>,
    /// File-transfer port; `None` when FTP is not configured.
    pub uploader: Option<Box<dyn AssetUploader>>,
}

/// Handle to a recording session that must be finished after use.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Write the cassette. The context must be dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if adapters still hold the recorder or the file
    /// cannot be written.
    pub fn finish(self) -> Result<PathBuf, String> {
        let recorder = Arc::try_unwrap(self.recorder)
            .map_err(|_| "Recording adapter still has references".to_string())?
            .into_inner()
            .map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

impl ServiceContext {
    /// Create a live context from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the FTP settings are
    /// malformed.
    pub fn live(config: &Config) -> Result<Self, KreaError> {
        let key = config.krea_key().ok_or_else(|| {
            KreaError::Auth("KREA_API_KEY not set. Export it or add it under [keys] in the config file".into())
        })?;
        let api = Box::new(KreaClient::new(key, config.base_url())?);
        let uploader = config
            .ftp()
            .map_err(KreaError::ConfigFile)?
            .map(|settings| Box::new(FtpUploader::new(settings)) as Box<dyn AssetUploader>);
        Ok(Self { api, uploader })
    }

    /// Create a recording context that wraps the live adapters with a recorder.
    ///
    /// # Errors
    ///
    /// Returns an error if the live context cannot be created.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), KreaError> {
        let live = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let path = Path::new(".krea/cassettes").join(&timestamp).join("session.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-session"),
            get_commit_hash(),
        )));

        let api = Box::new(RecordingKreaApi::new(live.api, Arc::clone(&recorder)));
        let uploader = live.uploader.map(|inner| {
            Box::new(RecordingAssetUploader::new(inner, Arc::clone(&recorder))) as Box<dyn AssetUploader>
        });

        Ok((Self { api, uploader }, RecordingSession { recorder }))
    }

    /// Create a replaying context from a cassette file.
    ///
    /// The uploader is only present when FTP is configured, so an
    /// unconfigured channel fails the same way it does live.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be loaded.
    pub fn replaying(path: &Path, config: &Config) -> Result<Self, KreaError> {
        let cassette = Cassette::load(path).map_err(KreaError::ConfigFile)?;
        tracing::info!(name = %cassette.name, interactions = cassette.interactions.len(), "replaying cassette");
        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(cassette)));

        let api = Box::new(ReplayingKreaApi::new(Arc::clone(&replayer)));
        let uploader = config.ftp().map_err(KreaError::ConfigFile)?.map(|_| {
            Box::new(ReplayingAssetUploader::new(Arc::clone(&replayer))) as Box<dyn AssetUploader>
        });
        Ok(Self { api, uploader })
    }
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
