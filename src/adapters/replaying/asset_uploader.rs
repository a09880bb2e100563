//! Replaying adapter for the `AssetUploader` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::KreaError;
use crate::ports::asset_uploader::{AssetUploader, UploadFuture};

/// Serves recorded upload URLs from a cassette.
pub struct ReplayingAssetUploader {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingAssetUploader {
    /// Create a replaying uploader backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl AssetUploader for ReplayingAssetUploader {
    fn upload(&self, _path: &Path) -> UploadFuture<'_> {
        let result = next_output(&self.replayer, "asset_uploader", "upload")
            .and_then(|output| replay_result::<String>(output).map_err(KreaError::Upload));
        Box::pin(async move { result })
    }
}
