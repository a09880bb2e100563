//! Recording adapter for the `AssetUploader` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::asset_uploader::{AssetUploader, UploadFuture};

/// Records uploads while delegating to an inner implementation.
pub struct RecordingAssetUploader {
    inner: Box<dyn AssetUploader>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingAssetUploader {
    /// Creates a new recording uploader wrapping the given implementation.
    pub fn new(inner: Box<dyn AssetUploader>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl AssetUploader for RecordingAssetUploader {
    fn upload(&self, path: &Path) -> UploadFuture<'_> {
        let path = path.to_path_buf();
        Box::pin(async move {
            let result = self.inner.upload(&path).await;
            record_result(&self.recorder, "asset_uploader", "upload", &path, &result);
            result
        })
    }
}
