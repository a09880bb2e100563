//! Port for publishing a local image so the API can fetch it by URL.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::error::KreaError;

/// Boxed future type returned by [`AssetUploader::upload`].
pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<String, KreaError>> + Send + 'a>>;

/// Uploads a local file and returns its public URL.
pub trait AssetUploader: Send + Sync {
    /// Upload the file at `path`.
    fn upload(&self, path: &Path) -> UploadFuture<'_>;
}
