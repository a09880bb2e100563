//! Live adapter that publishes local images over FTP.

use std::fs::File;
use std::net::ToSocketAddrs;
use std::path::Path;
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};
use uuid::Uuid;

use crate::config::FtpSettings;
use crate::error::KreaError;
use crate::ports::asset_uploader::{AssetUploader, UploadFuture};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Uploads files to an FTP server whose directory is served over HTTP.
pub struct FtpUploader {
    settings: FtpSettings,
}

impl FtpUploader {
    /// Create an uploader for the given server.
    #[must_use]
    pub fn new(settings: FtpSettings) -> Self {
        Self { settings }
    }
}

impl AssetUploader for FtpUploader {
    fn upload(&self, path: &Path) -> UploadFuture<'_> {
        let settings = self.settings.clone();
        let path = path.to_path_buf();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || upload_blocking(&settings, &path))
                .await
                .map_err(|e| KreaError::Upload(format!("upload task failed: {e}")))?
        })
    }
}

fn upload_blocking(settings: &FtpSettings, path: &Path) -> Result<String, KreaError> {
    let mut file = File::open(path)
        .map_err(|e| KreaError::Upload(format!("cannot read {}: {e}", path.display())))?;
    let name = upload_name(path);
    let ftp_err = |e: suppaftp::FtpError| KreaError::Upload(format!("FTP error: {e}"));

    let addr = (settings.host.as_str(), settings.port)
        .to_socket_addrs()
        .map_err(|e| KreaError::Upload(format!("cannot resolve {}: {e}", settings.host)))?
        .next()
        .ok_or_else(|| KreaError::Upload(format!("no address for {}", settings.host)))?;

    tracing::info!(host = %settings.host, file = %name, "uploading over FTP");
    let mut ftp = FtpStream::connect_timeout(addr, CONNECT_TIMEOUT).map_err(ftp_err)?;
    ftp.login(settings.user.as_str(), settings.password.as_str()).map_err(ftp_err)?;
    ftp.set_mode(Mode::Passive);
    ftp.transfer_type(FileType::Binary).map_err(ftp_err)?;

    let segments = remote_segments(&settings.remote_path);
    if !segments.is_empty() {
        let full = format!("/{}", segments.join("/"));
        if ftp.cwd(&full).is_err() {
            let mut current = String::new();
            for segment in segments {
                current = format!("{current}/{segment}");
                if ftp.cwd(&current).is_err() {
                    ftp.mkdir(&current).map_err(ftp_err)?;
                    ftp.cwd(&current).map_err(ftp_err)?;
                }
            }
        }
    }

    ftp.put_file(&name, &mut file).map_err(ftp_err)?;
    if let Err(e) = ftp.quit() {
        tracing::warn!("FTP quit failed: {e}");
    }

    Ok(public_url(&settings.public_url, &name))
}

/// Random 12-hex-character name keeping the file's extension.
fn upload_name(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or_else(|| "png".to_string(), str::to_ascii_lowercase);
    let stem = Uuid::new_v4().simple().to_string();
    format!("{}.{ext}", &stem[..12])
}

fn remote_segments(remote_path: &str) -> Vec<&str> {
    remote_path.split('/').filter(|s| !s.is_empty()).collect()
}

fn public_url(base: &str, name: &str) -> String {
    format!("{}/{name}", base.trim_end_matches('/'))
}
