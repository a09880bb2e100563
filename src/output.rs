//! File naming, image saving, and revealing the output folder.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use chrono::{DateTime, Local};

use crate::error::KreaError;

/// Longest slug taken from a prompt.
pub const SLUG_MAX_LEN: usize = 50;

/// Turn a prompt into a file-name slug.
///
/// Keeps ASCII letters, digits, whitespace and hyphens, joins words with
/// single hyphens, and cuts long slugs at a word boundary.
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for ch in kept.chars() {
        if ch == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(ch);
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        if let Some(idx) = slug.rfind('-') {
            slug.truncate(idx);
        }
    }

    if slug.is_empty() {
        "image".to_string()
    } else {
        slug
    }
}

/// Where one result image is saved:
/// `<output_dir>/images/YYYY-MM-DD/HH-MM-SS-<label>[-<index>].<ext>`.
#[must_use]
pub fn image_path(
    output_dir: &Path,
    now: &DateTime<Local>,
    label: &str,
    index: Option<usize>,
    ext: &str,
) -> PathBuf {
    let suffix = index.map(|i| format!("-{i}")).unwrap_or_default();
    output_dir
        .join("images")
        .join(now.format("%Y-%m-%d").to_string())
        .join(format!("{}-{label}{suffix}.{ext}", now.format("%H-%M-%S")))
}

/// Pick a file extension for downloaded bytes.
///
/// Tries the `Content-Type` header, then the URL, then the byte signature,
/// and falls back to `jpg`.
#[must_use]
pub fn detect_extension(content_type: Option<&str>, url: &str, data: &[u8]) -> &'static str {
    if let Some(ext) = content_type.and_then(extension_for_mime) {
        return ext;
    }
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    for (suffix, ext) in [(".png", "png"), (".webp", "webp"), (".jpg", "jpg"), (".jpeg", "jpg")] {
        if path.ends_with(suffix) {
            return ext;
        }
    }
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => "png",
        Ok(image::ImageFormat::WebP) => "webp",
        _ => "jpg",
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let mime = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

/// Write image bytes, creating the date folder as needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_image(data: &[u8], path: &Path) -> Result<(), KreaError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

/// Open `dir` in the platform file browser. Failures are only logged.
pub fn reveal_folder(dir: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    let spawned = Command::new(opener)
        .arg(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if let Err(e) = spawned {
        tracing::warn!("could not open {} with {opener}: {e}", dir.display());
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn slug_basic() {
        assert_eq!(slugify("A red bicycle"), "a-red-bicycle");
    }

    #[test]
    fn slug_drops_punctuation() {
        assert_eq!(slugify("A cat!! sitting on a mat..."), "a-cat-sitting-on-a-mat");
        assert_eq!(slugify("don't   stop_me -- now"), "dont-stopme-now");
    }

    #[test]
    fn slug_cuts_at_word_boundary() {
        let slug = slugify("a very long prompt about a lighthouse standing on a rocky shore at dusk");
        assert!(slug.len() <= SLUG_MAX_LEN);
        assert_eq!(slug, "a-very-long-prompt-about-a-lighthouse-standing-on");
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn slug_without_hyphen_is_cut_hard() {
        assert_eq!(slugify(&"x".repeat(80)).len(), SLUG_MAX_LEN);
    }

    #[test]
    fn slug_empty() {
        assert_eq!(slugify(""), "image");
        assert_eq!(slugify("!!! ???"), "image");
        assert_eq!(slugify("日本"), "image");
    }

    #[test]
    fn path_layout() {
        let now = Local.with_ymd_and_hms(2026, 3, 14, 9, 5, 7).unwrap();
        let path = image_path(Path::new("/out"), &now, "nano-a-red-bicycle", None, "png");
        assert_eq!(path, PathBuf::from("/out/images/2026-03-14/09-05-07-nano-a-red-bicycle.png"));

        let path = image_path(Path::new("/out"), &now, "upscale-4x", Some(2), "webp");
        assert_eq!(path, PathBuf::from("/out/images/2026-03-14/09-05-07-upscale-4x-2.webp"));
    }

    #[test]
    fn extension_from_content_type() {
        assert_eq!(detect_extension(Some("image/png"), "https://x/a", &[]), "png");
        assert_eq!(detect_extension(Some("image/webp; charset=binary"), "https://x/a", &[]), "webp");
        assert_eq!(detect_extension(Some("image/jpeg"), "https://x/a.png", &[]), "jpg");
    }

    #[test]
    fn extension_from_url() {
        assert_eq!(detect_extension(None, "https://x/a.WEBP?sig=1", &[]), "webp");
        assert_eq!(detect_extension(Some("application/octet-stream"), "https://x/a.jpeg", &[]), "jpg");
    }

    #[test]
    fn extension_from_bytes() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_extension(None, "https://x/a", &png_magic), "png");
        assert_eq!(detect_extension(None, "https://x/a", b"????"), "jpg");
    }

    #[test]
    fn save_creates_date_folder() {
        let dir = std::env::temp_dir().join("krea_output_save");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("images/2026-01-01/00-00-00-nano-cat.png");
        save_image(b"bytes", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
