use std::path::Path;

use crate::error::{Error, Result};

/// Accepted video container extensions
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];

/// Accepted audio container extensions
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg", "aac"];

/// Broad media category of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// Classify a filename by its extension, case-insensitively.
pub fn classify_extension(filename: &str) -> Option<MediaKind> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();

    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Validate an uploaded file before any processing happens.
///
/// Order matters: the extension check and the size limit both run before a
/// single transcoder process is spawned, so oversized or unsupported uploads
/// leave no side effects behind.
pub fn validate_upload(path: &Path, filename: &str, max_bytes: u64) -> Result<(MediaKind, u64)> {
    let kind = classify_extension(filename)
        .ok_or_else(|| Error::UnsupportedFormat(filename.to_string()))?;

    let size = fs_err::metadata(path)
        .map_err(|e| Error::InvalidInput(format!("cannot access upload {}: {}", filename, e)))?
        .len();

    if size > max_bytes {
        return Err(Error::PayloadTooLarge {
            size,
            limit: max_bytes,
        });
    }

    Ok((kind, size))
}
