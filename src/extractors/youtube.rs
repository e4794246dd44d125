use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use crate::error::{Error, Result};
use crate::media::run_tool;

/// Resolve a platform video identifier from user input.
///
/// Accepts a bare 11-character id, `watch?v=` URLs, `youtu.be` short links
/// and `/shorts/`, `/embed/`, `/v/` path forms.
pub fn video_id(input: &str) -> Option<String> {
    let trimmed = input.trim();

    if is_bare_id(trimmed) {
        return Some(trimmed.to_string());
    }

    let url = Url::parse(trimmed).ok()?;
    let host = url.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    // youtu.be/<id>
    if host.eq_ignore_ascii_case("youtu.be") {
        let seg = url.path_segments()?.next()?.trim().to_string();
        if is_bare_id(&seg) {
            return Some(seg);
        }
        return None;
    }

    // youtube.com/watch?v=<id>
    if url.path().starts_with("/watch") {
        for (key, value) in url.query_pairs() {
            if key == "v" && is_bare_id(value.trim()) {
                return Some(value.trim().to_string());
            }
        }
        return None;
    }

    // youtube.com/shorts/<id>, /embed/<id>, /v/<id>
    let mut segments = url.path_segments()?;
    let first = segments.next().unwrap_or("");
    let second = segments.next().unwrap_or("").trim();
    if matches!(first, "shorts" | "embed" | "v") && is_bare_id(second) {
        return Some(second.to_string());
    }

    None
}

/// Whether the input looks like a URL of the supported platform at all.
pub fn is_platform_url(input: &str) -> bool {
    Url::parse(input.trim())
        .ok()
        .and_then(|u| u.host_str().map(is_youtube_host))
        .unwrap_or(false)
}

fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com"
        || h == "youtu.be"
        || h == "m.youtube.com"
        || h.ends_with(".youtube.com")
}

fn is_bare_id(s: &str) -> bool {
    s.len() == 11 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Downloaded platform media, normalized to an audio file plus metadata
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    /// Path to the downloaded audio file
    pub audio_path: PathBuf,

    /// Platform-reported duration in seconds (0 when unknown)
    pub duration_seconds: f64,

    /// Platform-reported title
    pub title: Option<String>,
}

/// Platform media download capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Download the audio track of a platform video into `dest_dir`.
    async fn download_audio(&self, video_id: &str, dest_dir: &Path) -> Result<DownloadedMedia>;
}

/// yt-dlp backed downloader
pub struct YtDlpDownloader {
    yt_dlp_path: String,
    timeout: Duration,
}

impl YtDlpDownloader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            timeout,
        }
    }

    /// Fetch video metadata (duration, title) without downloading.
    async fn video_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Fetching video metadata for: {}", url);

        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args(["--dump-json", "--no-playlist", url]);

        let output = run_tool(&mut cmd, self.timeout, "yt-dlp").await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Internal(format!(
                "yt-dlp metadata lookup failed: {}",
                stderr.trim()
            )));
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::Internal(format!("yt-dlp metadata parse failed: {}", e)))?;

        Ok(info)
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn download_audio(&self, video_id: &str, dest_dir: &Path) -> Result<DownloadedMedia> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let info = self.video_info(&url).await?;
        let duration_seconds = info["duration"].as_f64().unwrap_or(0.0).max(0.0);
        let title = info["title"].as_str().map(|s| s.to_string());

        let audio_path = dest_dir.join(format!("download_{}.mp3", uuid::Uuid::new_v4()));
        tracing::info!("Downloading audio for {} to {}", video_id, audio_path.display());

        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args([
            "--output",
            &audio_path.to_string_lossy(),
            // Smallest usable audio: transcription does not need fidelity
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "9",
            "--format",
            "worstaudio[acodec^=mp4a]/worstaudio[ext=m4a]/worstaudio[ext=mp3]/worstaudio",
            "--no-playlist",
            "--no-warnings",
            &url,
        ]);

        let output = run_tool(&mut cmd, self.timeout, "yt-dlp").await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Internal(format!(
                "yt-dlp download failed: {}",
                stderr.trim()
            )));
        }

        if !audio_path.exists() {
            return Err(Error::Internal(
                "yt-dlp reported success but produced no audio file".to_string(),
            ));
        }

        Ok(DownloadedMedia {
            audio_path,
            duration_seconds,
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_url_variants() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), expected);
        assert_eq!(video_id("https://youtu.be/dQw4w9WgXcQ"), expected);
        assert_eq!(video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"), expected);
        assert_eq!(video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), expected);
        assert_eq!(video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ"), expected);
    }

    #[test]
    fn test_video_id_bare_identifier() {
        assert_eq!(video_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(video_id(" dQw4w9WgXcQ "), Some("dQw4w9WgXcQ".to_string()));
    }

    #[test]
    fn test_video_id_rejects_foreign_and_malformed() {
        assert_eq!(video_id("https://vimeo.com/12345"), None);
        assert_eq!(video_id("https://www.youtube.com/watch"), None);
        assert_eq!(video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(video_id("tooshort"), None);
        assert_eq!(video_id("way-too-long-to-be-an-id"), None);
    }

    #[test]
    fn test_is_platform_url() {
        assert!(is_platform_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_platform_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(!is_platform_url("https://example.com/video.mp4"));
        assert!(!is_platform_url("not a url"));
    }
}
