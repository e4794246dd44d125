use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::media::run_tool;

/// Platform caption lookup. Absence and transport failures are equivalent at
/// this boundary: both yield `None`, and the pipeline falls through to
/// speech recognition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// Fetch the best available caption text for a platform video id.
    async fn fetch(&self, video_id: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptionKind {
    Manual,
    Auto,
}

/// Caption tiers in priority order. Manual tracks beat auto-generated ones,
/// and the primary language beats the secondary.
fn caption_tiers<'a>(primary: &'a str, secondary: &'a str) -> [(CaptionKind, &'a str); 4] {
    [
        (CaptionKind::Manual, primary),
        (CaptionKind::Auto, primary),
        (CaptionKind::Manual, secondary),
        (CaptionKind::Auto, secondary),
    ]
}

/// One tier of the caption lookup. Split from the walk so the tier order is
/// checkable without shelling out.
#[async_trait]
trait TierLookup: Sync {
    async fn lookup(&self, video_id: &str, kind: CaptionKind, language: &str) -> Option<String>;
}

/// Walk the tiers in order; a tier is consulted only after every
/// higher-priority tier produced nothing.
async fn first_caption<T: TierLookup>(
    source: &T,
    video_id: &str,
    tiers: &[(CaptionKind, &str)],
) -> Option<String> {
    for &(kind, language) in tiers {
        if let Some(text) = source.lookup(video_id, kind, language).await {
            return Some(text);
        }
    }
    None
}

/// Caption source backed by yt-dlp's subtitle download.
///
/// Tries caption tracks in a fixed priority order: manually-created captions
/// in the primary language, auto-generated in the primary language, then the
/// same pair for the secondary language. The first track found wins.
pub struct YtDlpCaptionSource {
    yt_dlp_path: String,
    primary_language: String,
    secondary_language: String,
    timeout: Duration,
}

impl YtDlpCaptionSource {
    pub fn new(primary_language: &str, secondary_language: &str, timeout: Duration) -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            primary_language: primary_language.to_string(),
            secondary_language: secondary_language.to_string(),
            timeout,
        }
    }

    /// Fetch one caption tier; any failure collapses to `None`.
    async fn fetch_tier(&self, video_id: &str, kind: CaptionKind, language: &str) -> Option<String> {
        let temp_dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("Could not create caption temp dir: {}", e);
                return None;
            }
        };

        let output_template = temp_dir.path().join("%(id)s.%(ext)s");
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let sub_flag = match kind {
            CaptionKind::Manual => "--write-sub",
            CaptionKind::Auto => "--write-auto-sub",
        };

        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args([
            "--skip-download",
            sub_flag,
            "--sub-lang",
            language,
            "--sub-format",
            "vtt",
            "--no-warnings",
            "--no-playlist",
            "-o",
        ])
        .arg(&output_template)
        .arg(&url)
        .stdin(Stdio::null());

        let output = match run_tool(&mut cmd, self.timeout, "yt-dlp").await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Caption fetch failed ({:?}/{}): {}", kind, language, e);
                return None;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(
                "yt-dlp caption lookup unsuccessful ({:?}/{}): {}",
                kind,
                language,
                stderr.trim()
            );
            return None;
        }

        let vtt_path = first_vtt_file(temp_dir.path())?;
        let raw = match fs_err::read_to_string(&vtt_path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not read caption file {}: {}", vtt_path.display(), e);
                return None;
            }
        };

        let text = vtt_to_text(&raw);
        if text.is_empty() {
            None
        } else {
            tracing::info!(
                "Caption found for {} ({:?}, {}), {} chars",
                video_id,
                kind,
                language,
                text.chars().count()
            );
            Some(text)
        }
    }
}

#[async_trait]
impl TierLookup for YtDlpCaptionSource {
    async fn lookup(&self, video_id: &str, kind: CaptionKind, language: &str) -> Option<String> {
        self.fetch_tier(video_id, kind, language).await
    }
}

#[async_trait]
impl CaptionProvider for YtDlpCaptionSource {
    async fn fetch(&self, video_id: &str) -> Option<String> {
        let tiers = caption_tiers(&self.primary_language, &self.secondary_language);
        let text = first_caption(self, video_id, &tiers).await;
        if text.is_none() {
            tracing::info!("No captions available for {}", video_id);
        }
        text
    }
}

fn first_vtt_file(dir: &std::path::Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .flatten()
        .map(|e| e.path())
        .find(|p| p.extension().and_then(|s| s.to_str()) == Some("vtt"))
}

/// Normalize WebVTT cue text into plain transcript text.
///
/// Drops the header, timing lines, numeric cue ids and inline markup
/// (`<c>`, word-level `<00:00:01.000>` stamps), then collapses whitespace.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut pieces: Vec<String> = Vec::new();

    for line in vtt.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("webvtt")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
            || line.starts_with("STYLE")
        {
            continue;
        }
        if line.contains("-->") {
            continue;
        }
        if line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let cleaned = strip_inline_tags(line);
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        if !collapsed.is_empty() {
            pieces.push(collapsed);
        }
    }

    pieces.join(" ").trim().to_string()
}

fn strip_inline_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;

    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }

    out
}
