use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{Error, Result};

pub mod thumbnail;

pub use thumbnail::{ThumbnailArtifact, ThumbnailExtractor};

/// Media toolkit capability consumed by the pipeline: duration probing,
/// audio normalization and single-frame capture, all backed by the external
/// transcoder (ffmpeg/ffprobe).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Duration of the media file in seconds. Missing or invalid probe
    /// output is normalized to 0.0 and never reported as an error.
    async fn probe_duration(&self, path: &Path) -> f64;

    /// Extract a mono 16kHz PCM waveform suitable for speech recognition.
    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()>;

    /// Capture a single frame at the given timestamp. An empty byte vector
    /// means the transcoder produced no image.
    async fn capture_frame(&self, input: &Path, at_secs: f64) -> Result<Vec<u8>>;
}

/// Run an external tool to completion with a bounded timeout.
pub(crate) async fn run_tool(
    cmd: &mut Command,
    timeout: Duration,
    tool: &str,
) -> Result<std::process::Output> {
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(output) => Ok(output?),
        Err(_) => Err(Error::Timeout(format!(
            "{} did not finish within {}s",
            tool,
            timeout.as_secs()
        ))),
    }
}

/// Classify an ffmpeg failure from its stderr output.
///
/// The transcoder reports a missing audio stream in several phrasings
/// depending on the container; everything else is an unknown extraction
/// failure.
fn classify_extraction_failure(stderr: &str) -> Error {
    let lowered = stderr.to_lowercase();
    let no_audio_markers = [
        "does not contain any stream",
        "matches no streams",
        "no audio",
        "codec parameters not found",
    ];

    if no_audio_markers.iter().any(|m| lowered.contains(m)) {
        Error::NoAudioTrack
    } else {
        Error::AudioExtractionFailed(truncate_stderr(stderr))
    }
}

fn truncate_stderr(stderr: &str) -> String {
    const MAX: usize = 500;
    let trimmed = stderr.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        // Keep the tail: ffmpeg puts the actual error last
        let tail_start = trimmed.len() - MAX;
        let mut start = tail_start;
        while !trimmed.is_char_boundary(start) {
            start += 1;
        }
        format!("...{}", &trimmed[start..])
    }
}

/// FFmpeg-backed implementation of the media toolkit
pub struct FfmpegToolkit {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl FfmpegToolkit {
    pub fn new(timeout: Duration) -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration(&self, path: &Path) -> f64 {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path);

        let output = match run_tool(&mut cmd, self.timeout, "ffprobe").await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Duration probe failed for {}: {}", path.display(), e);
                return 0.0;
            }
        };

        let raw = String::from_utf8_lossy(&output.stdout);
        match raw.trim().parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds > 0.0 => seconds,
            _ => {
                tracing::warn!(
                    "Could not parse duration for {}: {:?}",
                    path.display(),
                    raw.trim()
                );
                0.0
            }
        }
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()> {
        tracing::info!(
            "Extracting audio from {} to {}",
            input.display(),
            output.display()
        );

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-i")
            .arg(input)
            .args([
                "-vn",
                "-acodec",
                "pcm_s16le",
                "-ar",
                "16000",
                "-ac",
                "1",
                "-af",
                "highpass=f=300,lowpass=f=3000",
                "-y",
            ])
            .arg(output);

        let result = run_tool(&mut cmd, self.timeout, "ffmpeg").await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!("Audio extraction failed: {}", stderr);
            return Err(classify_extraction_failure(&stderr));
        }

        // ffmpeg can report success for containers with a declared but empty
        // audio stream; a zero-byte waveform is treated as no audio.
        let size = fs_err::metadata(output).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(Error::NoAudioTrack);
        }

        tracing::info!("Audio extraction completed ({} bytes)", size);
        Ok(())
    }

    async fn capture_frame(&self, input: &Path, at_secs: f64) -> Result<Vec<u8>> {
        tracing::debug!(
            "Capturing frame at {:.1}s from {}",
            at_secs,
            input.display()
        );

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-ss", &format!("{:.3}", at_secs)])
            .arg("-i")
            .arg(input)
            .args(["-vframes", "1", "-f", "image2pipe", "-vcodec", "png", "-"]);

        let output = run_tool(&mut cmd, self.timeout, "ffmpeg").await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Internal(format!(
                "frame capture failed: {}",
                truncate_stderr(&stderr)
            )));
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_missing_audio_stream() {
        let cases = [
            "Output file #0 does not contain any stream",
            "Stream map '0:a' matches no streams.",
            "could not find codec parameters for stream 0",
            "there is NO AUDIO in this file",
        ];
        for stderr in cases {
            assert!(
                matches!(classify_extraction_failure(stderr), Error::NoAudioTrack),
                "expected NoAudioTrack for {:?}",
                stderr
            );
        }
    }

    #[test]
    fn test_classify_unknown_failure() {
        let err = classify_extraction_failure("Invalid data found when processing input");
        assert!(matches!(err, Error::AudioExtractionFailed(_)));
    }

    #[test]
    fn test_truncate_stderr_keeps_tail() {
        let long = format!("{}actual error here", "x".repeat(600));
        let truncated = truncate_stderr(&long);
        assert!(truncated.starts_with("..."));
        assert!(truncated.ends_with("actual error here"));
        assert!(truncated.len() <= 503);
    }
}
