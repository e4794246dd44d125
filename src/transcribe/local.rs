use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::{SpeechTranscriber, TranscribeOptions, TranscriberOutput};
use crate::error::{Error, Result};
use crate::extractors::TranscriptSource;
use crate::media::run_tool;

/// JSON output of the whisper command-line tool
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    #[allow(dead_code)]
    start: f64,
    end: f64,
    text: String,
}

/// Embedded-model transcriber driving the local whisper CLI.
///
/// Requires no credential; the model runs on this machine.
pub struct LocalWhisperTranscriber {
    whisper_path: String,
    model: String,
    timeout: Duration,
}

impl LocalWhisperTranscriber {
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            whisper_path: "whisper".to_string(),
            model: model.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl SpeechTranscriber for LocalWhisperTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<TranscriberOutput> {
        tracing::info!(
            "Transcribing {} with local whisper model '{}'",
            audio_path.display(),
            self.model
        );

        let output_dir = tempfile::tempdir()?;

        let mut cmd = Command::new(&self.whisper_path);
        cmd.arg(audio_path)
            .args(["--model", &self.model])
            .args(["--language", &options.language])
            .args(["--output_format", "json"])
            .arg("--output_dir")
            .arg(output_dir.path());

        if options.vad_filter {
            cmd.args(["--vad_filter", "True"]);
        }

        let output = run_tool(&mut cmd, self.timeout, "whisper").await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::TranscriptionServiceError(format!(
                "whisper failed: {}",
                stderr.trim()
            )));
        }

        let stem = audio_path
            .file_stem()
            .ok_or_else(|| Error::TranscriptionServiceError("invalid audio filename".to_string()))?;
        let json_path = output_dir
            .path()
            .join(format!("{}.json", stem.to_string_lossy()));

        let json_content = fs_err::read_to_string(&json_path).map_err(|e| {
            Error::TranscriptionServiceError(format!("whisper output not readable: {}", e))
        })?;

        let parsed: WhisperOutput = serde_json::from_str(&json_content).map_err(|e| {
            Error::TranscriptionServiceError(format!("whisper JSON parse failed: {}", e))
        })?;

        Ok(assemble_output(parsed))
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::LocalModel
    }
}

/// Join per-segment text, trimming each segment; the whisper top-level text
/// field is only a fallback for segment-less outputs.
fn assemble_output(parsed: WhisperOutput) -> TranscriberOutput {
    let duration = parsed.segments.last().map(|s| s.end);

    let text = if parsed.segments.is_empty() {
        parsed.text.trim().to_string()
    } else {
        parsed
            .segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    TranscriberOutput { text, duration }
}
