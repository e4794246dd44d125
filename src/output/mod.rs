use anyhow::{Context, Result};
use base64::Engine;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::media::ThumbnailArtifact;
use crate::pipeline::PipelineOutput;
use crate::summarize::SummaryResult;

/// The response document produced for one summarization request.
///
/// Field names are camelCase to match the published wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub title: String,
    pub summary: String,
    pub original_text: String,

    /// Media duration in whole seconds
    pub duration: u64,

    /// Original filename for uploads, the URL for link inputs
    pub filename: String,

    /// Local time the response was produced, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,

    /// Base64-encoded thumbnail image, when one was captured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl SummaryResponse {
    /// Assemble the response from pipeline and summarizer output.
    pub fn assemble(source: &str, output: PipelineOutput, summary: SummaryResult) -> Self {
        let thumbnail = output.thumbnail.as_ref().map(encode_thumbnail);

        Self {
            title: summary.title,
            summary: summary.summary,
            original_text: output.transcript.text,
            duration: output.duration_seconds.max(0.0) as u64,
            filename: source.to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            thumbnail,
        }
    }

    /// Render in the requested format.
    pub fn render(&self, format: &crate::cli::OutputFormat) -> Result<String> {
        match format {
            crate::cli::OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize response")
            }
            crate::cli::OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Title: {}\n", self.title));
        out.push_str(&format!("Source: {}\n", self.filename));
        out.push_str(&format!("Duration: {}\n", format_duration(self.duration)));
        out.push_str(&format!("Generated: {}\n", self.timestamp));
        out.push_str("\nSummary:\n");
        out.push_str(&self.summary);
        out.push_str("\n\nTranscript:\n");
        out.push_str(&self.original_text);
        out.push('\n');
        if self.thumbnail.is_some() {
            out.push_str("\n(thumbnail attached in JSON output)\n");
        }
        out
    }
}

fn encode_thumbnail(artifact: &ThumbnailArtifact) -> String {
    base64::engine::general_purpose::STANDARD.encode(&artifact.bytes)
}

/// Format whole seconds as `m:ss`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Write the rendered response to a file.
pub async fn save_to_file(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }

    fs_err::write(path, content)
        .with_context(|| format!("Failed to write output to {}", path.display()))?;

    tracing::info!("Saved output to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::TranscriptSource;
    use crate::pipeline::TranscriptResult;

    fn sample_output(thumbnail: Option<ThumbnailArtifact>) -> PipelineOutput {
        PipelineOutput {
            transcript: TranscriptResult {
                text: "강의 원문".to_string(),
                source: TranscriptSource::LocalModel,
                duration_seconds: 30.4,
            },
            thumbnail,
            duration_seconds: 30.4,
        }
    }

    fn sample_summary() -> SummaryResult {
        SummaryResult {
            title: "제목".to_string(),
            summary: "요약".to_string(),
        }
    }

    #[test]
    fn test_assemble_truncates_duration_to_whole_seconds() {
        let response = SummaryResponse::assemble("lecture.mp4", sample_output(None), sample_summary());
        assert_eq!(response.duration, 30);
        assert_eq!(response.filename, "lecture.mp4");
        assert!(response.thumbnail.is_none());
    }

    #[test]
    fn test_json_uses_camel_case_and_omits_absent_thumbnail() {
        let response = SummaryResponse::assemble("lecture.mp4", sample_output(None), sample_summary());
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"originalText\""));
        assert!(!json.contains("original_text"));
        assert!(!json.contains("thumbnail"));
    }

    #[test]
    fn test_thumbnail_is_base64_encoded() {
        let artifact = ThumbnailArtifact {
            bytes: vec![0xFF, 0xD8, 0xFF],
            size_bytes: 3,
            encoding: "jpeg",
        };
        let response =
            SummaryResponse::assemble("lecture.mp4", sample_output(Some(artifact)), sample_summary());
        assert_eq!(response.thumbnail.as_deref(), Some("/9j/"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(30), "0:30");
        assert_eq!(format_duration(95), "1:35");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn test_timestamp_shape() {
        let response = SummaryResponse::assemble("x.mp4", sample_output(None), sample_summary());
        // YYYY-MM-DD HH:MM:SS
        assert_eq!(response.timestamp.len(), 19);
        assert_eq!(&response.timestamp[4..5], "-");
        assert_eq!(&response.timestamp[10..11], " ");
    }
}
