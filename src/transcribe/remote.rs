use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;

use super::{SpeechTranscriber, TranscribeOptions, TranscriberOutput};
use crate::error::{Error, Result};
use crate::extractors::TranscriptSource;

const TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

#[derive(Debug, Deserialize)]
struct ApiTranscription {
    text: String,
    duration: Option<f64>,
}

/// Remote-API transcriber. Requires a credential; the check happens before
/// any network traffic so a misconfigured deployment fails fast.
pub struct RemoteApiTranscriber {
    client: reqwest::Client,
    model: String,
    api_key_env: String,
}

impl RemoteApiTranscriber {
    pub fn new(model: &str, api_key_env: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.to_string(),
            api_key_env: api_key_env.to_string(),
        }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::MissingCredential(self.api_key_env.clone()))
    }
}

#[async_trait]
impl SpeechTranscriber for RemoteApiTranscriber {
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<TranscriberOutput> {
        let api_key = self.api_key()?;

        tracing::info!(
            "Transcribing {} via remote API model '{}'",
            audio_path.display(),
            self.model
        );

        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| Error::Internal(format!("invalid mime type: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", options.language.clone())
            .text("response_format", "verbose_json")
            .part("file", part);

        let response = self
            .client
            .post(TRANSCRIPTION_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TranscriptionServiceError(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: ApiTranscription = response.json().await.map_err(|e| {
            Error::TranscriptionServiceError(format!("unexpected response shape: {}", e))
        })?;

        Ok(TranscriberOutput {
            text: parsed.text.trim().to_string(),
            duration: parsed.duration,
        })
    }

    fn source(&self) -> TranscriptSource {
        TranscriptSource::RemoteApi
    }
}
