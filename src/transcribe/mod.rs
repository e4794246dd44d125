use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::config::{TranscriptionBackend, TranscriptionConfig};
use crate::error::Result;
use crate::extractors::TranscriptSource;

pub mod local;
pub mod remote;

pub use local::LocalWhisperTranscriber;
pub use remote::RemoteApiTranscriber;

/// Options forwarded to the speech recognizer
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Language hint for the recognizer
    pub language: String,

    /// Enable the voice-activity-detection filter (embedded backend only)
    pub vad_filter: bool,
}

/// Raw transcription output before pipeline post-processing
#[derive(Debug, Clone)]
pub struct TranscriberOutput {
    /// Transcribed text
    pub text: String,

    /// Recognizer-reported audio duration in seconds, when available
    pub duration: Option<f64>,
}

/// Speech-to-text capability. Two interchangeable implementations exist:
/// an embedded model invoked locally and a remote API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Transcribe a normalized audio file to text.
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: &TranscribeOptions,
    ) -> Result<TranscriberOutput>;

    /// Which transcript source this implementation represents.
    fn source(&self) -> TranscriptSource;
}

/// Create the transcriber selected by configuration.
pub fn create_transcriber(
    config: &TranscriptionConfig,
    timeout: Duration,
) -> Box<dyn SpeechTranscriber> {
    match config.backend {
        TranscriptionBackend::Local => {
            Box::new(LocalWhisperTranscriber::new(&config.model, timeout))
        }
        TranscriptionBackend::Remote => Box::new(RemoteApiTranscriber::new(
            &config.model,
            &config.api_key_env,
        )),
    }
}
