use serde::{Deserialize, Serialize};

pub mod upload;
pub mod youtube;

pub use upload::{classify_extension, validate_upload, MediaKind};
pub use youtube::{video_id, DownloadedMedia, MediaDownloader, YtDlpDownloader};

/// Where a transcript ultimately came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptSource {
    /// Pre-existing platform caption track
    PlatformCaption,
    /// Embedded speech-recognition model
    LocalModel,
    /// Remote speech-to-text API
    RemoteApi,
}

impl TranscriptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptSource::PlatformCaption => "platform-caption",
            TranscriptSource::LocalModel => "local-model",
            TranscriptSource::RemoteApi => "remote-api",
        }
    }
}
