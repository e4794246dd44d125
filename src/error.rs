use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the summarization pipeline.
///
/// Caption and thumbnail failures never surface here; they are absorbed by
/// their components and only degrade the optional parts of the response.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File size {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("Media file does not contain an audio track")]
    NoAudioTrack,

    #[error("Audio extraction failed: {0}")]
    AudioExtractionFailed(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Transcription service error: {0}")]
    TranscriptionServiceError(String),

    /// Never reaches callers of the pipeline: the summarizer absorbs it into
    /// a placeholder title/summary pair.
    #[error("Summary generation failed: {0}")]
    SummarizationFailure(String),

    #[error("External tool timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was caused by the request itself rather than the
    /// service or its external tools. Callers use this to choose between a
    /// client-style and a server-style failure report.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::UnsupportedFormat(_)
                | Error::PayloadTooLarge { .. }
                | Error::NoAudioTrack
        )
    }
}
