use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use crate::captions::{CaptionProvider, YtDlpCaptionSource};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractors::{self, MediaDownloader, TranscriptSource, YtDlpDownloader};
use crate::media::{FfmpegToolkit, MediaToolkit, ThumbnailArtifact, ThumbnailExtractor};
use crate::transcribe::{self, SpeechTranscriber, TranscribeOptions};

/// One inbound request: exactly one of an uploaded file or a platform URL.
#[derive(Debug, Clone)]
pub enum PipelineRequest {
    /// A media file already on local disk, with its original filename
    Upload { path: PathBuf, filename: String },

    /// A platform video URL (or bare video id)
    Url(String),
}

/// Transcript with provenance and duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Plain transcript text; never empty on success
    pub text: String,

    /// Which source produced the text
    pub source: TranscriptSource,

    /// Media duration in seconds, normalized to be non-negative
    pub duration_seconds: f64,
}

/// Everything the pipeline produces for one request
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub transcript: TranscriptResult,
    pub thumbnail: Option<ThumbnailArtifact>,
    pub duration_seconds: f64,
}

/// The transcript-acquisition pipeline.
///
/// URL inputs walk a layered fallback: platform captions first, then
/// download + audio extraction + speech recognition. Uploaded files go
/// straight to extraction and recognition, with a best-effort thumbnail for
/// video uploads. Each invocation owns a scoped temp directory released on
/// every exit path.
pub struct TranscriptPipeline {
    config: Config,
    media: Box<dyn MediaToolkit>,
    captions: Box<dyn CaptionProvider>,
    downloader: Box<dyn MediaDownloader>,
    transcriber: Box<dyn SpeechTranscriber>,
    thumbnailer: ThumbnailExtractor,
    thumbnails_enabled: bool,
}

impl TranscriptPipeline {
    /// Create a pipeline with the default tool-backed collaborators.
    pub fn new(config: Config) -> Self {
        let timeout = config.tool_timeout();
        let media = Box::new(FfmpegToolkit::new(timeout));
        let captions = Box::new(YtDlpCaptionSource::new(
            &config.transcription.language,
            &config.transcription.secondary_language,
            timeout,
        ));
        let downloader = Box::new(YtDlpDownloader::new(timeout));
        let transcriber = transcribe::create_transcriber(&config.transcription, timeout);
        let thumbnailer = ThumbnailExtractor::new(config.thumbnail_budget_bytes());

        Self {
            config,
            media,
            captions,
            downloader,
            transcriber,
            thumbnailer,
            thumbnails_enabled: true,
        }
    }

    /// Skip thumbnail capture even for video uploads.
    pub fn disable_thumbnails(&mut self) {
        self.thumbnails_enabled = false;
    }

    /// Create a pipeline with injected collaborators.
    pub fn with_collaborators(
        config: Config,
        media: Box<dyn MediaToolkit>,
        captions: Box<dyn CaptionProvider>,
        downloader: Box<dyn MediaDownloader>,
        transcriber: Box<dyn SpeechTranscriber>,
    ) -> Self {
        let thumbnailer = ThumbnailExtractor::new(config.thumbnail_budget_bytes());
        Self {
            config,
            media,
            captions,
            downloader,
            transcriber,
            thumbnailer,
            thumbnails_enabled: true,
        }
    }

    /// Run the pipeline for one request.
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineOutput> {
        // The invocation owns its temp dir; dropping it on any exit path
        // removes every intermediate file.
        let temp_dir = self.create_temp_dir()?;

        match request {
            PipelineRequest::Upload { path, filename } => {
                self.run_upload(&path, &filename, &temp_dir).await
            }
            PipelineRequest::Url(url) => self.run_url(&url, &temp_dir).await,
        }
    }

    fn create_temp_dir(&self) -> Result<TempDir> {
        let temp_dir = match &self.config.app.temp_dir {
            Some(base) => {
                fs_err::create_dir_all(base)?;
                TempDir::new_in(base)?
            }
            None => TempDir::new()?,
        };
        Ok(temp_dir)
    }

    fn transcribe_options(&self) -> TranscribeOptions {
        TranscribeOptions {
            language: self.config.transcription.language.clone(),
            vad_filter: self.config.transcription.vad_filter,
        }
    }

    async fn run_upload(
        &self,
        path: &Path,
        filename: &str,
        temp_dir: &TempDir,
    ) -> Result<PipelineOutput> {
        // Format and size checks run before any transcoder process starts.
        let (kind, size) =
            extractors::validate_upload(path, filename, self.config.max_upload_bytes())?;
        tracing::info!(
            "Processing upload {} ({} bytes, video: {})",
            filename,
            size,
            kind.is_video()
        );

        // Persist into the invocation-scoped directory under a unique name
        // so concurrent executions cannot collide.
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let media_path = temp_dir
            .path()
            .join(format!("upload_{}.{}", &Uuid::new_v4().to_string()[..8], extension));
        fs_err::copy(path, &media_path)?;

        // Thumbnail is fire-and-forget: a failure only costs the optional
        // response field.
        let thumbnail = if kind.is_video() && self.thumbnails_enabled {
            match self
                .thumbnailer
                .extract(
                    self.media.as_ref(),
                    &media_path,
                    self.config.thumbnail.capture_at_secs,
                )
                .await
            {
                Ok(artifact) => artifact,
                Err(e) => {
                    tracing::warn!("Thumbnail extraction failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let audio_path = temp_dir.path().join(format!("audio_{}.wav", Uuid::new_v4()));
        self.media.extract_audio(&media_path, &audio_path).await?;

        let spinner = stage_spinner("Transcribing audio...");
        let output = self
            .transcriber
            .transcribe(&audio_path, &self.transcribe_options())
            .await;
        spinner.finish_and_clear();
        let output = output?;

        if output.text.is_empty() {
            return Err(Error::TranscriptionServiceError(
                "transcription produced no text".to_string(),
            ));
        }

        // Prefer the recognizer-reported duration; probe the media file when
        // it is missing or implausibly small. A failed probe becomes 0.
        let duration_seconds = match output.duration {
            Some(d) if d.is_finite() && d > 0.1 => d,
            _ => self.media.probe_duration(&media_path).await,
        };
        let duration_seconds = normalize_duration(duration_seconds);

        Ok(PipelineOutput {
            transcript: TranscriptResult {
                text: output.text,
                source: self.transcriber.source(),
                duration_seconds,
            },
            thumbnail,
            duration_seconds,
        })
    }

    async fn run_url(&self, url: &str, temp_dir: &TempDir) -> Result<PipelineOutput> {
        let video_id = extractors::video_id(url).ok_or_else(|| {
            if extractors::youtube::is_platform_url(url) {
                Error::InvalidInput(format!("could not resolve a video id from: {}", url))
            } else {
                Error::InvalidInput(format!(
                    "not a recognized platform URL or video id: {}",
                    url
                ))
            }
        })?;
        tracing::info!("Processing URL input, video id {}", video_id);

        // Caption lookup is a soft stage: absence and fetch errors both
        // fall through to speech recognition.
        if let Some(text) = self.captions.fetch(&video_id).await {
            return Ok(PipelineOutput {
                transcript: TranscriptResult {
                    text,
                    source: TranscriptSource::PlatformCaption,
                    duration_seconds: 0.0,
                },
                thumbnail: None,
                duration_seconds: 0.0,
            });
        }

        let spinner = stage_spinner("Downloading media...");
        let downloaded = self
            .downloader
            .download_audio(&video_id, temp_dir.path())
            .await;
        spinner.finish_and_clear();
        let downloaded = downloaded?;

        let audio_path = temp_dir.path().join(format!("audio_{}.wav", Uuid::new_v4()));
        self.media
            .extract_audio(&downloaded.audio_path, &audio_path)
            .await?;

        let spinner = stage_spinner("Transcribing audio...");
        let output = self
            .transcriber
            .transcribe(&audio_path, &self.transcribe_options())
            .await;
        spinner.finish_and_clear();
        let output = output?;

        if output.text.is_empty() {
            return Err(Error::TranscriptionServiceError(
                "transcription produced no text".to_string(),
            ));
        }

        let duration_seconds = normalize_duration(downloaded.duration_seconds);

        Ok(PipelineOutput {
            transcript: TranscriptResult {
                text: output.text,
                source: self.transcriber.source(),
                duration_seconds,
            },
            thumbnail: None,
            duration_seconds,
        })
    }
}

fn normalize_duration(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

fn stage_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::MockCaptionProvider;
    use crate::extractors::youtube::MockMediaDownloader;
    use crate::extractors::DownloadedMedia;
    use crate::media::MockMediaToolkit;
    use crate::transcribe::{MockSpeechTranscriber, TranscriberOutput};
    use std::io::Write;

    const VIDEO_ID: &str = "dQw4w9WgXcQ";

    fn pipeline_with(
        media: MockMediaToolkit,
        captions: MockCaptionProvider,
        downloader: MockMediaDownloader,
        transcriber: MockSpeechTranscriber,
    ) -> TranscriptPipeline {
        TranscriptPipeline::with_collaborators(
            Config::default(),
            Box::new(media),
            Box::new(captions),
            Box::new(downloader),
            Box::new(transcriber),
        )
    }

    fn upload_file(extension: &str, bytes: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", extension))
            .tempfile()
            .unwrap();
        file.write_all(&vec![0u8; bytes]).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_url_uses_caption_without_download_or_transcription() {
        let media = MockMediaToolkit::new();
        let downloader = MockMediaDownloader::new();
        let transcriber = MockSpeechTranscriber::new();

        let mut captions = MockCaptionProvider::new();
        captions
            .expect_fetch()
            .withf(|id| id == VIDEO_ID)
            .times(1)
            .returning(|_| Some("정리된 자막 텍스트".to_string()));

        // Unconfigured mocks panic when called: a download or transcription
        // attempt after a caption hit fails this test.
        let pipeline = pipeline_with(media, captions, downloader, transcriber);
        let output = pipeline
            .run(PipelineRequest::Url(format!("https://youtu.be/{}", VIDEO_ID)))
            .await
            .unwrap();

        assert_eq!(output.transcript.source, TranscriptSource::PlatformCaption);
        assert_eq!(output.transcript.text, "정리된 자막 텍스트");
        assert_eq!(output.duration_seconds, 0.0);
        assert!(output.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_url_falls_through_to_speech_recognition() {
        let mut captions = MockCaptionProvider::new();
        captions.expect_fetch().times(1).returning(|_| None);

        let mut downloader = MockMediaDownloader::new();
        downloader
            .expect_download_audio()
            .times(1)
            .returning(|_, dest| {
                Ok(DownloadedMedia {
                    audio_path: dest.join("download.mp3"),
                    duration_seconds: 95.0,
                    title: Some("Lecture".to_string()),
                })
            });

        let mut media = MockMediaToolkit::new();
        media.expect_extract_audio().times(1).returning(|_, _| Ok(()));

        let mut transcriber = MockSpeechTranscriber::new();
        transcriber.expect_transcribe().times(1).returning(|_, _| {
            Ok(TranscriberOutput {
                text: "recognized speech".to_string(),
                duration: Some(94.8),
            })
        });
        transcriber
            .expect_source()
            .returning(|| TranscriptSource::LocalModel);

        let pipeline = pipeline_with(media, captions, downloader, transcriber);
        let output = pipeline
            .run(PipelineRequest::Url(format!(
                "https://www.youtube.com/watch?v={}",
                VIDEO_ID
            )))
            .await
            .unwrap();

        assert_eq!(output.transcript.source, TranscriptSource::LocalModel);
        assert_eq!(output.transcript.text, "recognized speech");
        // Platform metadata wins over the recognizer-reported duration
        assert_eq!(output.duration_seconds, 95.0);
    }

    #[tokio::test]
    async fn test_url_invalid_input() {
        let pipeline = pipeline_with(
            MockMediaToolkit::new(),
            MockCaptionProvider::new(),
            MockMediaDownloader::new(),
            MockSpeechTranscriber::new(),
        );

        let err = pipeline
            .run(PipelineRequest::Url("https://vimeo.com/12345".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_url_platform_page_without_video_id() {
        let pipeline = pipeline_with(
            MockMediaToolkit::new(),
            MockCaptionProvider::new(),
            MockMediaDownloader::new(),
            MockSpeechTranscriber::new(),
        );

        let err = pipeline
            .run(PipelineRequest::Url(
                "https://www.youtube.com/watch".to_string(),
            ))
            .await
            .unwrap_err();

        match err {
            Error::InvalidInput(msg) => assert!(msg.contains("could not resolve")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_no_audio_skips_transcription() {
        let mut media = MockMediaToolkit::new();
        media.expect_capture_frame().returning(|_, _| Ok(Vec::new()));
        media
            .expect_extract_audio()
            .times(1)
            .returning(|_, _| Err(Error::NoAudioTrack));

        // No transcribe expectation: a call panics the test
        let transcriber = MockSpeechTranscriber::new();

        let file = upload_file("mp4", 64);
        let pipeline = pipeline_with(
            media,
            MockCaptionProvider::new(),
            MockMediaDownloader::new(),
            transcriber,
        );

        let err = pipeline
            .run(PipelineRequest::Upload {
                path: file.path().to_path_buf(),
                filename: "silent.mp4".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoAudioTrack));
    }

    #[tokio::test]
    async fn test_upload_too_large_fails_before_any_processing() {
        let mut config = Config::default();
        config.limits.max_upload_mb = 1;

        let file = upload_file("mp4", 2 * 1024 * 1024);

        // Every collaborator is unconfigured: any tool invocation panics,
        // proving the size check runs first.
        let pipeline = TranscriptPipeline::with_collaborators(
            config,
            Box::new(MockMediaToolkit::new()),
            Box::new(MockCaptionProvider::new()),
            Box::new(MockMediaDownloader::new()),
            Box::new(MockSpeechTranscriber::new()),
        );

        let err = pipeline
            .run(PipelineRequest::Upload {
                path: file.path().to_path_buf(),
                filename: "lecture.mp4".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_upload_unsupported_format() {
        let file = upload_file("txt", 16);
        let pipeline = pipeline_with(
            MockMediaToolkit::new(),
            MockCaptionProvider::new(),
            MockMediaDownloader::new(),
            MockSpeechTranscriber::new(),
        );

        let err = pipeline
            .run(PipelineRequest::Upload {
                path: file.path().to_path_buf(),
                filename: "notes.txt".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_upload_duration_falls_back_to_probe() {
        let mut media = MockMediaToolkit::new();
        media.expect_capture_frame().returning(|_, _| Ok(Vec::new()));
        media.expect_extract_audio().returning(|_, _| Ok(()));
        media.expect_probe_duration().times(1).returning(|_| 30.0);

        let mut transcriber = MockSpeechTranscriber::new();
        transcriber.expect_transcribe().returning(|_, _| {
            Ok(TranscriberOutput {
                text: "강의 내용".to_string(),
                duration: Some(0.05), // below the plausibility threshold
            })
        });
        transcriber
            .expect_source()
            .returning(|| TranscriptSource::LocalModel);

        let file = upload_file("mp4", 64);
        let pipeline = pipeline_with(
            media,
            MockCaptionProvider::new(),
            MockMediaDownloader::new(),
            transcriber,
        );

        let output = pipeline
            .run(PipelineRequest::Upload {
                path: file.path().to_path_buf(),
                filename: "lecture.mp4".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(output.duration_seconds, 30.0);
        assert_eq!(output.transcript.duration_seconds, 30.0);
    }

    #[tokio::test]
    async fn test_upload_audio_file_skips_thumbnail() {
        let mut media = MockMediaToolkit::new();
        // No capture_frame expectation: audio uploads must not attempt one
        media.expect_extract_audio().returning(|_, _| Ok(()));

        let mut transcriber = MockSpeechTranscriber::new();
        transcriber.expect_transcribe().returning(|_, _| {
            Ok(TranscriberOutput {
                text: "text".to_string(),
                duration: Some(12.0),
            })
        });
        transcriber
            .expect_source()
            .returning(|| TranscriptSource::LocalModel);

        let file = upload_file("mp3", 64);
        let pipeline = pipeline_with(
            media,
            MockCaptionProvider::new(),
            MockMediaDownloader::new(),
            transcriber,
        );

        let output = pipeline
            .run(PipelineRequest::Upload {
                path: file.path().to_path_buf(),
                filename: "talk.mp3".to_string(),
            })
            .await
            .unwrap();

        assert!(output.thumbnail.is_none());
        assert_eq!(output.duration_seconds, 12.0);
    }

    #[tokio::test]
    async fn test_empty_transcript_is_a_failure() {
        let mut media = MockMediaToolkit::new();
        media.expect_extract_audio().returning(|_, _| Ok(()));

        let mut transcriber = MockSpeechTranscriber::new();
        transcriber.expect_transcribe().returning(|_, _| {
            Ok(TranscriberOutput {
                text: String::new(),
                duration: Some(10.0),
            })
        });

        let file = upload_file("mp3", 64);
        let pipeline = pipeline_with(
            media,
            MockCaptionProvider::new(),
            MockMediaDownloader::new(),
            transcriber,
        );

        let err = pipeline
            .run(PipelineRequest::Upload {
                path: file.path().to_path_buf(),
                filename: "talk.mp3".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TranscriptionServiceError(_)));
    }
}
