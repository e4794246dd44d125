use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upload and pipeline limits
    pub limits: LimitsConfig,

    /// Transcription settings
    pub transcription: TranscriptionConfig,

    /// Thumbnail settings
    pub thumbnail: ThumbnailConfig,

    /// Summarization settings
    pub summarizer: SummarizerConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted upload size in megabytes
    pub max_upload_mb: u64,

    /// Timeout for external tool invocations (ffmpeg, ffprobe, yt-dlp) in seconds
    pub tool_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionBackend {
    /// Embedded whisper model invoked locally
    Local,
    /// Remote speech-to-text API
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Which transcription backend to use
    pub backend: TranscriptionBackend,

    /// Primary language for captions and transcription
    pub language: String,

    /// Secondary language tried when no primary-language caption exists
    pub secondary_language: String,

    /// Enable the voice-activity-detection filter (local backend only)
    pub vad_filter: bool,

    /// Model name (local: whisper model size, remote: API model id)
    pub model: String,

    /// Environment variable holding the remote API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Target thumbnail size budget in kilobytes
    pub budget_kb: u64,

    /// Timestamp (seconds into the video) of the captured frame
    pub capture_at_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Chat-completions endpoint
    pub endpoint: String,

    /// Model used for title/summary generation
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Temporary directory override (system default if unset)
    pub temp_dir: Option<PathBuf>,

    /// Default output format
    pub default_output_format: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: LimitsConfig {
                max_upload_mb: 500,
                tool_timeout_secs: 600,
            },
            transcription: TranscriptionConfig {
                backend: TranscriptionBackend::Local,
                language: "ko".to_string(),
                secondary_language: "en".to_string(),
                vad_filter: true,
                model: "base".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
            },
            thumbnail: ThumbnailConfig {
                budget_kb: 128,
                capture_at_secs: 1.0,
            },
            summarizer: SummarizerConfig::default(),
            app: AppConfig {
                temp_dir: None,
                default_output_format: "json".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("lecture-summarizer").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.limits.max_upload_mb == 0 {
            anyhow::bail!("limits.max_upload_mb must be greater than zero");
        }

        if self.thumbnail.budget_kb == 0 {
            anyhow::bail!("thumbnail.budget_kb must be greater than zero");
        }

        if self.transcription.language.is_empty() {
            anyhow::bail!("transcription.language must be set");
        }

        Ok(())
    }

    /// Maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.limits.max_upload_mb * 1024 * 1024
    }

    /// Thumbnail budget in bytes
    pub fn thumbnail_budget_bytes(&self) -> u64 {
        self.thumbnail.budget_kb * 1024
    }

    /// Timeout applied to external tool invocations
    pub fn tool_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.limits.tool_timeout_secs)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Max Upload: {} MB", self.limits.max_upload_mb);
        println!("  Tool Timeout: {}s", self.limits.tool_timeout_secs);
        println!(
            "  Transcription: {:?} backend, language {} (secondary {})",
            self.transcription.backend,
            self.transcription.language,
            self.transcription.secondary_language
        );
        println!("  Thumbnail Budget: {} KB", self.thumbnail.budget_kb);
        println!(
            "  Summarizer: {} via {}",
            self.summarizer.model, self.summarizer.endpoint
        );
        println!("  Default Format: {}", self.app.default_output_format);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_upload_bytes(), 500 * 1024 * 1024);
        assert_eq!(config.thumbnail_budget_bytes(), 128 * 1024);
    }

    #[test]
    fn test_backend_serializes_lowercase() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.transcription.backend, TranscriptionBackend::Local);
        assert!(yaml.contains("backend: local"));
    }
}
