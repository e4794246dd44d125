use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::TranscriptionBackend;

#[derive(Parser)]
#[command(name = "lecsum")]
#[command(about = "AI lecture summarizer: transcribe uploaded media or platform videos and generate a title and summary")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe and summarize a media file or platform video URL
    Summarize {
        /// Path to a media file, a platform video URL, or a bare video id
        input: String,

        /// Write the response to a file instead of stdout; a directory gets
        /// a filename derived from the generated title
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Language hint for captions and transcription (overrides config)
        #[arg(short, long)]
        language: Option<String>,

        /// Transcription backend (overrides config)
        #[arg(short, long)]
        backend: Option<BackendArg>,

        /// Skip thumbnail capture for video uploads
        #[arg(long)]
        no_thumbnail: bool,
    },

    /// Show or initialize configuration
    Config {
        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },

    /// Check availability of required external tools
    Deps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON response document
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Embedded whisper model on this machine
    Local,
    /// Remote speech-to-text API
    Remote,
}

impl From<BackendArg> for TranscriptionBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Local => TranscriptionBackend::Local,
            BackendArg::Remote => TranscriptionBackend::Remote,
        }
    }
}
