//! AI lecture summarization pipeline.
//!
//! Turns an uploaded media file or a platform video URL into a transcript,
//! an AI-generated title and summary, and an optional size-budgeted
//! thumbnail. Transcripts come from a layered fallback: platform captions
//! first, then audio extraction plus speech recognition with an embedded
//! model or a remote API.

pub mod captions;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractors;
pub mod media;
pub mod output;
pub mod pipeline;
pub mod summarize;
pub mod transcribe;
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use output::SummaryResponse;
pub use pipeline::{PipelineOutput, PipelineRequest, TranscriptPipeline, TranscriptResult};
pub use summarize::{SummaryResult, Summarizer};
