use serde::{Deserialize, Serialize};

use crate::config::SummarizerConfig;
use crate::error::{Error, Result};

/// Transcripts are clipped to this many characters before prompting
const PROMPT_CLIP_CHARS: usize = 12_000;

const SYSTEM_PROMPT: &str = "아래의 원문 텍스트를 참고하여 \
1줄 분량의 강의 제목(제목:)과 3줄 이내의 핵심 요약(요약:)을 한국어로 작성해 주세요.\n\
예시 형식:\n제목: [짧은 제목]\n요약: [3줄 이내 핵심 요약]\n\
절대 새로운 내용을 추가하지 말고, 원문 내용만 요약하세요.";

const PLACEHOLDER_TITLE_NO_KEY: &str = "요약 제목 없음";
const PLACEHOLDER_SUMMARY_NO_KEY: &str = "OpenAI API 키를 설정해주세요.";
const PLACEHOLDER_TITLE_ERROR: &str = "요약 생성 오류";
const FALLBACK_TITLE_UNPARSED: &str = "자동 생성 제목";

/// AI-generated title and summary for a transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completion summarizer.
///
/// Summarization never fails the request: a missing credential or a
/// provider error degrades to a placeholder title/summary pair while the
/// transcript itself is still returned to the caller.
pub struct Summarizer {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Generate a title and summary for the transcript.
    pub async fn summarize(&self, transcript: &str) -> SummaryResult {
        let api_key = match std::env::var(&self.config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => {
                tracing::warn!(
                    "{} is not set, returning placeholder summary",
                    self.config.api_key_env
                );
                return SummaryResult {
                    title: PLACEHOLDER_TITLE_NO_KEY.to_string(),
                    summary: PLACEHOLDER_SUMMARY_NO_KEY.to_string(),
                };
            }
        };

        match self.request_completion(&api_key, transcript).await {
            Ok(generated) => parse_generated(&generated),
            Err(e) => {
                tracing::error!("Summary generation failed: {}", e);
                SummaryResult {
                    title: PLACEHOLDER_TITLE_ERROR.to_string(),
                    summary: format!("오류 내용: {}", e),
                }
            }
        }
    }

    async fn request_completion(&self, api_key: &str, transcript: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: clip_chars(transcript, PROMPT_CLIP_CHARS),
                },
            ],
            temperature: 0.5,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SummarizationFailure(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            Error::SummarizationFailure(format!("unexpected response shape: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::SummarizationFailure("empty completion".to_string()))
    }
}

/// Split the completion on the 제목:/요약: markers. Completions that ignore
/// the format still yield usable output: the whole text becomes the summary
/// under a generic title.
fn parse_generated(generated: &str) -> SummaryResult {
    if let (Some(title_pos), Some(summary_pos)) =
        (generated.find("제목:"), generated.find("요약:"))
    {
        if title_pos < summary_pos {
            let title = generated[title_pos + "제목:".len()..summary_pos]
                .trim()
                .to_string();
            let summary = generated[summary_pos + "요약:".len()..].trim().to_string();
            if !title.is_empty() && !summary.is_empty() {
                return SummaryResult { title, summary };
            }
        }
    }

    SummaryResult {
        title: FALLBACK_TITLE_UNPARSED.to_string(),
        summary: generated.trim().to_string(),
    }
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
fn clip_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
