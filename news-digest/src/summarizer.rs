use crate::retry::{retry_with_backoff, Attempt, RetryError, RetryPolicy};
use crate::types::{DigestError, WARNING_MARKER};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const MISSING_API_KEY: &str = "⚠️ Summarization API key is not configured";
pub const CONTENT_TOO_SHORT: &str = "⚠️ Content too short to summarize";
pub const SERVICE_UNREACHABLE: &str = "⚠️ Summarization service unreachable";
pub const INVALID_RESPONSE: &str = "⚠️ Invalid response from summarization service";
pub const EMPTY_COMPLETION: &str = "⚠️ Summarization service returned an empty summary";

/// Placeholder for a non-2xx answer from the service.
pub fn service_error(status: u16) -> String {
    format!("{} Summarization service error: HTTP {}", WARNING_MARKER, status)
}

/// True if `summary` is one of the failure placeholders rather than a synopsis.
pub fn is_placeholder(summary: &str) -> bool {
    summary.starts_with(WARNING_MARKER)
}

/// Turns article text into a short synopsis. Implementations never fail:
/// every problem is reported as a placeholder string.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn adapter_name(&self) -> String;

    async fn summarize(&self, text: &str, title: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    /// Language the synopsis is written in.
    pub language: String,
    /// Subject areas the analyst persona pays attention to.
    pub focus: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_input_chars: usize,
    pub min_input_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            language: "Vietnamese".to_string(),
            focus: "fire prevention and firefighting (PCCC), LNG energy, and MRT urban rail in Vietnam".to_string(),
            temperature: 0.3,
            top_p: 0.9,
            max_tokens: 200,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_input_chars: 2000,
            min_input_chars: 50,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Summarizer backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatSummarizer {
    client: Client,
    config: SummarizerConfig,
}

impl ChatSummarizer {
    pub fn new(config: SummarizerConfig) -> crate::types::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn build_request(&self, text: &str, title: &str) -> ChatRequest<'_> {
        let excerpt = truncate_at_sentence(text, self.config.max_input_chars);

        let system = format!(
            "You are a news analyst specializing in {}. Summarize news briefly and accurately in {}.",
            self.config.focus, self.config.language
        );
        let user = format!(
            "Summarize this news item in 2-3 sentences, focusing on the most important information:\n\nTitle: {}\n\nContent: {}",
            title, excerpt
        );

        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
        }
    }

    async fn request_completion(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<String, RetryError<DigestError>> {
        let policy = RetryPolicy::exponential(self.config.max_attempts, self.config.base_delay);

        retry_with_backoff(&policy, "summarization request", |_| async move {
            let response = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(api_key)
                .json(request)
                .send()
                .await
                .map_err(classify)?;

            let status = response.status();
            if !status.is_success() {
                return Err(Attempt::Permanent(DigestError::Status {
                    status: status.as_u16(),
                    url: self.config.endpoint.clone(),
                }));
            }

            response.text().await.map_err(classify)
        })
        .await
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    fn adapter_name(&self) -> String {
        format!("Chat completions ({})", self.config.model)
    }

    async fn summarize(&self, text: &str, title: &str) -> String {
        let Some(api_key) = self.config.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
            return MISSING_API_KEY.to_string();
        };

        if text.trim().chars().count() < self.config.min_input_chars {
            return CONTENT_TOO_SHORT.to_string();
        }

        let request = self.build_request(text, title);
        debug!("Requesting summary for '{}'", title);

        let body = match self.request_completion(api_key, &request).await {
            Ok(body) => body,
            Err(RetryError::Permanent {
                error: DigestError::Status { status, .. },
                ..
            }) => {
                warn!("Summarization service answered HTTP {} for '{}'", status, title);
                return service_error(status);
            }
            Err(e) => {
                warn!("Summarization failed for '{}': {}", title, e);
                return SERVICE_UNREACHABLE.to_string();
            }
        };

        match extract_completion(&body) {
            Some(summary) if !summary.is_empty() => {
                info!("Summarized '{}' ({} characters)", title, summary.chars().count());
                summary
            }
            Some(_) => EMPTY_COMPLETION.to_string(),
            None => {
                warn!("Unexpected summarization response shape for '{}'", title);
                INVALID_RESPONSE.to_string()
            }
        }
    }
}

/// Trimmed text of `choices[0].message.content`, if the response has it.
fn extract_completion(body: &str) -> Option<String> {
    let response: ChatResponse = serde_json::from_str(body).ok()?;
    let content = response.choices.into_iter().next()?.message?.content?;
    Some(content.trim().to_string())
}

/// Cut `text` to at most `max_chars` characters, ending on a sentence
/// terminator when one exists inside the limit. Without one the text is cut
/// at exactly `max_chars`.
pub fn truncate_at_sentence(text: &str, max_chars: usize) -> String {
    let hard_cut = match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => return text.to_string(),
    };

    match hard_cut.rfind(['.', '!', '?']) {
        Some(end) => hard_cut[..=end].to_string(),
        None => hard_cut.to_string(),
    }
}

fn classify(error: reqwest::Error) -> Attempt<DigestError> {
    if error.is_builder() {
        Attempt::Permanent(DigestError::Http(error))
    } else {
        Attempt::Transient(DigestError::Http(error))
    }
}
