use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use interfaces::defs::{ArticleResult, CollectionReport, TopicResults, WARNING_MARKER};

/// A single entry read from a parsed feed. Never mutated after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: Option<String>,
    pub published: Option<String>,
    pub description: FeedField,
    pub summary: FeedField,
    pub content: FeedField,
}

/// The shapes a feed's native text fields come in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedField {
    #[default]
    Absent,
    PlainText(String),
    StructuredList(Vec<StructuredValue>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredValue {
    pub value: String,
    pub content_type: Option<String>,
}

impl FeedField {
    /// Raw text carried by this field. A structured list yields its first
    /// element's payload.
    pub fn resolve(&self) -> Option<&str> {
        let text = match self {
            FeedField::Absent => return None,
            FeedField::PlainText(text) => text.as_str(),
            FeedField::StructuredList(values) => values.first()?.value.as_str(),
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn from_optional(text: Option<String>) -> Self {
        match text {
            Some(text) if !text.trim().is_empty() => FeedField::PlainText(text),
            _ => FeedField::Absent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub max_redirects: usize,
    /// Extracted text must be strictly longer than this to count.
    pub min_content_chars: usize,
    pub max_body_mb: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string(),
            accept_language: "vi-VN,vi;q=0.9,en;q=0.8".to_string(),
            timeout: Duration::from_secs(15),
            max_attempts: 2,
            retry_delay: Duration::from_secs(2),
            max_redirects: 10,
            min_content_chars: 100,
            max_body_mb: 10,
        }
    }
}

/// Fixed sleeps between calls so downstream services are not hammered.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    pub between_entries: Duration,
    pub between_feeds: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            between_entries: Duration::from_secs(1),
            between_feeds: Duration::from_secs(2),
        }
    }
}

impl PacingConfig {
    pub fn none() -> Self {
        Self {
            between_entries: Duration::ZERO,
            between_feeds: Duration::ZERO,
        }
    }
}

/// Per-run counters, logged once collection completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub feeds_attempted: usize,
    pub feeds_with_articles: usize,
    pub articles: usize,
    pub placeholder_summaries: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid CSS selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Missing configuration: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Invalid value for {name}: {reason}")]
    InvalidConfig { name: String, reason: String },

    #[error("Response size exceeds limit: {size_mb}MB")]
    TooLarge { size_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, DigestError>;
