use serde::{Deserialize, Serialize};
use std::future::Future;

/// Marker every user-visible failure placeholder starts with.
pub const WARNING_MARKER: &str = "⚠️";

/// One summarized article, as it appears in the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResult {
    pub title: String,
    pub link: String,
    /// Synopsis, or a placeholder starting with [`WARNING_MARKER`].
    pub summary: String,
    pub published: String,
    /// Characters of text that were handed to the summarizer.
    pub content_length: usize,
}

impl ArticleResult {
    pub fn has_placeholder_summary(&self) -> bool {
        self.summary.starts_with(WARNING_MARKER)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicArticles {
    pub topic: String,
    pub articles: Vec<ArticleResult>,
}

/// Topic name -> articles, kept in the order topics were collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicResults {
    topics: Vec<TopicArticles>,
}

impl TopicResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a topic with an empty list. Existing topics are left alone.
    pub fn ensure_topic(&mut self, topic: &str) {
        if self.position(topic).is_none() {
            self.topics.push(TopicArticles {
                topic: topic.to_string(),
                articles: Vec::new(),
            });
        }
    }

    /// Append articles to a topic, creating it if needed.
    pub fn extend_topic(&mut self, topic: &str, articles: Vec<ArticleResult>) {
        self.ensure_topic(topic);
        if let Some(index) = self.position(topic) {
            self.topics[index].articles.extend(articles);
        }
    }

    pub fn articles(&self, topic: &str) -> Option<&[ArticleResult]> {
        self.position(topic).map(|index| self.topics[index].articles.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicArticles> {
        self.topics.iter()
    }

    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.topic.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    fn position(&self, topic: &str) -> Option<usize> {
        self.topics.iter().position(|t| t.topic == topic)
    }
}

/// Everything a run collected. Read-only once collection has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    pub topics: TopicResults,
}

impl CollectionReport {
    pub fn new(topics: TopicResults) -> Self {
        Self { topics }
    }

    /// Sum of every topic's article count.
    pub fn total(&self) -> usize {
        self.topics.iter().map(|t| t.articles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// A sink consumes a finished report exactly once (email, stdout, ...).
// Implementations report failures but must not assume they can retry the
// collection: the report is all there is.
pub trait ReportSink {
    fn deliver(&self, report: &CollectionReport) -> impl Future<Output = anyhow::Result<()>> + Send;
}
