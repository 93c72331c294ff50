use crate::types::{DigestError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// One topic and the feeds that supply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicFeeds {
    pub topic: String,
    pub urls: Vec<String>,
}

/// Ordered topic -> feed URL table. Order here is the order of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedTable {
    topics: Vec<TopicFeeds>,
}

impl FeedTable {
    /// Build a table, rejecting anything that is not an http(s) URL.
    pub fn new(topics: Vec<TopicFeeds>) -> Result<Self> {
        let table = Self { topics };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        for entry in &self.topics {
            if entry.topic.trim().is_empty() {
                return Err(DigestError::General("Feed table contains an empty topic name".to_string()));
            }
            for raw in &entry.urls {
                let url = Url::parse(raw)?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(DigestError::General(format!(
                        "Feed URL for {} must be http(s): {}",
                        entry.topic, raw
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicFeeds> {
        self.topics.iter()
    }

    pub fn topic_names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.topic.as_str()).collect()
    }

    pub fn feed_count(&self) -> usize {
        self.topics.iter().map(|t| t.urls.len()).sum()
    }
}

impl Default for FeedTable {
    fn default() -> Self {
        let topic = |name: &str, urls: &[&str]| TopicFeeds {
            topic: name.to_string(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        };

        Self {
            topics: vec![
                topic(
                    "PCCC",
                    &["https://baochinhphu.vn/rss/thoi-su.rss", "https://cand.com.vn/rss"],
                ),
                topic(
                    "LNG",
                    &[
                        "https://vnexpress.net/rss/kinh-doanh.rss",
                        "https://nangluongquocte.petrotimes.vn/rss",
                    ],
                ),
                topic(
                    "MRT",
                    &["https://tuoitre.vn/rss/thoi-su.rss", "https://vnexpress.net/rss/thoi-su.rss"],
                ),
            ],
        }
    }
}
