use crate::fetcher::Fetcher;
use crate::parser::{fallback_description, parse_feed};
use crate::summarizer::Summarizer;
use crate::types::{ArticleResult, FeedEntry, PacingConfig};
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_ARTICLES: usize = 3;

/// Drives a single feed: parse, then fetch / fall back / summarize each entry.
pub struct FeedProcessor<'a> {
    fetcher: &'a Fetcher,
    summarizer: &'a dyn Summarizer,
    pacing: PacingConfig,
}

impl<'a> FeedProcessor<'a> {
    pub fn new(fetcher: &'a Fetcher, summarizer: &'a dyn Summarizer, pacing: PacingConfig) -> Self {
        Self {
            fetcher,
            summarizer,
            pacing,
        }
    }

    /// Process up to `max_articles` entries of the feed at `feed_url`.
    ///
    /// A feed that cannot be fetched or parsed, or has no entries, yields an
    /// empty list. Entries with no obtainable text are skipped.
    pub async fn process(&self, feed_url: &str, topic: &str, max_articles: usize) -> Vec<ArticleResult> {
        info!("Processing feed [{}]: {}", topic, feed_url);

        match self.fetcher.fetch_feed(feed_url).await {
            Ok(document) => self.process_document(&document, topic, max_articles).await,
            Err(e) => {
                error!("Failed to fetch feed {}: {}", feed_url, e);
                Vec::new()
            }
        }
    }

    /// Same as [`process`](Self::process) for an already downloaded document.
    pub async fn process_document(&self, document: &[u8], topic: &str, max_articles: usize) -> Vec<ArticleResult> {
        let entries = match parse_feed(document) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Skipping malformed feed for topic {}: {}", topic, e);
                return Vec::new();
            }
        };

        if entries.is_empty() {
            warn!("Feed for topic {} has no entries", topic);
            return Vec::new();
        }

        let selected = entries.len().min(max_articles);
        info!("Found {} entries, processing {}", entries.len(), selected);

        let mut articles = Vec::new();
        for (index, entry) in entries.iter().take(selected).enumerate() {
            debug!("[{}/{}] {}", index + 1, selected, entry.title);

            if let Some(article) = self.process_entry(entry).await {
                articles.push(article);

                if index + 1 < selected && !self.pacing.between_entries.is_zero() {
                    tokio::time::sleep(self.pacing.between_entries).await;
                }
            }
        }

        articles
    }

    async fn process_entry(&self, entry: &FeedEntry) -> Option<ArticleResult> {
        let mut content = match entry.link.as_deref() {
            Some(link) if !link.is_empty() => self.fetcher.fetch_article(link).await,
            _ => String::new(),
        };

        if content.is_empty() {
            content = fallback_description(entry);
            debug!("Using feed description ({} characters)", content.chars().count());
        }

        if content.is_empty() {
            warn!("No content for '{}', skipping", entry.title);
            return None;
        }

        let summary = self.summarizer.summarize(&content, &entry.title).await;

        Some(ArticleResult {
            title: entry.title.clone(),
            link: entry.link.clone().unwrap_or_default(),
            summary,
            published: entry.published.clone().unwrap_or_default(),
            content_length: content.chars().count(),
        })
    }
}
