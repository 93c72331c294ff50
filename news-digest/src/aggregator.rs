use crate::feeds::FeedTable;
use crate::processor::FeedProcessor;
use crate::types::{CollectionReport, CollectionStats, TopicResults};
use std::time::Duration;
use tracing::info;

/// Walks the feed table topic by topic and gathers every feed's articles.
pub struct DigestCollector<'a> {
    processor: FeedProcessor<'a>,
    max_articles: usize,
    between_feeds: Duration,
}

impl<'a> DigestCollector<'a> {
    pub fn new(processor: FeedProcessor<'a>, max_articles: usize, between_feeds: Duration) -> Self {
        Self {
            processor,
            max_articles,
            between_feeds,
        }
    }

    pub async fn collect(&self, table: &FeedTable) -> CollectionReport {
        self.collect_with_stats(table).await.0
    }

    /// Collect every topic in table order. A failing feed only loses its own
    /// articles; every topic appears in the report, even with no articles.
    pub async fn collect_with_stats(&self, table: &FeedTable) -> (CollectionReport, CollectionStats) {
        let mut results = TopicResults::new();
        let mut stats = CollectionStats::default();

        info!(
            "Collecting {} feeds across {} topics",
            table.feed_count(),
            table.topic_names().len()
        );

        for topic_feeds in table.iter() {
            let topic = topic_feeds.topic.as_str();
            info!("Topic: {}", topic);
            results.ensure_topic(topic);

            for (index, feed_url) in topic_feeds.urls.iter().enumerate() {
                let articles = self.processor.process(feed_url, topic, self.max_articles).await;

                stats.feeds_attempted += 1;
                if !articles.is_empty() {
                    stats.feeds_with_articles += 1;
                }
                stats.articles += articles.len();
                stats.placeholder_summaries += articles.iter().filter(|a| a.has_placeholder_summary()).count();

                results.extend_topic(topic, articles);

                if index + 1 < topic_feeds.urls.len() && !self.between_feeds.is_zero() {
                    tokio::time::sleep(self.between_feeds).await;
                }
            }

            info!(
                "Topic {} total: {} articles",
                topic,
                results.articles(topic).map_or(0, |a| a.len())
            );
        }

        let report = CollectionReport::new(results);
        info!(
            "Collected {} articles from {}/{} feeds ({} with placeholder summaries)",
            report.total(),
            stats.feeds_with_articles,
            stats.feeds_attempted,
            stats.placeholder_summaries
        );

        (report, stats)
    }
}
