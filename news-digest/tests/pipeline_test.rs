mod common;

use axum::extract::Path;
use axum::http::header;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{
    article_page, init_tracing, rss_document, spawn_app, test_fetch_config, test_fetcher, test_summarizer_config,
    EchoSummarizer, RssItem,
};
use news_digest::summarizer::{ChatSummarizer, MISSING_API_KEY};
use news_digest::{DigestCollector, FeedProcessor, FeedTable, PacingConfig, TopicFeeds};
use serde_json::json;
use std::time::Duration;

const CHAT_PATH: &str = "/v1/chat/completions";

fn xml(body: String) -> ([(header::HeaderName, &'static str); 1], String) {
    ([(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")], body)
}

fn linked_items(base: &str, prefix: &str, count: usize) -> Vec<RssItem> {
    (1..=count)
        .map(|n| RssItem {
            title: format!("Story {n}"),
            link: Some(format!("{base}/{prefix}/{n}")),
            description: String::new(),
        })
        .collect()
}

/// Local news site: a healthy feed, a feed whose pages are gone, a feed with
/// no links, a broken feed and a chat completions endpoint.
async fn spawn_news_site() -> String {
    spawn_app(|base| {
        let healthy = rss_document(&linked_items(&base, "articles", 5));
        let dead = rss_document(&linked_items(&base, "missing", 3));
        let unlinked = rss_document(&[
            RssItem {
                title: "Depot drill".to_string(),
                link: None,
                description: "<p>Firefighters ran a <b>night drill</b> at the metro depot.</p>".to_string(),
            },
            RssItem {
                title: "Nothing to say".to_string(),
                link: None,
                description: String::new(),
            },
        ]);

        Router::new()
            .route("/feed.xml", get(move || async move { xml(healthy) }))
            .route("/dead.xml", get(move || async move { xml(dead) }))
            .route("/unlinked.xml", get(move || async move { xml(unlinked) }))
            .route("/broken.xml", get(|| async { "<html><body>Service moved</body></html>" }))
            .route(
                "/articles/:id",
                get(|Path(id): Path<usize>| async move {
                    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], article_page(id))
                }),
            )
            .route(
                CHAT_PATH,
                post(|| async {
                    Json(json!({
                        "choices": [{ "message": { "content": "Two sentence synopsis. Nothing more." } }]
                    }))
                }),
            )
    })
    .await
}

#[tokio::test]
async fn test_healthy_feed_is_fully_summarized() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let summarizer =
        ChatSummarizer::new(test_summarizer_config(&format!("{}{}", base, CHAT_PATH), Some("test-key"))).unwrap();
    let processor = FeedProcessor::new(&fetcher, &summarizer, PacingConfig::none());

    let articles = processor.process(&format!("{}/feed.xml", base), "MRT", 3).await;

    assert_eq!(articles.len(), 3);
    for (i, article) in articles.iter().enumerate() {
        assert_eq!(article.title, format!("Story {}", i + 1));
        assert_eq!(article.link, format!("{}/articles/{}", base, i + 1));
        assert_eq!(article.summary, "Two sentence synopsis. Nothing more.");
        assert!(!article.has_placeholder_summary());
        assert!(article.content_length > 100);
        assert!(!article.published.is_empty());
    }
}

#[tokio::test]
async fn test_unreachable_pages_without_descriptions_yield_nothing() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, PacingConfig::none());

    let articles = processor.process(&format!("{}/dead.xml", base), "PCCC", 3).await;
    assert!(articles.is_empty());
}

#[tokio::test]
async fn test_malformed_feed_yields_nothing() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, PacingConfig::none());

    let articles = processor.process(&format!("{}/broken.xml", base), "LNG", 3).await;
    assert!(articles.is_empty());

    let articles = processor.process_document(b"<rss><channel><item>", "LNG", 3).await;
    assert!(articles.is_empty());
}

#[tokio::test]
async fn test_unreachable_feed_yields_nothing() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, PacingConfig::none());

    let articles = processor.process(&format!("{}/no-such-feed.xml", base), "LNG", 3).await;
    assert!(articles.is_empty());
}

#[tokio::test]
async fn test_missing_api_key_keeps_articles_with_placeholder() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let summarizer = ChatSummarizer::new(test_summarizer_config(&format!("{}{}", base, CHAT_PATH), None)).unwrap();
    let processor = FeedProcessor::new(&fetcher, &summarizer, PacingConfig::none());

    let articles = processor.process(&format!("{}/feed.xml", base), "MRT", 3).await;

    assert_eq!(articles.len(), 3);
    for article in &articles {
        assert_eq!(article.summary, MISSING_API_KEY);
        assert!(article.has_placeholder_summary());
        assert!(article.content_length > 100);
    }
}

#[tokio::test]
async fn test_feed_description_used_without_link() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, PacingConfig::none());

    let articles = processor.process(&format!("{}/unlinked.xml", base), "PCCC", 5).await;

    // The second entry has neither a link nor any text and is dropped
    assert_eq!(articles.len(), 1);
    let expected = "Firefighters ran a night drill at the metro depot.";
    assert_eq!(articles[0].title, "Depot drill");
    assert_eq!(articles[0].link, "");
    assert_eq!(articles[0].content_length, expected.chars().count());
    assert_eq!(articles[0].summary, format!("Depot drill: {} characters", expected.chars().count()));
}

#[tokio::test]
async fn test_max_articles_limits_entries() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, PacingConfig::none());

    let articles = processor.process(&format!("{}/feed.xml", base), "MRT", 2).await;
    assert_eq!(articles.len(), 2);

    let articles = processor.process(&format!("{}/feed.xml", base), "MRT", 10).await;
    assert_eq!(articles.len(), 5);

    let articles = processor.process(&format!("{}/feed.xml", base), "MRT", 0).await;
    assert!(articles.is_empty());
}

#[tokio::test]
async fn test_pacing_between_entries() {
    init_tracing();
    let base = spawn_news_site().await;

    let fetcher = test_fetcher(test_fetch_config());
    let pacing = PacingConfig {
        between_entries: Duration::from_millis(100),
        between_feeds: Duration::ZERO,
    };
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, pacing);

    let started = std::time::Instant::now();
    let articles = processor.process(&format!("{}/feed.xml", base), "MRT", 3).await;

    assert_eq!(articles.len(), 3);
    // Two pauses: none after the last entry
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_collector_keeps_topic_order_and_empty_topics() {
    init_tracing();
    let base = spawn_news_site().await;

    let table = FeedTable::new(vec![
        TopicFeeds {
            topic: "PCCC".to_string(),
            urls: vec![format!("{}/feed.xml", base), format!("{}/unlinked.xml", base)],
        },
        TopicFeeds {
            topic: "LNG".to_string(),
            urls: vec![format!("{}/broken.xml", base), format!("{}/dead.xml", base)],
        },
        TopicFeeds {
            topic: "MRT".to_string(),
            urls: vec![format!("{}/feed.xml", base)],
        },
    ])
    .unwrap();

    let fetcher = test_fetcher(test_fetch_config());
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, PacingConfig::none());
    let collector = DigestCollector::new(processor, 2, Duration::ZERO);

    let (report, stats) = collector.collect_with_stats(&table).await;

    assert_eq!(report.topics.topic_names(), vec!["PCCC", "LNG", "MRT"]);
    assert_eq!(report.topics.articles("PCCC").unwrap().len(), 3);
    assert_eq!(report.topics.articles("LNG").unwrap().len(), 0);
    assert_eq!(report.topics.articles("MRT").unwrap().len(), 2);

    let sum: usize = report.topics.iter().map(|t| t.articles.len()).sum();
    assert_eq!(report.total(), sum);
    assert_eq!(report.total(), 5);

    assert_eq!(stats.feeds_attempted, 5);
    assert_eq!(stats.feeds_with_articles, 3);
    assert_eq!(stats.articles, 5);
    assert_eq!(stats.placeholder_summaries, 0);

    // Articles from the first feed come before those of the second
    let pccc = report.topics.articles("PCCC").unwrap();
    assert_eq!(pccc[0].title, "Story 1");
    assert_eq!(pccc[1].title, "Story 2");
    assert_eq!(pccc[2].title, "Depot drill");
}

#[tokio::test]
async fn test_collector_all_feeds_failing_gives_empty_report() {
    init_tracing();
    let base = spawn_news_site().await;

    let table = FeedTable::new(vec![TopicFeeds {
        topic: "LNG".to_string(),
        urls: vec![format!("{}/broken.xml", base)],
    }])
    .unwrap();

    let fetcher = test_fetcher(test_fetch_config());
    let processor = FeedProcessor::new(&fetcher, &EchoSummarizer, PacingConfig::none());
    let report = DigestCollector::new(processor, 3, Duration::ZERO).collect(&table).await;

    assert!(report.is_empty());
    assert_eq!(report.topics.len(), 1);
}
