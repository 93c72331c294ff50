#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use news_digest::extractor::{ContentExtractor, ExtractorConfig};
use news_digest::summarizer::{Summarizer, SummarizerConfig};
use news_digest::{FetchConfig, Fetcher};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Bind a local server and build its router once the base URL is known.
pub async fn spawn_app<F>(build: F) -> String
where
    F: FnOnce(String) -> Router,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    let app = build(base.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });

    base
}

pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout: Duration::from_millis(500),
        retry_delay: Duration::from_millis(10),
        ..FetchConfig::default()
    }
}

pub fn test_fetcher(config: FetchConfig) -> Fetcher {
    let extractor = ContentExtractor::new(&ExtractorConfig::default()).expect("default selectors compile");
    Fetcher::new(config, extractor).expect("fetcher builds")
}

pub fn test_summarizer_config(endpoint: &str, api_key: Option<&str>) -> SummarizerConfig {
    SummarizerConfig {
        api_key: api_key.map(str::to_string),
        endpoint: endpoint.to_string(),
        timeout: Duration::from_millis(500),
        base_delay: Duration::from_millis(10),
        ..SummarizerConfig::default()
    }
}

/// A paragraph comfortably above the 100-character acceptance threshold.
pub fn article_body(n: usize) -> String {
    format!(
        "Article number {n} reports that the city fire department completed a full inspection of \
         the new metro depot. Officials said the LNG terminal expansion remains on schedule for next year."
    )
}

pub fn article_page(n: usize) -> String {
    format!(
        "<html><head><title>Article {n}</title><script>var tracking = 'SECRET_SCRIPT';</script></head>\
         <body><nav>Home | World | NAV_LINK_TEXT</nav>\
         <article><h1>Headline {n}</h1><p>{}</p></article>\
         <footer>Copyright FOOTER_TEXT</footer></body></html>",
        article_body(n)
    )
}

pub struct RssItem {
    pub title: String,
    pub link: Option<String>,
    pub description: String,
}

pub fn rss_document(items: &[RssItem]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\"><channel>\
         <title>Test feed</title><link>http://example.com/</link><description>Test</description>",
    );
    for item in items {
        xml.push_str("<item>");
        xml.push_str(&format!("<title>{}</title>", item.title));
        if let Some(link) = &item.link {
            xml.push_str(&format!("<link>{}</link>", link));
        }
        xml.push_str(&format!("<description><![CDATA[{}]]></description>", item.description));
        xml.push_str("<pubDate>Mon, 19 Oct 2026 08:00:00 +0700</pubDate>");
        xml.push_str("</item>");
    }
    xml.push_str("</channel></rss>");
    xml
}

/// Summarizer that answers without any network call.
pub struct EchoSummarizer;

#[async_trait]
impl Summarizer for EchoSummarizer {
    fn adapter_name(&self) -> String {
        "Echo".to_string()
    }

    async fn summarize(&self, text: &str, title: &str) -> String {
        format!("{}: {} characters", title, text.chars().count())
    }
}
