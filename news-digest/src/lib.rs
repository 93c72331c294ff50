pub mod types;
pub mod sanitizer;
pub mod extractor;
pub mod retry;
pub mod fetcher;
pub mod parser;
pub mod summarizer;
pub mod processor;
pub mod aggregator;
pub mod feeds;
pub mod config;

pub use types::*;
pub use extractor::{ContentExtractor, ExtractorConfig};
pub use fetcher::Fetcher;
pub use parser::{fallback_description, parse_feed};
pub use summarizer::{ChatSummarizer, Summarizer, SummarizerConfig};
pub use processor::FeedProcessor;
pub use aggregator::DigestCollector;
pub use feeds::{FeedTable, TopicFeeds};
pub use config::{AppConfig, RunConfig};
