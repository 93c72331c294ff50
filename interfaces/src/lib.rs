pub mod defs;

pub use defs::{ArticleResult, CollectionReport, ReportSink, TopicArticles, TopicResults, WARNING_MARKER};
