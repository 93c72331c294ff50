use crate::sanitizer::{sanitize, truncate_chars};
use crate::types::{DigestError, FeedEntry, FeedField, Result, StructuredValue};
use feed_rs::model::{Entry, FeedType};
use feed_rs::parser;
use tracing::{debug, info};

pub const DEFAULT_FALLBACK_CHARS: usize = 1500;

const UNTITLED: &str = "Untitled";

/// Parse an RSS, Atom or JSON feed document into entries, in feed order.
pub fn parse_feed(content: &[u8]) -> Result<Vec<FeedEntry>> {
    debug!("Parsing feed content ({} bytes)", content.len());

    let feed = parser::parse(content)
        .map_err(|e| DigestError::Parse(format!("Failed to parse feed: {}", e)))?;

    let is_rss = matches!(feed.feed_type, FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2);
    let entries: Vec<FeedEntry> = feed
        .entries
        .into_iter()
        .map(|entry| convert_entry(entry, is_rss))
        .collect();

    info!(
        "Parsed feed '{}' with {} entries",
        feed.title.map(|t| t.content).unwrap_or_default(),
        entries.len()
    );

    Ok(entries)
}

fn convert_entry(entry: Entry, is_rss: bool) -> FeedEntry {
    let link = select_link(&entry);

    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let published = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc2822());

    // feed-rs folds RSS <description> and Atom <summary> into one field.
    let native_summary = entry.summary.map(|s| s.content);
    let media_description = entry
        .media
        .iter()
        .find_map(|media| media.description.as_ref())
        .map(|d| d.content.clone());

    let (description, summary) = if is_rss {
        (
            FeedField::from_optional(native_summary),
            FeedField::from_optional(media_description),
        )
    } else {
        (
            FeedField::Absent,
            FeedField::from_optional(native_summary.or(media_description)),
        )
    };

    let content = match entry.content {
        Some(content) => match content.body {
            Some(body) if !body.trim().is_empty() => FeedField::StructuredList(vec![StructuredValue {
                value: body,
                content_type: Some(content.content_type.essence_str().to_string()),
            }]),
            _ => FeedField::Absent,
        },
        None => FeedField::Absent,
    };

    FeedEntry {
        title,
        link,
        published,
        description,
        summary,
        content,
    }
}

// Prefer an alternate (or unlabelled) link, then any link at all.
fn select_link(entry: &Entry) -> Option<String> {
    let usable = |href: &str| !href.trim().is_empty();

    entry
        .links
        .iter()
        .find(|link| {
            usable(&link.href)
                && link
                    .rel
                    .as_deref()
                    .map_or(true, |rel| rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| entry.links.iter().find(|link| usable(&link.href)))
        .map(|link| link.href.trim().to_string())
}

/// Text taken straight from the feed when the linked page gives nothing.
///
/// Fields are tried in a fixed order (description, summary, content) and the
/// first with text wins. The result is sanitized and capped at
/// [`DEFAULT_FALLBACK_CHARS`].
pub fn fallback_description(entry: &FeedEntry) -> String {
    fallback_description_capped(entry, DEFAULT_FALLBACK_CHARS)
}

pub fn fallback_description_capped(entry: &FeedEntry, max_chars: usize) -> String {
    let raw = [&entry.description, &entry.summary, &entry.content]
        .into_iter()
        .find_map(FeedField::resolve);

    match raw {
        Some(raw) => truncate_chars(&sanitize(raw), max_chars),
        None => String::new(),
    }
}
