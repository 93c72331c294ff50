use crate::sanitizer::{normalize_text, truncate_chars, visible_text};
use crate::types::{DigestError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Selectors tried in order until one matches. These are tuned against the
/// sites in the default feed table and drift as those sites change markup.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[class*=\"content\"]",
    "[class*=\"article\"]",
    "[class*=\"post\"]",
    "[class*=\"story\"]",
    "[id*=\"content\"]",
    "[id*=\"article\"]",
    ".main-content",
    ".entry-content",
    ".post-content",
];

/// Page chrome that must never reach the output.
pub const DEFAULT_REMOVED_ELEMENTS: &[&str] =
    &["script", "style", "nav", "header", "footer", "aside", "menu"];

pub const DEFAULT_MAX_CONTENT_CHARS: usize = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub selectors: Vec<String>,
    pub removed_elements: Vec<String>,
    pub max_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_CONTENT_SELECTORS.iter().map(|s| s.to_string()).collect(),
            removed_elements: DEFAULT_REMOVED_ELEMENTS.iter().map(|s| s.to_string()).collect(),
            max_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }
}

/// Pulls the main article text out of a page.
pub struct ContentExtractor {
    selectors: Vec<(String, Selector)>,
    removed_elements: Vec<String>,
    body_selector: Selector,
    max_chars: usize,
}

impl ContentExtractor {
    /// Compile the configured selectors. A selector that does not parse is a
    /// configuration error, reported here rather than on every page.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let selectors = config
            .selectors
            .iter()
            .map(|raw| compile_selector(raw).map(|selector| (raw.clone(), selector)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            selectors,
            removed_elements: config
                .removed_elements
                .iter()
                .map(|name| name.to_ascii_lowercase())
                .collect(),
            body_selector: compile_selector("body")?,
            max_chars: config.max_chars,
        })
    }

    /// Extract readable text from a full HTML document.
    ///
    /// The first selector with at least one match wins and the text of all its
    /// matches is joined. Without any match, or when the matches hold no text,
    /// the body text is used, and without a body the whole document. Output never exceeds the configured cap and
    /// is empty when nothing readable was found.
    pub fn extract(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }

        let document = Html::parse_document(html);
        if !document.errors.is_empty() {
            debug!("HTML parsed with {} recoverable errors", document.errors.len());
        }

        let excluded: Vec<&str> = self.removed_elements.iter().map(String::as_str).collect();

        let raw_text = match self.select_content(&document, &excluded) {
            Some(text) => text,
            None => match document.select(&self.body_selector).next() {
                Some(body) => visible_text(body, &excluded),
                None => visible_text(document.root_element(), &excluded),
            },
        };

        let text = normalize_text(&raw_text);
        if text.is_empty() {
            warn!("No readable text found in document ({} bytes)", html.len());
            return text;
        }

        truncate_chars(&text, self.max_chars)
    }

    fn select_content(&self, document: &Html, excluded: &[&str]) -> Option<String> {
        for (raw, selector) in &self.selectors {
            let matches: Vec<ElementRef<'_>> = document
                .select(selector)
                .filter(|element| !self.is_removed(element))
                .collect();

            if matches.is_empty() {
                continue;
            }

            debug!("Content selector '{}' matched {} elements", raw, matches.len());
            let text = matches
                .into_iter()
                .map(|element| visible_text(element, excluded))
                .collect::<Vec<_>>()
                .join(" ");

            // Empty matches (ad slots, placeholders) leave the page to the body fallback.
            if normalize_text(&text).is_empty() {
                debug!("Content selector '{}' matched only empty elements", raw);
                return None;
            }
            return Some(text);
        }

        None
    }

    // An element counts as removed when it, or any ancestor, is page chrome.
    fn is_removed(&self, element: &ElementRef<'_>) -> bool {
        let named_removed = |name: &str| self.removed_elements.iter().any(|removed| removed == name);

        if named_removed(element.value().name()) {
            return true;
        }

        element
            .ancestors()
            .filter_map(|node| node.value().as_element())
            .any(|ancestor| named_removed(ancestor.name()))
    }
}

fn compile_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| DigestError::Selector {
        selector: raw.to_string(),
        reason: format!("{:?}", e),
    })
}
