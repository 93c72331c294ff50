use scraper::{ElementRef, Html};

/// Elements whose text is never reader-visible.
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that separate words even when the markup has no whitespace.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];

const ALLOWED_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '(', ')', '-', '"', '\'', '“', '”', '‘', '’', '…',
];

/// Turn raw HTML or feed text into plain prose.
///
/// Markup is parsed leniently, so this never fails: unparseable input simply
/// comes back as its text. The result has no characters outside the
/// allow-list, single spaces between words and no surrounding whitespace.
/// Running it twice gives the same result as running it once.
pub fn sanitize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(raw);
    let text = visible_text(fragment.root_element(), &[]);

    normalize_text(&text)
}

/// Drop disallowed characters and collapse whitespace.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| is_allowed(*c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of `root` and its descendants, skipping invisible elements and any
/// element named in `excluded`.
pub(crate) fn visible_text(root: ElementRef<'_>, excluded: &[&str]) -> String {
    let mut text = String::new();

    for node in root.descendants() {
        if let Some(element) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&element.name()) {
                text.push(' ');
            }
            continue;
        }

        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|element| {
                INVISIBLE_ELEMENTS.contains(&element.name()) || excluded.contains(&element.name())
            })
        });

        if !hidden {
            text.push_str(fragment);
        }
    }

    text
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        || is_combining_mark(c)
        || ALLOWED_PUNCTUATION.contains(&c)
}

// Decomposed Vietnamese text carries its tone marks as combining characters.
fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
    )
}
