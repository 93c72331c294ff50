use crate::extractor::ContentExtractor;
use crate::retry::{retry_with_backoff, Attempt, RetryPolicy};
use crate::types::{DigestError, FetchConfig, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::{Client, Response};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Charsets servers announce by default rather than because they mean it.
const UNRELIABLE_CHARSETS: &[&str] = &["iso-8859-1", "latin1", "latin-1", "iso_8859-1"];

/// How far into a document to look for a `<meta charset>` declaration.
const META_SNIFF_BYTES: usize = 2048;

/// Downloads article pages and feed documents.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    extractor: ContentExtractor,
}

impl Fetcher {
    pub fn new(config: FetchConfig, extractor: ContentExtractor) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value("Accept", &config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value("Accept-Language", &config.accept_language)?);

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            extractor,
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.config.max_attempts, self.config.retry_delay)
    }

    /// Fetch a page and return its main text, or an empty string.
    ///
    /// Timeouts are retried up to the attempt budget. Any other failure, a
    /// non-2xx status, or a page whose extracted text is too short to be an
    /// article ends the fetch right away with an empty result.
    pub async fn fetch_article(&self, url: &str) -> String {
        let start_time = Instant::now();
        debug!("Fetching article: {}", url);

        let outcome = retry_with_backoff(&self.retry_policy(), url, |attempt| async move {
            debug!("Article attempt {}/{}: {}", attempt, self.config.max_attempts, url);
            let response = self.client.get(url).send().await.map_err(classify)?;
            let status = response.status();
            if !status.is_success() {
                return Err(Attempt::Permanent(DigestError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                }));
            }
            self.decode_body(response).await
        })
        .await;

        let html = match outcome {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to fetch article {} after {} attempts: {}", url, e.attempts(), e);
                return String::new();
            }
        };

        let content = self.extractor.extract(&html);
        let length = content.chars().count();

        if length > self.config.min_content_chars {
            info!(
                "Extracted {} characters from {} in {}ms",
                length,
                url,
                start_time.elapsed().as_millis()
            );
            content
        } else {
            warn!("Content too short ({} characters) at {}", length, url);
            String::new()
        }
    }

    /// Download a feed document. Errors are returned so the caller can
    /// decide to skip the feed.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching feed: {}", url);

        retry_with_backoff(&self.retry_policy(), url, |_| async move {
            let response = self.client.get(url).send().await.map_err(classify)?;
            let status = response.status();
            if !status.is_success() {
                return Err(Attempt::Permanent(DigestError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                }));
            }

            let bytes = self.read_limited(response).await?;
            info!("Fetched feed: {} ({} bytes)", url, bytes.len());
            Ok(bytes)
        })
        .await
        .map_err(|e| e.into_inner())
    }

    async fn decode_body(&self, response: Response) -> std::result::Result<String, Attempt<DigestError>> {
        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_from_content_type);

        let bytes = self.read_limited(response).await?;
        Ok(decode_html(&bytes, declared.as_deref()))
    }

    // Bodies above `max_body_mb` are refused, by declared length when known.
    async fn read_limited(&self, response: Response) -> std::result::Result<Vec<u8>, Attempt<DigestError>> {
        let max_bytes = self.config.max_body_mb * 1024 * 1024;

        if let Some(content_length) = response.content_length() {
            if content_length as usize > max_bytes {
                return Err(Attempt::Permanent(DigestError::TooLarge {
                    size_mb: content_length as usize / (1024 * 1024),
                }));
            }
        }

        let bytes = response.bytes().await.map_err(classify)?;
        if bytes.len() > max_bytes {
            return Err(Attempt::Permanent(DigestError::TooLarge {
                size_mb: bytes.len() / (1024 * 1024),
            }));
        }

        Ok(bytes.to_vec())
    }
}

/// Decode an HTML body. A declared charset is trusted unless it is a
/// Latin-1 default, in which case the encoding is detected from the bytes.
pub fn decode_html(bytes: &[u8], declared_charset: Option<&str>) -> String {
    let declared = declared_charset
        .filter(|label| !is_unreliable_charset(label))
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    let encoding = declared.unwrap_or_else(|| detect_encoding(bytes));
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!("Body had malformed {} sequences", encoding.name());
    }

    text.into_owned()
}

/// Best guess at a body's encoding: a `<meta charset>` near the top, else
/// UTF-8 if the bytes are valid UTF-8, else Windows-1252.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    if let Some(label) = meta_charset(&head) {
        if !is_unreliable_charset(&label) {
            if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
                return encoding;
            }
        }
    }

    if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        WINDOWS_1252
    }
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').to_ascii_lowercase())
}

// Expects an already lowercased document head.
fn meta_charset(head: &str) -> Option<String> {
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

fn is_unreliable_charset(label: &str) -> bool {
    UNRELIABLE_CHARSETS.contains(&label.trim().to_ascii_lowercase().as_str())
}

fn classify(error: reqwest::Error) -> Attempt<DigestError> {
    if error.is_timeout() {
        Attempt::Transient(DigestError::Http(error))
    } else {
        Attempt::Permanent(DigestError::Http(error))
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| DigestError::InvalidConfig {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
