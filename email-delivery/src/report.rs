use chrono::{DateTime, Local};
use interfaces::defs::CollectionReport;

const RULE_WIDTH: usize = 60;
const SECTION_WIDTH: usize = 50;
const ENTRY_WIDTH: usize = 40;

/// A rendered digest, ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestEmail {
    pub subject: String,
    pub body: String,
}

/// Formats a collection report as a plain-text email.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    pub subject_prefix: String,
    pub footer_note: String,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self {
            subject_prefix: "[NEWS DIGEST]".to_string(),
            footer_note: "Next run: tomorrow 08:00".to_string(),
        }
    }
}

impl ReportAssembler {
    pub fn assemble(&self, report: &CollectionReport, now: DateTime<Local>) -> DigestEmail {
        DigestEmail {
            subject: self.subject(report, now),
            body: self.body(report, now),
        }
    }

    pub fn subject(&self, report: &CollectionReport, now: DateTime<Local>) -> String {
        format!(
            "{} {} — {} ({} articles)",
            self.subject_prefix,
            report.topics.topic_names().join("·"),
            now.format("%Y-%m-%d"),
            report.total()
        )
    }

    /// Header, one section per topic that has articles, footer. Topics with
    /// no articles are left out of the body.
    pub fn body(&self, report: &CollectionReport, now: DateTime<Local>) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut body = String::new();

        body.push_str("📰 DAILY NEWS DIGEST\n");
        body.push_str(&format!("📅 Date: {}\n", now.format("%Y-%m-%d")));
        body.push_str(&format!("⏰ Generated at: {}\n", now.format("%H:%M:%S")));
        body.push_str(&format!("📊 Total: {} articles\n", report.total()));
        body.push_str(&rule);
        body.push_str("\n\n");

        for section in report.topics.iter() {
            if section.articles.is_empty() {
                continue;
            }

            body.push_str(&format!("\n🏷️  {} ({} articles)\n", section.topic, section.articles.len()));
            body.push_str(&"─".repeat(SECTION_WIDTH));
            body.push_str("\n\n");

            for (i, article) in section.articles.iter().enumerate() {
                body.push_str(&format!("{}. {}\n", i + 1, article.title));
                if !article.link.is_empty() {
                    body.push_str(&format!("🔗 {}\n", article.link));
                }
                if !article.published.is_empty() {
                    body.push_str(&format!("📅 {}\n", article.published));
                }
                body.push_str(&format!("📝 Summary: {}\n", article.summary));
                body.push_str(&format!("📏 Length: {} characters\n", article.content_length));
                body.push('\n');
                body.push_str(&"·".repeat(ENTRY_WIDTH));
                body.push_str("\n\n");
            }
        }

        body.push('\n');
        body.push_str(&rule);
        body.push('\n');
        body.push_str("🤖 Automated daily digest\n");
        body.push_str(&format!("🔄 {}\n", self.footer_note));

        body
    }
}
