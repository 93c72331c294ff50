use crate::extractor::ExtractorConfig;
use crate::feeds::FeedTable;
use crate::summarizer::SummarizerConfig;
use crate::types::{DigestError, Result};
use email_delivery::MailSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const ENV_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_SMTP_HOST: &str = "SMTP_HOST";
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";
pub const ENV_SMTP_USER: &str = "SMTP_USER";
pub const ENV_SMTP_PASS: &str = "SMTP_PASS";
pub const ENV_EMAIL_TO: &str = "EMAIL_TO";

const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT_SECONDS: u64 = 30;

/// Process-wide settings, read once at startup and passed down explicitly.
#[derive(Clone, Default)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub email_to: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_pass", &self.smtp_pass.as_ref().map(|_| "***"))
            .field("email_to", &self.email_to)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let smtp_port = match get(ENV_SMTP_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|e| DigestError::InvalidConfig {
                name: ENV_SMTP_PORT.to_string(),
                reason: format!("'{}': {}", raw, e),
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            api_key: get(ENV_API_KEY),
            smtp_host: get(ENV_SMTP_HOST).unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
            smtp_user: get(ENV_SMTP_USER),
            smtp_pass: get(ENV_SMTP_PASS),
            email_to: get(ENV_EMAIL_TO),
        })
    }

    /// Names of the mail variables that are not set.
    pub fn missing_mail_settings(&self) -> Vec<String> {
        [
            (ENV_SMTP_USER, &self.smtp_user),
            (ENV_SMTP_PASS, &self.smtp_pass),
            (ENV_EMAIL_TO, &self.email_to),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub fn mail_settings(&self) -> Result<MailSettings> {
        let missing = self.missing_mail_settings();
        if !missing.is_empty() {
            return Err(DigestError::MissingConfig(missing));
        }

        Ok(MailSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_user.clone().unwrap_or_default(),
            password: self.smtp_pass.clone().unwrap_or_default(),
            recipient: self.email_to.clone().unwrap_or_default(),
            timeout_seconds: SMTP_TIMEOUT_SECONDS,
        })
    }

    pub fn summarizer_config(&self) -> SummarizerConfig {
        SummarizerConfig {
            api_key: self.api_key.clone(),
            ..SummarizerConfig::default()
        }
    }
}

/// Optional JSON overrides for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub feeds: Option<FeedTable>,
    pub selectors: Option<Vec<String>>,
    pub max_articles: Option<usize>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        info!("Loaded run configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(raw)?;
        if let Some(feeds) = &config.feeds {
            feeds.validate()?;
        }
        Ok(config)
    }

    pub fn feed_table(&self) -> FeedTable {
        self.feeds.clone().unwrap_or_default()
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let mut config = ExtractorConfig::default();
        if let Some(selectors) = &self.selectors {
            config.selectors = selectors.clone();
        }
        config
    }
}
