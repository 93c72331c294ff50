use crate::report::{DigestEmail, ReportAssembler};
use anyhow::{Context, Result};
use chrono::Local;
use interfaces::defs::{CollectionReport, ReportSink};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{info, error};

#[derive(Clone)]
pub struct MailSettings {
    pub host: String,
    pub port: u16,
    /// Login name, also used as the sender address.
    pub username: String,
    pub password: String,
    pub recipient: String,
    pub timeout_seconds: u64,
}

// Keep the password out of logs.
impl std::fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Sends digests over SMTP with STARTTLS.
pub struct SmtpMailer {
    settings: MailSettings,
    assembler: ReportAssembler,
}

impl SmtpMailer {
    pub fn new(settings: MailSettings) -> Self {
        Self {
            settings,
            assembler: ReportAssembler::default(),
        }
    }

    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    /// Build the MIME message without sending it.
    pub fn build_message(&self, email: &DigestEmail) -> Result<Message> {
        let message = Message::builder()
            .from(
                self.settings
                    .username
                    .parse()
                    .with_context(|| format!("Invalid sender address '{}'", self.settings.username))?,
            )
            .to(self
                .settings
                .recipient
                .parse()
                .with_context(|| format!("Invalid recipient address '{}'", self.settings.recipient))?)
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .context("Failed to build email message")?;

        Ok(message)
    }

    pub async fn send(&self, email: &DigestEmail) -> Result<()> {
        let message = self.build_message(email)?;

        info!(
            "Connecting to SMTP server {}:{}",
            self.settings.host, self.settings.port
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.host)
            .with_context(|| format!("Invalid SMTP host '{}'", self.settings.host))?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(self.settings.timeout_seconds)))
            .build();

        match transport.send(message).await {
            Ok(_) => {
                info!("Email sent to {}: {}", self.settings.recipient, email.subject);
                Ok(())
            }
            Err(e) if e.is_permanent() => {
                error!("SMTP server rejected the message: {}", e);
                Err(anyhow::Error::new(e)
                    .context("SMTP server rejected the login or message; check SMTP_USER/SMTP_PASS"))
            }
            Err(e) => {
                error!("SMTP delivery failed: {}", e);
                Err(anyhow::Error::new(e).context(format!(
                    "Failed to deliver email via {}:{}",
                    self.settings.host, self.settings.port
                )))
            }
        }
    }
}

impl ReportSink for SmtpMailer {
    async fn deliver(&self, report: &CollectionReport) -> Result<()> {
        let email = self.assembler.assemble(report, Local::now());
        self.send(&email).await
    }
}
