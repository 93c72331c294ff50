pub mod mailer;
pub mod report;

pub use mailer::{MailSettings, SmtpMailer};
pub use report::{DigestEmail, ReportAssembler};
