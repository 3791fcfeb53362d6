//! Email delivery through an SMTP relay with STARTTLS.

use crate::config::SmtpConfig;
use crate::notify::{Notifier, NotifyError};
use crate::report::Document;
use lettre::message::{header::ContentType, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use std::time::Duration;

/// Sends the report as a single-part email.
///
/// The sender address doubles as the login user, as most relays expect.
pub struct SmtpNotifier {
    server: String,
    from: Mailbox,
    to: Mailbox,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig, timeout: Duration) -> Result<Self, NotifyError> {
        if config.server.trim().is_empty() {
            return Err(NotifyError::Config("smtp server is empty".to_string()));
        }
        let from = parse_mailbox("from", &config.from)?;
        let to = parse_mailbox("to", &config.to)?;

        let transport = SmtpTransport::starttls_relay(&config.server)
            .map_err(|e| {
                NotifyError::Config(format!("Failed to set up relay {}: {e}", config.server))
            })?
            .port(config.port)
            .credentials(Credentials::new(config.from.clone(), config.password.clone()))
            .timeout(Some(timeout))
            .build();

        Ok(Self {
            server: config.server,
            from,
            to,
            transport,
        })
    }

    /// The message this notifier would send for `document`.
    pub fn message(&self, document: &Document) -> Result<Message, NotifyError> {
        build_message(&self.from, &self.to, document)
    }
}

/// Build an email carrying `document` as its only body part.
pub fn build_message(
    from: &Mailbox,
    to: &Mailbox,
    document: &Document,
) -> Result<Message, NotifyError> {
    let content_type = ContentType::parse(document.content_type())
        .map_err(|e| NotifyError::Config(format!("Invalid content type: {e}")))?;

    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(document.subject.clone())
        .header(content_type)
        .body(document.body.clone())
        .map_err(|e| NotifyError::Config(format!("Failed to build message: {e}")))
}

fn parse_mailbox(field: &str, address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|e| NotifyError::Config(format!("Invalid smtp {field} address '{address}': {e}")))
}

impl Notifier for SmtpNotifier {
    fn name(&self) -> &'static str {
        "smtp"
    }

    fn deliver(&self, document: &Document) -> Result<(), NotifyError> {
        let message = self.message(document)?;
        self.transport
            .send(&message)
            .map_err(|e| NotifyError::Network(e.to_string()))?;
        tracing::info!(server = %self.server, to = %self.to, "Report emailed");
        Ok(())
    }
}
