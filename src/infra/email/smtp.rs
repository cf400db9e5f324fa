use anyhow::{Context, Result};
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

use crate::services::publisher::Mailer;

/// Sends mail to its own account over implicit-TLS SMTP.
pub struct SmtpMailer {
    transport: SmtpTransport,
    mailbox: Mailbox,
}

impl SmtpMailer {
    /// Mailer for a Gmail account authenticated with an app password.
    pub fn gmail(username: &str, app_password: &str) -> Result<Self> {
        let transport = SmtpTransport::relay("smtp.gmail.com")?
            .credentials(SmtpCredentials::new(
                username.to_string(),
                app_password.to_string(),
            ))
            .build();
        let mailbox: Mailbox = username
            .parse()
            .with_context(|| format!("invalid email address '{username}'"))?;

        Ok(Self { transport, mailbox })
    }
}

/// Builds a plain-text UTF-8 message from and to `mailbox`.
fn compose(mailbox: &Mailbox, subject: &str, body: &str) -> Result<Message> {
    Ok(Message::builder()
        .from(mailbox.clone())
        .to(mailbox.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())?)
}

impl Mailer for SmtpMailer {
    fn send(&self, subject: &str, body: &str) -> Result<()> {
        let message = compose(&self.mailbox, subject, body)?;
        self.transport
            .send(&message)
            .context("SMTP delivery failed")?;
        debug!(to = %self.mailbox, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_addresses_self() {
        let mailbox: Mailbox = "someone@example.com".parse().unwrap();
        let message = compose(&mailbox, "Daily Update", "body \u{2190}").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: someone@example.com"));
        assert!(raw.contains("To: someone@example.com"));
        assert!(raw.contains("Subject: Daily Update"));
        assert!(raw.contains("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_invalid_username_is_rejected() {
        assert!(SmtpMailer::gmail("not-an-address", "pw").is_err());
    }
}
