use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use crate::{MailTransport, MailerError, OutgoingMail};

/// SMTP [`MailTransport`] backed by lettre's async transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    send_timeout_secs: u64,
}

impl SmtpMailer {
    /// `send_timeout_secs = 0` disables the per-call deadline.
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: Option<&str>,
        password: Option<&str>,
        send_timeout_secs: u64,
    ) -> Result<Self, MailerError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?.port(smtp_port);

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            send_timeout_secs,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailerError> {
        if mail.recipients.is_empty() {
            return Ok(());
        }

        // Build every message up front so a bad address fails before the
        // first relay conversation starts.
        let mut messages = Vec::with_capacity(mail.recipients.len());
        for recipient in &mail.recipients {
            let message = Message::builder()
                .from(mail.from.parse()?)
                .to(recipient.parse()?)
                .subject(&mail.subject)
                .header(ContentType::TEXT_PLAIN)
                .body(mail.body.clone())?;
            messages.push((recipient, message));
        }

        for (recipient, message) in messages {
            let send = self.transport.send(message);
            let result = if self.send_timeout_secs > 0 {
                match tokio::time::timeout(Duration::from_secs(self.send_timeout_secs), send).await
                {
                    Ok(r) => r,
                    Err(_) => {
                        tracing::warn!(
                            recipient = %recipient,
                            timeout_secs = self.send_timeout_secs,
                            "SMTP send deadline expired"
                        );
                        return Err(MailerError::Timeout(self.send_timeout_secs));
                    }
                }
            } else {
                send.await
            };

            if let Err(e) = result {
                tracing::error!(recipient = %recipient, error = %e, "SMTP send failed");
                return Err(e.into());
            }
            tracing::debug!(recipient = %recipient, "Mail accepted by relay");
        }

        Ok(())
    }

    fn transport_name(&self) -> &str {
        "smtp"
    }
}
