//! Mail delivery for the dispatch engine.
//!
//! The engine talks to a [`MailTransport`]; the production implementation
//! is [`smtp::SmtpMailer`] (async SMTP via lettre). Tests substitute an
//! in-memory transport.

pub mod error;
pub mod smtp;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

pub use error::MailerError;

/// One outbound message: a subject/body pair fanned out to a recipient list.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub recipients: Vec<String>,
}

/// Sends a single message to a list of recipient addresses.
///
/// One attempt per call; retry policy belongs to the caller's window
/// semantics, not the transport. A failure may be partial: earlier
/// recipients can have been accepted before the error.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers the mail to every recipient.
    ///
    /// # Errors
    ///
    /// Returns a [`MailerError`] on any delivery problem; its
    /// [`kind`](MailerError::kind) feeds the audit log's `error_type`.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailerError>;

    /// Transport name for operator logs (e.g. `"smtp"`).
    fn transport_name(&self) -> &str;
}
