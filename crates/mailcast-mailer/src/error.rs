/// Errors raised while building or delivering an email.
///
/// # Examples
///
/// ```rust
/// use mailcast_mailer::MailerError;
///
/// let err = MailerError::Timeout(30);
/// assert_eq!(err.kind(), "timeout");
/// assert!(err.to_string().contains("30"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// A sender or recipient address failed to parse.
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Assembling the MIME message failed.
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// The SMTP conversation failed (connect, auth, or delivery).
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The per-call deadline expired before the relay answered.
    #[error("send timed out after {0}s")]
    Timeout(u64),
}

impl MailerError {
    /// Stable kind string recorded as the audit log's `error_type`.
    pub fn kind(&self) -> &'static str {
        match self {
            MailerError::Address(_) => "address",
            MailerError::Build(_) => "build",
            MailerError::Smtp(_) => "smtp",
            MailerError::Timeout(_) => "timeout",
        }
    }
}
