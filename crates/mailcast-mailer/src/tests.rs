use crate::smtp::SmtpMailer;
use crate::{MailTransport, MailerError, OutgoingMail};

#[test]
fn error_kinds_are_stable() {
    let addr_err = "not an address"
        .parse::<lettre::Address>()
        .expect_err("should not parse");
    assert_eq!(MailerError::from(addr_err).kind(), "address");
    assert_eq!(MailerError::Timeout(30).kind(), "timeout");
}

#[test]
fn timeout_error_names_the_deadline() {
    let err = MailerError::Timeout(45);
    assert!(err.to_string().contains("45"));
}

#[tokio::test]
async fn mailer_builds_with_and_without_credentials() {
    assert!(SmtpMailer::new("smtp.example.com", 587, None, None, 30).is_ok());
    assert!(SmtpMailer::new("smtp.example.com", 465, Some("user"), Some("pass"), 0).is_ok());
}

#[tokio::test]
async fn empty_recipient_list_is_a_successful_noop() {
    let mailer = SmtpMailer::new("smtp.example.com", 587, None, None, 30).unwrap();
    let mail = OutgoingMail {
        subject: "Weekly digest".into(),
        body: "Hello".into(),
        from: "noreply@example.com".into(),
        recipients: Vec::new(),
    };
    // No relay conversation happens, so this succeeds offline
    assert!(mailer.send(&mail).await.is_ok());
    assert_eq!(mailer.transport_name(), "smtp");
}

#[tokio::test]
async fn invalid_recipient_fails_before_any_send() {
    let mailer = SmtpMailer::new("smtp.example.com", 587, None, None, 30).unwrap();
    let mail = OutgoingMail {
        subject: "Weekly digest".into(),
        body: "Hello".into(),
        from: "noreply@example.com".into(),
        recipients: vec!["not an address".into()],
    };
    let err = mailer.send(&mail).await.expect_err("should fail");
    assert_eq!(err.kind(), "address");
}
