//! Invite letters over SMTP.
//!
//! [`MailInviteNotifier`] renders a letter and puts it on the mail queue.
//! [`SmtpMailSender`] is the transport the queue worker delivers through.

use crate::config::MailConfig;
use domain::services::{
    InviteLetter, InviteNotifier, MailError, MailPackage, MailQueue, MailSender,
    NotificationResult,
};
use lettre::address::Envelope;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

const INVITE_SUBJECT: &str = "You have been invited to a group";

/// Delivers rendered packages to `package.host` on the configured port.
///
/// STARTTLS is used when the relay offers it.
pub struct SmtpMailSender {
    port: u16,
    credentials: Option<Credentials>,
}

impl SmtpMailSender {
    pub fn new(config: &MailConfig) -> Self {
        let credentials = if config.smtp_username.is_empty() {
            None
        } else {
            Some(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
        };

        Self {
            port: config.smtp_port,
            credentials,
        }
    }

    fn transport(&self, host: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let tls = TlsParameters::new(host.to_string())
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(self.port)
            .tls(Tls::Opportunistic(tls));
        if let Some(credentials) = &self.credentials {
            builder = builder.credentials(credentials.clone());
        }
        Ok(builder.build())
    }
}

fn envelope(package: &MailPackage) -> Result<Envelope, MailError> {
    let from = parse_address(&package.from)?;
    let to = package
        .to
        .iter()
        .map(|recipient| parse_address(recipient))
        .collect::<Result<Vec<_>, _>>()?;
    Envelope::new(Some(from), to).map_err(|e| MailError::Build(e.to_string()))
}

fn parse_address(value: &str) -> Result<Address, MailError> {
    value
        .parse::<Address>()
        .map_err(|e| MailError::Build(format!("{}: {}", value, e)))
}

#[async_trait::async_trait]
impl MailSender for SmtpMailSender {
    async fn send(&self, package: &MailPackage) -> Result<(), MailError> {
        let envelope = envelope(package)?;
        let transport = self.transport(&package.host)?;

        transport
            .send_raw(&envelope, &package.message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        debug!(host = %package.host, recipients = package.to.len(), "SMTP delivery accepted");
        Ok(())
    }
}

/// Sends invite letters through the mail queue.
#[derive(Clone)]
pub struct MailInviteNotifier {
    queue: MailQueue,
    host: String,
    sender: Mailbox,
}

impl MailInviteNotifier {
    pub fn new(queue: MailQueue, config: &MailConfig) -> Result<Self, MailError> {
        let address = parse_address(&config.sender_email)?;
        Ok(Self {
            queue,
            host: config.smtp_host.clone(),
            sender: Mailbox::new(Some(config.sender_name.clone()), address),
        })
    }

    /// Render a letter into a ready-to-send package.
    pub fn render(&self, letter: &InviteLetter) -> Result<MailPackage, MailError> {
        let recipient = parse_address(&letter.recipient)?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(Mailbox::new(None, recipient))
            .subject(INVITE_SUBJECT)
            .multipart(MultiPart::alternative_plain_html(
                render_text(letter),
                render_html(letter),
            ))
            .map_err(|e| MailError::Build(e.to_string()))?;

        Ok(MailPackage::new(
            self.host.clone(),
            self.sender.email.to_string(),
            vec![letter.recipient.clone()],
            message.formatted(),
        ))
    }
}

#[async_trait::async_trait]
impl InviteNotifier for MailInviteNotifier {
    async fn send_invite(&self, letter: InviteLetter) -> NotificationResult {
        let package = match self.render(&letter) {
            Ok(package) => package,
            Err(e) => return NotificationResult::Failed(e.to_string()),
        };

        match self.queue.enqueue(package).await {
            Ok(()) => {
                info!(recipient = %letter.recipient, group = %letter.group_title, "Invite letter queued");
                NotificationResult::Queued
            }
            Err(e) => NotificationResult::Failed(e.to_string()),
        }
    }
}

fn render_text(letter: &InviteLetter) -> String {
    format!(
        r#"Hello,

{admin} ({email}) invited you to join the group "{group}".

Follow the link below to accept the invitation:

{link}

If you were not expecting this letter, you can safely ignore it."#,
        admin = letter.admin_name,
        email = letter.admin_email,
        group = letter.group_title,
        link = letter.link
    )
}

fn render_html(letter: &InviteLetter) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Group invitation</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="margin-top: 0;">You have been invited to &laquo;{group}&raquo;</h2>
    <p><strong>{admin}</strong> (<a href="mailto:{email}">{email}</a>) invited you to join the group.</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{link}" style="background: #667eea; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px; display: inline-block;">Join the group</a>
    </p>
    <p style="color: #666; font-size: 14px;">Or copy this link into your browser:<br>{link}</p>
    <p style="color: #999; font-size: 12px;">If you were not expecting this letter, you can safely ignore it.</p>
</body>
</html>"#,
        admin = escape_html(&letter.admin_name),
        email = escape_html(&letter.admin_email),
        group = escape_html(&letter.group_title),
        link = escape_html(&letter.link)
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::services::{mail_queue, DeliveryOutcome};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSender {
        packages: Mutex<Vec<MailPackage>>,
    }

    #[async_trait::async_trait]
    impl MailSender for RecordingSender {
        async fn send(&self, package: &MailPackage) -> Result<(), MailError> {
            self.packages.lock().unwrap().push(package.clone());
            Ok(())
        }
    }

    fn mail_config() -> MailConfig {
        MailConfig {
            enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            ..MailConfig::default()
        }
    }

    fn letter() -> InviteLetter {
        InviteLetter {
            recipient: "new@example.com".to_string(),
            admin_name: "Ann Lee".to_string(),
            admin_email: "ann@example.com".to_string(),
            group_title: "Flat <42>".to_string(),
            link: "http://nl-mail.ru/welcome/abcdEFGH12".to_string(),
        }
    }

    #[tokio::test]
    async fn test_render_builds_package() {
        let (queue, _worker) = mail_queue(1, Duration::from_secs(1), Arc::new(RecordingSender::default()));
        let notifier = MailInviteNotifier::new(queue, &mail_config()).unwrap();

        let package = notifier.render(&letter()).unwrap();
        assert_eq!(package.host, "smtp.example.com");
        assert_eq!(package.from, "noreply@nl-mail.ru");
        assert_eq!(package.to, vec!["new@example.com".to_string()]);
        assert_eq!(package.retries, 0);

        let raw = String::from_utf8_lossy(&package.message);
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("To: new@example.com"));
    }

    #[test]
    fn test_render_text_mentions_everything() {
        let text = render_text(&letter());
        assert!(text.contains("Ann Lee"));
        assert!(text.contains("ann@example.com"));
        assert!(text.contains("Flat <42>"));
        assert!(text.contains("http://nl-mail.ru/welcome/abcdEFGH12"));
    }

    #[test]
    fn test_render_html_escapes_title() {
        let html = render_html(&letter());
        assert!(html.contains("Flat &lt;42&gt;"));
        assert!(!html.contains("Flat <42>"));
    }

    #[tokio::test]
    async fn test_render_rejects_bad_recipient() {
        let (queue, _worker) = mail_queue(1, Duration::from_secs(1), Arc::new(RecordingSender::default()));
        let notifier = MailInviteNotifier::new(queue, &mail_config()).unwrap();

        let mut bad = letter();
        bad.recipient = "not-an-address".to_string();
        assert!(matches!(notifier.render(&bad), Err(MailError::Build(_))));
        assert!(matches!(
            notifier.send_invite(bad).await,
            NotificationResult::Failed(_)
        ));
    }

    #[test]
    fn test_new_rejects_bad_sender() {
        let (queue, _worker) = mail_queue(1, Duration::from_secs(1), Arc::new(RecordingSender::default()));
        let mut config = mail_config();
        config.sender_email = "nobody".to_string();
        assert!(MailInviteNotifier::new(queue, &config).is_err());
    }

    #[tokio::test]
    async fn test_send_invite_reaches_worker() {
        let sender = Arc::new(RecordingSender::default());
        let (queue, mut worker) = mail_queue(4, Duration::from_millis(1), sender.clone());
        let notifier = MailInviteNotifier::new(queue, &mail_config()).unwrap();

        assert_eq!(notifier.send_invite(letter()).await, NotificationResult::Queued);
        assert_eq!(worker.deliver_next().await, Some(DeliveryOutcome::Sent));

        let packages = sender.packages.lock().unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].to, vec!["new@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_send_invite_after_worker_dropped() {
        let (queue, worker) = mail_queue(1, Duration::from_secs(1), Arc::new(RecordingSender::default()));
        drop(worker);
        let notifier = MailInviteNotifier::new(queue, &mail_config()).unwrap();
        assert_eq!(
            notifier.send_invite(letter()).await,
            NotificationResult::Failed("mail queue is closed".to_string())
        );
    }

    #[test]
    fn test_envelope_uses_package_addresses() {
        let package = MailPackage::new(
            "smtp.example.com",
            "noreply@nl-mail.ru",
            vec!["a@example.com".to_string()],
            Vec::new(),
        );
        let built = envelope(&package).unwrap();
        assert_eq!(built.to().len(), 1);
        assert_eq!(built.from().unwrap().to_string(), "noreply@nl-mail.ru");

        let bad = MailPackage::new("h", "bad", vec![], Vec::new());
        assert!(envelope(&bad).is_err());
    }
}
