use crate::configuration::SmtpSettings;
use crate::errors::AppError;
use crate::validation::ValidatedEmail;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::instrument;

/// Delivers a single HTML message, returning the server's response text.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<String, AppError>;
}

pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl std::fmt::Debug for SmtpEmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpEmailClient")
            .field("sender", &self.sender.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpEmailClient {
    /// STARTTLS relay with the configured credentials. No connection is made until the first send.
    pub fn new(
        settings: &SmtpSettings,
        display_name: &str,
        sender: ValidatedEmail,
    ) -> Result<Self, AppError> {
        let creds = Credentials::new(settings.username.clone(), settings.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| AppError::ConfigError(format!("error creating SMTP relay: {e}")))?
            .port(settings.port)
            .credentials(creds)
            .timeout(Some(settings.timeout()))
            .build();

        Ok(Self {
            transport,
            sender: sender_mailbox(display_name, &sender)?,
        })
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    pub fn build_message(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<Message, AppError> {
        let to = ValidatedEmail::parse(recipient)
            .map_err(|_| AppError::InvalidAddress(recipient.to_string()))?;
        let to: Address = to
            .as_str()
            .parse()
            .map_err(|_| AppError::InvalidAddress(recipient.to_string()))?;

        Message::builder()
            .from(self.sender.clone())
            .to(Mailbox::new(None, to))
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_content.to_string())
            .map_err(|e| AppError::BuildingEmail(e.to_string()))
    }
}

fn sender_mailbox(display_name: &str, sender: &ValidatedEmail) -> Result<Mailbox, AppError> {
    let address: Address = sender
        .as_str()
        .parse()
        .map_err(|_| AppError::InvalidAddress(sender.as_str().to_string()))?;
    let name = Some(display_name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(Mailbox::new(name, address))
}

#[async_trait]
impl MailSender for SmtpEmailClient {
    #[instrument(name = "sending email over smtp", skip(self, subject, html_content))]
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<String, AppError> {
        let message = self.build_message(recipient, subject, html_content)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::SendingEmail {
                recipient: recipient.to_string(),
                reason: e.to_string(),
            })?;

        let text = response.message().collect::<Vec<_>>().join(" ");
        Ok(format!("{} {}", response.code(), text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::lorem::en::Sentence;

    fn smtp_settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            username: "user".into(),
            password: "pass".into(),
            timeout_milliseconds: 10_000,
        }
    }

    fn email_client() -> SmtpEmailClient {
        let sender = ValidatedEmail::parse("hello@tailtag.link").unwrap();
        SmtpEmailClient::new(&smtp_settings(), "TailTag", sender).unwrap()
    }

    fn formatted(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).into_owned()
    }

    #[test]
    fn message_carries_sender_subject_and_html() {
        let recipient: String = SafeEmail().fake();
        let subject: String = Sentence(2..4).fake();

        let message = email_client()
            .build_message(&recipient, &subject, "<p>hi</p>")
            .expect("error building message");
        let raw = formatted(&message);

        assert!(raw.contains("From: TailTag <hello@tailtag.link>"), "{raw}");
        assert!(raw.contains(&format!("To: {recipient}")), "{raw}");
        assert!(raw.contains("text/html"), "{raw}");
        assert!(raw.contains("<p>hi</p>"), "{raw}");
    }

    #[test]
    fn placeholder_recipient_is_an_invalid_address() {
        let res = email_client().build_message("no-email", "subject", "<p>hi</p>");
        assert!(matches!(res, Err(AppError::InvalidAddress(a)) if a == "no-email"));
    }

    #[test]
    fn blank_display_name_leaves_bare_address() {
        let sender = ValidatedEmail::parse("hello@tailtag.link").unwrap();
        let client = SmtpEmailClient::new(&smtp_settings(), "  ", sender).unwrap();
        assert_eq!(client.sender().to_string(), "hello@tailtag.link");
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let res = email_client().send_email("not an address", "s", "<p>b</p>").await;
        assert!(matches!(res, Err(AppError::InvalidAddress(_))));
    }
}
