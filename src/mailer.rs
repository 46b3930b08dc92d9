use crate::email_client::MailSender;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct BulkMailer {
    sender: Arc<dyn MailSender>,
    dry_run: bool,
}

impl BulkMailer {
    pub fn new(sender: Arc<dyn MailSender>) -> Self {
        Self {
            sender,
            dry_run: false,
        }
    }

    /// Log the recipients instead of delivering.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sends one message per recipient, in order. A failed delivery is logged and the batch moves on.
    #[instrument(
        name = "sending campaign",
        skip_all,
        fields(recipients = recipients.len(), dry_run = self.dry_run)
    )]
    pub async fn send_to_all(
        &self,
        recipients: &[String],
        subject: &str,
        html_content: &str,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for recipient in recipients {
            if self.dry_run {
                tracing::info!(recipient = %recipient, "dry run, email not sent");
                continue;
            }
            match self.sender.send_email(recipient, subject, html_content).await {
                Ok(response) => {
                    report.sent += 1;
                    tracing::info!(recipient = %recipient, response = %response, "email sent");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(recipient = %recipient, error = %e, "error sending email");
                }
            }
        }

        report
    }
}
