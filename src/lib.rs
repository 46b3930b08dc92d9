pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod errors;
pub mod identity_provider;
pub mod mailer;
pub mod selector;
pub mod subscription_client;
pub mod telemetry;
pub mod validation;

use crate::configuration::{Settings, get_configuration};
use crate::email_client::SmtpEmailClient;
use crate::errors::AppError;
use crate::identity_provider::IdentityProviderClient;
use crate::mailer::BulkMailer;
use crate::selector::EligibleRecipientSelector;
use crate::subscription_client::SubscriptionClient;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub candidates: usize,
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Subject and HTML body sent to every recipient.
#[derive(Clone, Debug)]
pub struct Campaign {
    pub subject: String,
    pub html: String,
}

pub struct Application {
    selector: EligibleRecipientSelector,
    mailer: BulkMailer,
    campaign: Campaign,
}

impl Application {
    /// Builds every collaborator once from `conf`.
    pub fn build(conf: &Settings) -> Result<Self, AppError> {
        let directory = IdentityProviderClient::new(&conf.identity_provider)?;
        let subscriptions = SubscriptionClient::new(&conf.subscription)?;
        let selector = EligibleRecipientSelector::new(
            Arc::new(directory),
            Arc::new(subscriptions),
            conf.selection.early_user_limit,
        )
        .with_lookup_concurrency(conf.selection.lookup_concurrency);

        let email_client = SmtpEmailClient::new(
            &conf.smtp,
            &conf.sender.display_name,
            conf.sender.parse_email()?,
        )?;
        if conf.mailer.dry_run {
            tracing::warn!("dry run is on, recipients will be logged and no email sent");
        }
        let mailer = BulkMailer::new(Arc::new(email_client)).dry_run(conf.mailer.dry_run);

        let campaign = Campaign {
            subject: conf.campaign.subject.clone(),
            html: conf.campaign.load_html()?,
        };

        Ok(Self::from_parts(selector, mailer, campaign))
    }

    pub fn from_parts(
        selector: EligibleRecipientSelector,
        mailer: BulkMailer,
        campaign: Campaign,
    ) -> Self {
        Self {
            selector,
            mailer,
            campaign,
        }
    }

    #[instrument(name = "early user campaign", skip(self))]
    pub async fn run_batch(&self) -> BatchReport {
        let selection = self.selector.select_with_stats().await;
        let delivery = self
            .mailer
            .send_to_all(
                &selection.recipients,
                &self.campaign.subject,
                &self.campaign.html,
            )
            .await;

        let report = BatchReport {
            candidates: selection.candidates,
            recipients: selection.recipients.len(),
            sent: delivery.sent,
            failed: delivery.failed,
        };
        tracing::info!(
            candidates = report.candidates,
            recipients = report.recipients,
            sent = report.sent,
            failed = report.failed,
            "batch finished"
        );
        report
    }
}

pub async fn run() -> Result<BatchReport, AppError> {
    let conf = get_configuration()?;
    let app = Application::build(&conf)?;
    Ok(app.run_batch().await)
}
