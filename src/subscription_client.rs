use crate::configuration::SubscriptionSettings;
use crate::domain::SubscriptionStatus;
use crate::errors::AppError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

#[async_trait]
pub trait SubscriptionLookup: Send + Sync {
    async fn subscription_status(&self, user_id: &str) -> Result<SubscriptionStatus, AppError>;
}

#[derive(Clone, Debug)]
pub struct SubscriptionClient {
    http_client: Client,
    base_url: String,
}

impl SubscriptionClient {
    pub fn new(settings: &SubscriptionSettings) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SubscriptionLookup for SubscriptionClient {
    #[instrument(name = "fetching subscription status", skip(self))]
    async fn subscription_status(&self, user_id: &str) -> Result<SubscriptionStatus, AppError> {
        let lookup_error = |e: reqwest::Error| AppError::SubscriptionLookup {
            user_id: user_id.to_string(),
            reason: e.to_string(),
        };
        let url = format!("{}/api/subscription/{}", self.base_url, user_id);

        self.http_client
            .get(&url)
            .header(reqwest::header::ACCEPT, mime::APPLICATION_JSON.as_ref())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(lookup_error)?
            .json::<SubscriptionStatus>()
            .await
            .map_err(lookup_error)
    }
}
