use crate::configuration::IdentityProviderSettings;
use crate::domain::UserRecord;
use crate::errors::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

/// Source of every registered account.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>, AppError>;
}

#[derive(Clone, Debug)]
pub struct IdentityProviderClient {
    http_client: Client,
    base_url: String,
    service_role_key: String,
}

#[derive(Deserialize, Debug)]
struct ListUsersResponse {
    users: Vec<UserRecord>,
}

impl IdentityProviderClient {
    pub fn new(settings: &IdentityProviderSettings) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            service_role_key: settings.service_role_key.clone(),
        })
    }
}

#[async_trait]
impl UserDirectory for IdentityProviderClient {
    /// One request for the whole user set; paging is left to the provider's defaults.
    #[instrument(name = "listing users from identity provider", skip(self))]
    async fn list_users(&self) -> Result<Vec<UserRecord>, AppError> {
        let url = format!("{}/auth/v1/admin/users", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .header(reqwest::header::ACCEPT, mime::APPLICATION_JSON.as_ref())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| AppError::ListingUsers(e.to_string()))?;

        let body = response
            .json::<ListUsersResponse>()
            .await
            .map_err(|e| AppError::ListingUsers(e.to_string()))?;
        tracing::info!(user_count = body.users.len(), "listed users");
        Ok(body.users)
    }
}
