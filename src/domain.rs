use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_default_from_null;

/// Recorded in place of an address when an eligible account has none.
pub const NO_EMAIL_PLACEHOLDER: &str = "no-email";

/// An account as listed by the identity provider, projected to what selection needs.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn recipient_address(&self) -> String {
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => email.to_string(),
            _ => NO_EMAIL_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    Inactive,
    Trialing,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionStatus {
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub subscription_status: SubscriptionState,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub is_early_user: bool,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub has_pro_access: bool,
}

impl SubscriptionStatus {
    /// Inactive subscription, not already an early-user pro member, and no pro access.
    pub fn is_eligible(&self) -> bool {
        self.subscription_status == SubscriptionState::Inactive
            && !self.is_early_user
            && !self.has_pro_access
    }
}
