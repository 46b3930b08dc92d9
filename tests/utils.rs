#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use early_user_mailer::email_client::MailSender;
use early_user_mailer::errors::AppError;
use early_user_mailer::identity_provider::IdentityProviderClient;
use early_user_mailer::configuration::{IdentityProviderSettings, SubscriptionSettings};
use early_user_mailer::selector::EligibleRecipientSelector;
use early_user_mailer::subscription_client::SubscriptionClient;
use mockito::{Mock, ServerGuard};
use serde_json::json;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// An account as the identity provider would list it.
#[derive(Clone, Debug)]
pub struct FakeUser {
    pub id: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl FakeUser {
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

/// `n` users registered one minute apart, earliest first.
pub fn synthetic_users(n: usize) -> Vec<FakeUser> {
    let start = Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap();
    (0..n)
        .map(|i| FakeUser {
            id: Uuid::new_v4().to_string(),
            email: Some(format!("user{i}@example.com")),
            created_at: (start + Duration::minutes(i as i64)).to_rfc3339(),
        })
        .collect()
}

pub async fn mock_listing(server: &mut ServerGuard, users: &[FakeUser]) -> Mock {
    let users: Vec<_> = users
        .iter()
        .map(|u| json!({ "id": u.id, "email": u.email, "created_at": u.created_at }))
        .collect();
    server
        .mock("GET", "/auth/v1/admin/users")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "users": users, "aud": "authenticated" }).to_string())
        .expect(1)
        .create_async()
        .await
}

pub async fn mock_status(
    server: &mut ServerGuard,
    user_id: &str,
    subscription_status: &str,
    is_early_user: bool,
    has_pro_access: bool,
    hits: usize,
) -> Mock {
    server
        .mock("GET", format!("/api/subscription/{user_id}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "subscription_status": subscription_status,
                "is_early_user": is_early_user,
                "has_pro_access": has_pro_access,
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

pub async fn mock_eligible(server: &mut ServerGuard, user_id: &str) -> Mock {
    mock_status(server, user_id, "inactive", false, false, 1).await
}

/// Selector whose identity provider and subscription API both live on `server`.
pub fn selector(server: &ServerGuard, early_user_limit: usize) -> EligibleRecipientSelector {
    let directory = IdentityProviderClient::new(&IdentityProviderSettings {
        base_url: server.url(),
        service_role_key: "service-role-key".into(),
        timeout_milliseconds: 5_000,
    })
    .expect("error building identity provider client");
    let subscriptions = SubscriptionClient::new(&SubscriptionSettings {
        base_url: server.url(),
        timeout_milliseconds: 5_000,
    })
    .expect("error building subscription client");

    EligibleRecipientSelector::new(Arc::new(directory), Arc::new(subscriptions), early_user_limit)
}

/// Stands in for SMTP: records every attempt and rejects the listed addresses.
#[derive(Default)]
pub struct RecordingSender {
    pub attempts: Mutex<Vec<String>>,
    pub rejecting: Vec<String>,
}

impl RecordingSender {
    pub fn rejecting(addresses: &[&str]) -> Self {
        Self {
            rejecting: addresses.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingSender {
    async fn send_email(&self, recipient: &str, _: &str, _: &str) -> Result<String, AppError> {
        self.attempts.lock().unwrap().push(recipient.to_string());
        if self.rejecting.iter().any(|r| r == recipient) {
            return Err(AppError::SendingEmail {
                recipient: recipient.to_string(),
                reason: "550 mailbox unavailable".into(),
            });
        }
        Ok("250 2.0.0 OK".into())
    }
}
