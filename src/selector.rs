use crate::domain::UserRecord;
use crate::identity_provider::UserDirectory;
use crate::subscription_client::SubscriptionLookup;
use futures::StreamExt;
use std::sync::Arc;
use tracing::instrument;

/// Orders `users` earliest-registered first and keeps at most `limit` of them.
///
/// The sort is stable, so accounts created at the same instant keep the
/// provider's order.
pub fn earliest_candidates(mut users: Vec<UserRecord>, limit: usize) -> Vec<UserRecord> {
    users.sort_by_key(|user| user.created_at);
    users.truncate(limit);
    users
}

#[derive(Clone)]
pub struct EligibleRecipientSelector {
    directory: Arc<dyn UserDirectory>,
    subscriptions: Arc<dyn SubscriptionLookup>,
    early_user_limit: usize,
    lookup_concurrency: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Accounts whose subscription was looked up.
    pub candidates: usize,
    pub recipients: Vec<String>,
}

impl EligibleRecipientSelector {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        subscriptions: Arc<dyn SubscriptionLookup>,
        early_user_limit: usize,
    ) -> Self {
        Self {
            directory,
            subscriptions,
            early_user_limit,
            lookup_concurrency: 1,
        }
    }

    /// Allow up to `n` lookups in flight. Results are still taken in candidate order.
    pub fn with_lookup_concurrency(mut self, n: usize) -> Self {
        self.lookup_concurrency = n.max(1);
        self
    }

    /// Emails of the early users that pass the eligibility check, earliest first.
    pub async fn select(&self) -> Vec<String> {
        self.select_with_stats().await.recipients
    }

    #[instrument(
        name = "selecting eligible recipients",
        skip(self),
        fields(early_user_limit = self.early_user_limit)
    )]
    pub async fn select_with_stats(&self) -> Selection {
        let users = match self.directory.list_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "error fetching users, no recipients selected");
                return Selection::default();
            }
        };

        let candidates = earliest_candidates(users, self.early_user_limit);
        let candidate_count = candidates.len();

        let recipients: Vec<String> = futures::stream::iter(candidates)
            .map(|user| async move {
                match self.subscriptions.subscription_status(&user.id).await {
                    Ok(status) if status.is_eligible() => Some(user.recipient_address()),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::error!(user_id = %user.id, error = %e, "skipping user");
                        None
                    }
                }
            })
            .buffered(self.lookup_concurrency)
            .filter_map(futures::future::ready)
            .collect()
            .await;

        tracing::info!(
            candidates = candidate_count,
            recipients = recipients.len(),
            "finished eligibility checks"
        );
        Selection {
            candidates: candidate_count,
            recipients,
        }
    }
}
