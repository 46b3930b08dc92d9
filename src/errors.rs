use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input from validator: {0}")]
    ValidationError(#[from] garde::Report),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),

    #[error("error initializing Config: {0}")]
    ConfigError(String),

    #[error("error parsing env value: {0}")]
    EnvError(String),

    #[error("error listing users from identity provider: {0}")]
    ListingUsers(String),

    #[error("error fetching subscription for user {user_id}: {reason}")]
    SubscriptionLookup { user_id: String, reason: String },

    #[error("invalid email address `{0}`")]
    InvalidAddress(String),

    #[error("error building email: {0}")]
    BuildingEmail(String),

    #[error("error sending email to {recipient}: {reason}")]
    SendingEmail { recipient: String, reason: String },
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::ConfigError(e.to_string())
    }
}
