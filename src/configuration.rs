use crate::errors::AppError;
use crate::validation::ValidatedEmail;
use config::{Config, Environment, File, FileFormat};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::Path;
use std::time::Duration;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub identity_provider: IdentityProviderSettings,
    pub subscription: SubscriptionSettings,
    pub smtp: SmtpSettings,
    pub sender: SenderSettings,
    pub selection: SelectionSettings,
    pub mailer: MailerSettings,
    pub campaign: CampaignSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct IdentityProviderSettings {
    pub base_url: String,
    #[serde(default)]
    pub service_role_key: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SubscriptionSettings {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SenderSettings {
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SelectionSettings {
    /// How many of the earliest-registered accounts are considered.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub early_user_limit: usize,
    /// Subscription lookups in flight at once. 1 keeps the pass sequential.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub lookup_concurrency: usize,
}

#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct MailerSettings {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct CampaignSettings {
    pub subject: String,
    pub html_path: String,
}

impl IdentityProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

impl SubscriptionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

impl SmtpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

impl SenderSettings {
    pub fn parse_email(&self) -> Result<ValidatedEmail, AppError> {
        Ok(ValidatedEmail::parse(&self.email)?)
    }
}

impl CampaignSettings {
    /// Reads the HTML body from `html_path`.
    pub fn load_html(&self) -> anyhow::Result<String> {
        use anyhow::Context;
        std::fs::read_to_string(&self.html_path)
            .with_context(|| format!("error reading campaign html from {}", self.html_path))
    }
}

/// Variable names the job has always been deployed with, and the keys they override.
const LEGACY_ENV_OVERRIDES: [(&str, &str); 5] = [
    ("SUPABASE_URL", "identity_provider.base_url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "identity_provider.service_role_key"),
    ("GMAIL_USER", "smtp.username"),
    ("GMAIL_PASS", "smtp.password"),
    ("SEND_AS_EMAIL", "sender.email"),
];

pub fn get_configuration() -> Result<Settings, AppError> {
    let base_path = std::env::current_dir()
        .map_err(|e| AppError::ConfigError(format!("error finding current dir: {e}")))?;
    get_configuration_from(&base_path.join("config"))
}

pub fn get_configuration_from(config_dir: &Path) -> Result<Settings, AppError> {
    let env = Env::from_var(std::env::var("APP_ENV").ok())?;
    let additional_conf_name = format!("{}.yaml", env.as_str());

    let mut builder = Config::builder()
        .add_source(File::from(config_dir.join("base.yaml")).format(FileFormat::Yaml))
        .add_source(
            File::from(config_dir.join(additional_conf_name))
                .format(FileFormat::Yaml)
                .required(false),
        )
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );
    for (var, key) in LEGACY_ENV_OVERRIDES {
        builder = builder.set_override_option(key, std::env::var(var).ok())?;
    }

    builder.build()?.try_deserialize::<Settings>().map_err(AppError::from)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub enum Env {
    Local,
    #[default]
    Production,
}

impl Env {
    /// An unset `APP_ENV` means production, so a bare run delivers mail.
    pub fn from_var(value: Option<String>) -> Result<Self, AppError> {
        value.map_or(Ok(Env::default()), Env::try_from)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Env::Local => "local",
            Env::Production => "production",
        }
    }
}

impl TryFrom<String> for Env {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(AppError::EnvError(value)),
        }
    }
}
