use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

const DEFAULT_LOOKUP_ENDPOINT: &str = "https://api.oblivionhunters.com/details";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot_token: String,
    /// Falls back to the name reported by `getMe` when unset.
    #[serde(default)]
    pub bot_username: Option<String>,
    pub lookup_api_key: String,
    #[serde(default = "default_lookup_endpoint")]
    pub lookup_endpoint: String,
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// The only identity allowed to grant credits.
    pub admin_user_id: i64,
    #[serde(default)]
    pub payment_bot_username: String,
    #[serde(default)]
    pub support_bot_username: String,
    /// Public handle of the channel users must join, e.g. `@osint_updates`.
    #[serde(default)]
    pub verification_channel: String,
    /// Chat id used for the membership check. The gate is open when unset.
    #[serde(default)]
    pub required_channel_id: Option<i64>,
}

fn default_lookup_endpoint() -> String {
    DEFAULT_LOOKUP_ENDPOINT.to_string()
}

fn default_lookup_timeout_secs() -> u64 {
    15
}

fn default_database_url() -> String {
    "sqlite://users.db".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_paths = vec!["/etc/osint-bot/bot.toml", "./osint-bot.toml"];

        for path in config_paths {
            if let Ok(contents) = fs::read_to_string(path) {
                tracing::info!("Loading config from {}", path);
                return toml::from_str(&contents)
                    .with_context(|| format!("Invalid config file {}", path));
            }
        }

        tracing::info!("Loading config from environment");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from a key lookup, normally the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} is not set", key))
        };
        let optional = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            bot_token: required("BOT_TOKEN")?,
            bot_username: optional("BOT_USERNAME").map(|u| u.trim_start_matches('@').to_string()),
            lookup_api_key: required("LOOKUP_API_KEY")?,
            lookup_endpoint: optional("LOOKUP_ENDPOINT").unwrap_or_else(default_lookup_endpoint),
            lookup_timeout_secs: match optional("LOOKUP_TIMEOUT_SECS") {
                Some(v) => v.parse().context("LOOKUP_TIMEOUT_SECS must be a number")?,
                None => default_lookup_timeout_secs(),
            },
            database_url: optional("DATABASE_URL").unwrap_or_else(default_database_url),
            admin_user_id: required("ADMIN_USER_ID")?
                .parse()
                .context("ADMIN_USER_ID must be a numeric Telegram id")?,
            payment_bot_username: optional("PAYMENT_BOT_USERNAME").unwrap_or_default(),
            support_bot_username: optional("SUPPORT_BOT_USERNAME").unwrap_or_default(),
            verification_channel: optional("VERIFICATION_CHANNEL").unwrap_or_default(),
            required_channel_id: match optional("REQUIRED_CHANNEL_ID") {
                Some(v) => Some(v.parse().context("REQUIRED_CHANNEL_ID must be a chat id")?),
                None => None,
            },
        })
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}
