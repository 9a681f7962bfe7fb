// src/config/secrets.rs
use anyhow::{anyhow, Context, Result};
use std::env;

use super::settings::CuratorSettings;

pub const ENV_SHOPEE_PARTNER_ID: &str = "SHOPEE_PARTNER_ID";
pub const ENV_SHOPEE_API_KEY: &str = "SHOPEE_API_KEY";
pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Credentials resolved once at startup. Never logged.
#[derive(Clone)]
pub struct Secrets {
    pub shopee_partner_id: u64,
    pub shopee_api_key: String,
    /// `None` only in dry-run mode.
    pub telegram: Option<TelegramCreds>,
    /// `None` when AI text is disabled.
    pub gemini_api_key: Option<String>,
}

#[derive(Clone)]
pub struct TelegramCreds {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("shopee_partner_id", &self.shopee_partner_id)
            .field("shopee_api_key_len", &self.shopee_api_key.len())
            .field("telegram", &self.telegram.is_some())
            .field("gemini", &self.gemini_api_key.is_some())
            .finish()
    }
}

impl Secrets {
    /// Any missing secret the settings require is a fatal startup error.
    pub fn from_env(settings: &CuratorSettings) -> Result<Self> {
        Self::from_lookup(settings, |k| env::var(k).ok())
    }

    pub fn from_lookup<F>(settings: &CuratorSettings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("missing {key} env var"))
        };

        let partner_raw = required(ENV_SHOPEE_PARTNER_ID)?;
        let shopee_partner_id = partner_raw
            .parse::<u64>()
            .with_context(|| format!("{ENV_SHOPEE_PARTNER_ID} must be an integer"))?;
        let shopee_api_key = required(ENV_SHOPEE_API_KEY)?;

        let telegram = if settings.dry_run {
            None
        } else {
            Some(TelegramCreds {
                bot_token: required(ENV_TELEGRAM_BOT_TOKEN)?,
                chat_id: required(ENV_TELEGRAM_CHAT_ID)?,
            })
        };

        let gemini_api_key = if settings.ai_enabled {
            Some(required(ENV_GEMINI_API_KEY)?)
        } else {
            None
        };

        Ok(Self {
            shopee_partner_id,
            shopee_api_key,
            telegram,
            gemini_api_key,
        })
    }
}
