//! Process configuration, assembled once in `main` and passed down by reference.

pub mod keywords;
pub mod secrets;
pub mod settings;

use anyhow::{Context, Result};
use tracing::info;

pub use keywords::{load_keywords_from, parse_keywords};
pub use secrets::{Secrets, TelegramCreds};
pub use settings::{CuratorSettings, PriceDropOrder};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: CuratorSettings,
    pub secrets: Secrets,
    pub keywords: Vec<String>,
}

impl AppConfig {
    /// Settings file → secrets → keyword list. Any failure here aborts the run.
    pub fn load() -> Result<Self> {
        let settings = CuratorSettings::load_default()?;
        let secrets = Secrets::from_env(&settings).context("loading secrets")?;
        let keywords = if settings.keywords_path.exists() {
            load_keywords_from(&settings.keywords_path)?
        } else {
            Vec::new()
        };
        if keywords.is_empty() && settings.store_ids.is_empty() {
            anyhow::bail!(
                "nothing to search: no keywords in {} and no store_ids",
                settings.keywords_path.display()
            );
        }
        // Safe diagnostics only: counts and flags, no credentials.
        info!(
            keywords = keywords.len(),
            stores = settings.store_ids.len(),
            quota = settings.posts_per_run,
            ai = settings.ai_enabled,
            dry_run = settings.dry_run,
            "config loaded"
        );
        Ok(Self {
            settings,
            secrets,
            keywords,
        })
    }
}
