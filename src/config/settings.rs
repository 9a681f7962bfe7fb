// src/config/settings.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::similarity::DEFAULT_STOPWORDS;

pub const ENV_CONFIG_PATH: &str = "CURATOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/curator.toml";
/// Upper bound for `lock_max_age_mins` (one year).
const MAX_LOCK_AGE_MINS: u64 = 60 * 24 * 365;

/// Order among price-drop alerts in the publish list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PriceDropOrder {
    /// As classified (collection order).
    Arrival,
    /// Biggest discount first, ties by id ascending.
    #[default]
    DiscountDesc,
}

fn default_history_path() -> PathBuf {
    PathBuf::from("historico_produtos.json")
}
fn default_keywords_path() -> PathBuf {
    PathBuf::from("config/keywords.txt")
}
fn default_lock_path() -> PathBuf {
    PathBuf::from("historico_produtos.lock")
}
fn default_lock_max_age_mins() -> u64 {
    180
}
fn default_posts_per_run() -> usize {
    3
}
fn default_pages_per_source() -> u32 {
    2
}
fn default_page_size() -> u32 {
    20
}
fn default_request_delay_ms() -> u64 {
    2_000
}
fn default_min_rating() -> f64 {
    4.0
}
fn default_similarity_threshold() -> u8 {
    85
}
fn default_repost_drop_fraction() -> f64 {
    0.15
}
fn default_cooldown_days() -> u64 {
    7
}
fn default_true() -> bool {
    true
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_ai_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}
fn default_stopwords() -> Vec<String> {
    DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect()
}

/// Tunables loaded from TOML. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorSettings {
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default = "default_keywords_path")]
    pub keywords_path: PathBuf,
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,
    /// A lock file older than this is treated as left behind by a killed run.
    #[serde(default = "default_lock_max_age_mins")]
    pub lock_max_age_mins: u64,
    /// Shop ids monitored in addition to keywords.
    #[serde(default)]
    pub store_ids: Vec<u64>,
    /// Quota: max posts per run.
    #[serde(default = "default_posts_per_run")]
    pub posts_per_run: usize,
    #[serde(default = "default_pages_per_source")]
    pub pages_per_source: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Fixed pause between successive source queries.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Collector eligibility floor.
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    /// 0..=100
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: u8,
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,
    /// Fraction of the last posted price a product must drop below to be reposted.
    #[serde(default = "default_repost_drop_fraction")]
    pub repost_drop_fraction: f64,
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: u64,
    #[serde(default)]
    pub price_drop_order: PriceDropOrder,
    /// `false` puts ranked new offers ahead of price-drop alerts.
    #[serde(default = "default_true")]
    pub price_drops_first: bool,
    #[serde(default = "default_true")]
    pub check_links: bool,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub ai_enabled: bool,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    /// Print messages instead of sending; history is not written.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for CuratorSettings {
    fn default() -> Self {
        Self {
            history_path: default_history_path(),
            keywords_path: default_keywords_path(),
            lock_path: default_lock_path(),
            lock_max_age_mins: default_lock_max_age_mins(),
            store_ids: Vec::new(),
            posts_per_run: default_posts_per_run(),
            pages_per_source: default_pages_per_source(),
            page_size: default_page_size(),
            request_delay_ms: default_request_delay_ms(),
            min_rating: default_min_rating(),
            similarity_threshold: default_similarity_threshold(),
            stopwords: default_stopwords(),
            repost_drop_fraction: default_repost_drop_fraction(),
            cooldown_days: default_cooldown_days(),
            price_drop_order: PriceDropOrder::default(),
            price_drops_first: true,
            check_links: true,
            http_timeout_secs: default_http_timeout_secs(),
            ai_enabled: true,
            ai_model: default_ai_model(),
            dry_run: false,
        }
    }
}

impl CuratorSettings {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing settings {}", path.display()))
    }

    /// 1) $CURATOR_CONFIG_PATH (must exist)
    /// 2) config/curator.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if p.exists() {
            return Self::load_from(&p);
        }
        Ok(Self::default())
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: CuratorSettings = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Pull out-of-range values back into range instead of failing the run.
    pub fn sanitize(&mut self) {
        if !(0.0..1.0).contains(&self.repost_drop_fraction) {
            self.repost_drop_fraction = default_repost_drop_fraction();
        }
        if !self.min_rating.is_finite() || self.min_rating < 0.0 {
            self.min_rating = default_min_rating();
        }
        self.similarity_threshold = self.similarity_threshold.min(100);
        self.pages_per_source = self.pages_per_source.max(1);
        self.page_size = self.page_size.clamp(1, 50);
        self.http_timeout_secs = self.http_timeout_secs.max(1);
        let mut seen = HashSet::new();
        self.store_ids.retain(|id| seen.insert(*id));
        self.lock_max_age_mins = self.lock_max_age_mins.clamp(1, MAX_LOCK_AGE_MINS);
        for w in &mut self.stopwords {
            *w = w.trim().to_lowercase();
        }
        self.stopwords.retain(|w| !w.is_empty());
    }

    pub fn lock_max_age(&self) -> chrono::Duration {
        let mins = self.lock_max_age_mins.clamp(1, MAX_LOCK_AGE_MINS);
        chrono::Duration::minutes(i64::try_from(mins).unwrap_or(1))
    }

    pub fn cooldown_secs(&self) -> i64 {
        i64::try_from(self.cooldown_days.saturating_mul(86_400)).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = CuratorSettings::parse("").unwrap();
        assert_eq!(cfg.posts_per_run, 3);
        assert_eq!(cfg.similarity_threshold, 85);
        assert_eq!(cfg.price_drop_order, PriceDropOrder::DiscountDesc);
        assert!(cfg.price_drops_first);
        assert!(cfg.stopwords.iter().any(|w| w == "premium"));
        assert_eq!(cfg.cooldown_secs(), 7 * 86_400);
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let cfg = CuratorSettings::parse(
            r#"
repost_drop_fraction = 1.5
similarity_threshold = 180
pages_per_source = 0
page_size = 500
stopwords = [" KIT ", ""]
"#,
        )
        .unwrap();
        assert_eq!(cfg.repost_drop_fraction, 0.15);
        assert_eq!(cfg.similarity_threshold, 100);
        assert_eq!(cfg.pages_per_source, 1);
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.stopwords, vec!["kit".to_string()]);
    }

    #[test]
    fn store_ids_deduped_keeping_first_position() {
        let cfg = CuratorSettings::parse("store_ids = [1, 2, 1, 3, 2]").unwrap();
        assert_eq!(cfg.store_ids, vec![1, 2, 3]);
    }

    #[test]
    fn lock_age_defaults_and_floor() {
        assert_eq!(CuratorSettings::default().lock_max_age().num_minutes(), 180);
        let cfg = CuratorSettings::parse("lock_max_age_mins = 0").unwrap();
        assert_eq!(cfg.lock_max_age().num_minutes(), 1);
    }

    #[test]
    fn order_parses_snake_case() {
        let cfg = CuratorSettings::parse(r#"price_drop_order = "arrival""#).unwrap();
        assert_eq!(cfg.price_drop_order, PriceDropOrder::Arrival);
    }

    #[test]
    fn unknown_types_are_errors() {
        assert!(CuratorSettings::parse("posts_per_run = \"many\"").is_err());
    }
}
