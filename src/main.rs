//! Offer curator — binary entrypoint.
//! One run per invocation: collect → classify → score → select → publish, then exit.
//! Schedule it externally (cron, CI schedule, platform job).

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use offer_curator::ai::{DisabledGenerator, GeminiGenerator, TextGenerator};
use offer_curator::collect::{selectors_from, CollectParams};
use offer_curator::config::AppConfig;
use offer_curator::lock::RunLock;
use offer_curator::notify::{ConsoleDelivery, MessageDelivery, TelegramDelivery};
use offer_curator::sources::link::HttpLinkChecker;
use offer_curator::sources::shopee::ShopeeAffiliateSource;
use offer_curator::sources::{AssumeLive, LinkChecker};
use offer_curator::{run_cycle, Collaborators, Curator, HistoryStore};

/// `LOG_FORMAT=json` for structured output; filter via `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("offer_curator=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Config/secret failures are fatal before any phase runs.
    let cfg = AppConfig::load()?;
    let s = &cfg.settings;
    let _lock = RunLock::acquire(&s.lock_path, s.lock_max_age())?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("offer-curator/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(s.http_timeout_secs))
        .build()
        .context("building HTTP client")?;

    let source = ShopeeAffiliateSource::new(
        http.clone(),
        cfg.secrets.shopee_partner_id,
        cfg.secrets.shopee_api_key.clone(),
    )
    .with_page_size(s.page_size);

    let links: Box<dyn LinkChecker> = if s.check_links {
        Box::new(HttpLinkChecker::new(http.clone()).with_timeout(s.http_timeout_secs))
    } else {
        Box::new(AssumeLive)
    };

    let generator: Box<dyn TextGenerator> = match &cfg.secrets.gemini_api_key {
        Some(key) if s.ai_enabled => Box::new(
            GeminiGenerator::new(http.clone(), key.clone(), s.ai_model.clone())
                .with_timeout(s.http_timeout_secs),
        ),
        _ => Box::new(DisabledGenerator),
    };

    let delivery: Box<dyn MessageDelivery> = match &cfg.secrets.telegram {
        Some(tg) if !s.dry_run => Box::new(
            TelegramDelivery::new(http.clone(), tg.bot_token.clone(), tg.chat_id.clone())
                .with_timeout(s.http_timeout_secs),
        ),
        _ => Box::new(ConsoleDelivery),
    };

    let mut history = HistoryStore::load(&s.history_path)?;
    if s.dry_run {
        history = history.detached();
    }
    info!(entries = history.len(), path = %s.history_path.display(), "history ready");

    let selectors = selectors_from(&cfg.keywords, &s.store_ids);
    let params = CollectParams {
        pages_per_source: s.pages_per_source,
        min_rating: s.min_rating,
        request_delay: Duration::from_millis(s.request_delay_ms),
    };
    let curator = Curator::from_settings(s);
    let collab = Collaborators {
        source: &source,
        links: links.as_ref(),
        generator: generator.as_ref(),
        delivery: delivery.as_ref(),
    };

    let now = chrono::Utc::now().timestamp();
    let report = run_cycle(&curator, &collab, &selectors, &params, &mut history, now).await;

    info!(
        published = report.publish.published.len(),
        failed = report.publish.failed.len(),
        history_entries = history.len(),
        "run complete"
    );
    Ok(())
}
