use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

/// One-time metric descriptions. Without an installed recorder every metric call is a no-op.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "curator_candidates_total",
            "Offers returned by sources before eligibility filtering."
        );
        describe_counter!(
            "curator_source_errors_total",
            "Source fetch/parse errors (page treated as empty)."
        );
        describe_counter!(
            "curator_rejected_total",
            "Candidates dropped during classification, by reason."
        );
        describe_counter!(
            "curator_published_total",
            "Offers delivered and committed to history, by kind."
        );
        describe_counter!(
            "curator_delivery_failures_total",
            "Deliveries that failed; item not recorded."
        );
        describe_counter!(
            "curator_textgen_fallbacks_total",
            "Marketing text replaced by the fallback string."
        );
        describe_gauge!("curator_last_run_ts", "Unix ts when a curation run last finished.");
    });
}
