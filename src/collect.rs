// src/collect.rs
//! Collection phase: query every selector page by page, apply baseline eligibility
//! (rating floor, reachable link) and de-duplicate by item id.
//!
//! Source failures never abort collection; the failing page counts as empty.
//! History-based filtering is NOT done here: a product already in history must
//! reach the pipeline so it can be considered for a price-drop repost.

use metrics::counter;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::candidate::Candidate;
use crate::metrics::ensure_metrics_described;
use crate::sources::{LinkChecker, OfferSource, SourceSelector};

#[derive(Debug, Clone)]
pub struct CollectParams {
    pub pages_per_source: u32,
    pub min_rating: f64,
    /// Pause between two successive source queries.
    pub request_delay: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectStats {
    pub queries: usize,
    pub source_errors: usize,
    pub fetched: usize,
    pub below_rating: usize,
    pub dead_links: usize,
    pub duplicate_ids: usize,
}

/// Keyword selectors first, then stores, in configuration order.
pub fn selectors_from(keywords: &[String], store_ids: &[u64]) -> Vec<SourceSelector> {
    keywords
        .iter()
        .map(|k| SourceSelector::Keyword(k.clone()))
        .chain(store_ids.iter().map(|id| SourceSelector::Store(*id)))
        .collect()
}

pub async fn collect(
    source: &dyn OfferSource,
    links: &dyn LinkChecker,
    selectors: &[SourceSelector],
    params: &CollectParams,
) -> (Vec<Candidate>, CollectStats) {
    ensure_metrics_described();
    let mut stats = CollectStats::default();
    let mut raw: Vec<Candidate> = Vec::new();

    for selector in selectors {
        for page in 1..=params.pages_per_source.max(1) {
            if stats.queries > 0 && !params.request_delay.is_zero() {
                tokio::time::sleep(params.request_delay).await;
            }
            stats.queries += 1;

            match source.fetch(selector, page).await {
                Ok(items) if items.is_empty() => {
                    debug!(%selector, page, "end of results");
                    break;
                }
                Ok(mut items) => {
                    stats.fetched += items.len();
                    raw.append(&mut items);
                }
                Err(e) => {
                    // Treated as "no results" for this selector.
                    warn!(error = ?e, source = source.name(), %selector, page, "source error");
                    counter!("curator_source_errors_total").increment(1);
                    stats.source_errors += 1;
                    break;
                }
            }
        }
    }
    counter!("curator_candidates_total").increment(stats.fetched as u64);

    let before = raw.len();
    let unique = dedup_last_wins(raw);
    stats.duplicate_ids = before - unique.len();

    let mut kept = Vec::with_capacity(unique.len());
    for c in unique {
        if c.rating.unwrap_or(0.0) < params.min_rating {
            stats.below_rating += 1;
            continue;
        }
        if !links.is_live(&c.offer_link).await {
            debug!(item_id = c.item_id, link = %c.offer_link, "dead link");
            stats.dead_links += 1;
            continue;
        }
        kept.push(c);
    }

    info!(
        queries = stats.queries,
        fetched = stats.fetched,
        kept = kept.len(),
        errors = stats.source_errors,
        below_rating = stats.below_rating,
        dead_links = stats.dead_links,
        duplicate_ids = stats.duplicate_ids,
        "collection finished"
    );
    (kept, stats)
}

/// Same id seen twice in one pass: the later observation wins, the first position stays.
pub fn dedup_last_wins(items: Vec<Candidate>) -> Vec<Candidate> {
    let mut pos: HashMap<u64, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<Candidate> = Vec::with_capacity(items.len());
    for c in items {
        match pos.get(&c.item_id) {
            Some(&i) => out[i] = c,
            None => {
                pos.insert(c.item_id, out.len());
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_duplicate_replaces_value_in_place() {
        let items = vec![
            Candidate::new(1, "a", 10.0),
            Candidate::new(2, "b", 20.0),
            Candidate::new(1, "a2", 9.0),
        ];
        let out = dedup_last_wins(items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "a2");
        assert_eq!(out[0].price_min, 9.0);
        assert_eq!(out[1].item_id, 2);
    }

    #[test]
    fn selectors_keywords_then_stores() {
        let s = selectors_from(&["fone".to_string()], &[7, 8]);
        assert_eq!(
            s,
            vec![
                SourceSelector::Keyword("fone".into()),
                SourceSelector::Store(7),
                SourceSelector::Store(8)
            ]
        );
    }
}
