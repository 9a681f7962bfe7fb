// src/pipeline.rs
//! Curation pipeline: COLLECTING → CLASSIFYING → SCORING → SELECTING → PUBLISHING → DONE.
//!
//! Order of the publish list:
//! 1. price-drop alerts (discount desc or arrival order, configurable),
//! 2. new offers by score desc, ties by item id asc,
//! truncated to the per-run quota. `price_drops_first = false` swaps the two blocks.
//!
//! Every phase runs once; nothing loops back. A failed delivery is not recorded in
//! history and does not stop the remaining posts.

use metrics::{counter, gauge};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::ai::{fallback_text, TextGenerator};
use crate::candidate::{Candidate, ClassifiedCandidate};
use crate::collect::{collect, CollectParams, CollectStats};
use crate::config::{CuratorSettings, PriceDropOrder};
use crate::history::HistoryStore;
use crate::metrics::ensure_metrics_described;
use crate::notify::{build_message, MessageDelivery};
use crate::price_drop::PriceDropRule;
use crate::scoring::score;
use crate::similarity::NameMatcher;
use crate::sources::{LinkChecker, OfferSource, SourceSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Classifying,
    Scoring,
    Selecting,
    Publishing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Collecting => "collecting",
            Phase::Classifying => "classifying",
            Phase::Scoring => "scoring",
            Phase::Selecting => "selecting",
            Phase::Publishing => "publishing",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Max items published per run.
    pub quota: usize,
    pub price_drop_order: PriceDropOrder,
    pub price_drops_first: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            quota: 3,
            price_drop_order: PriceDropOrder::DiscountDesc,
            price_drops_first: true,
        }
    }
}

/// Output of CLASSIFYING. `fresh` still needs scoring.
#[derive(Debug, Default, Clone)]
pub struct Classified {
    pub price_drops: Vec<ClassifiedCandidate>,
    pub fresh: Vec<Candidate>,
    pub rejected_no_drop: usize,
    pub rejected_duplicate: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PublishReport {
    pub published: Vec<u64>,
    pub failed: Vec<u64>,
    pub repeated: usize,
    pub text_fallbacks: usize,
    pub history_errors: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub collect: CollectStats,
    pub collected: usize,
    pub price_drops: usize,
    pub new_offers: usize,
    pub rejected_no_drop: usize,
    pub rejected_duplicate: usize,
    pub rejected_zero_score: usize,
    pub selected: Vec<u64>,
    pub publish: PublishReport,
}

/// External collaborators of one run.
pub struct Collaborators<'a> {
    pub source: &'a dyn OfferSource,
    pub links: &'a dyn LinkChecker,
    pub generator: &'a dyn TextGenerator,
    pub delivery: &'a dyn MessageDelivery,
}

/// Decision logic of the pipeline, free of I/O.
#[derive(Debug, Clone)]
pub struct Curator {
    matcher: NameMatcher,
    price_rule: PriceDropRule,
    policy: SelectionPolicy,
}

impl Curator {
    pub fn new(matcher: NameMatcher, price_rule: PriceDropRule, policy: SelectionPolicy) -> Self {
        Self {
            matcher,
            price_rule,
            policy,
        }
    }

    pub fn from_settings(s: &CuratorSettings) -> Self {
        Self::new(
            NameMatcher::new(&s.stopwords, s.similarity_threshold),
            PriceDropRule::new(s.repost_drop_fraction, s.cooldown_secs()),
            SelectionPolicy {
                quota: s.posts_per_run,
                price_drop_order: s.price_drop_order,
                price_drops_first: s.price_drops_first,
            },
        )
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Known id → price-drop check only. Unknown id → near-duplicate check against
    /// every history name; survivors are NEW.
    pub fn classify(&self, candidates: Vec<Candidate>, history: &HistoryStore, now: i64) -> Classified {
        let known_names = history.names();
        let mut out = Classified::default();

        for c in candidates {
            if let Some(entry) = history.get(c.item_id) {
                match self.price_rule.detect(&c, entry, now) {
                    Some(info) => {
                        debug!(
                            item_id = c.item_id,
                            old = info.previous_price,
                            new = c.price_min,
                            pct = info.discount_pct,
                            "price drop"
                        );
                        out.price_drops.push(ClassifiedCandidate::price_drop(
                            c,
                            info.previous_price,
                            info.discount_pct,
                        ));
                    }
                    None => {
                        out.rejected_no_drop += 1;
                        counter!("curator_rejected_total", "reason" => "known_no_drop").increment(1);
                    }
                }
                continue;
            }

            if let Some((name, sim)) = self.matcher.find_duplicate(&c.name, &known_names) {
                debug!(item_id = c.item_id, candidate = %c.name, known = %name, sim, "near duplicate");
                out.rejected_duplicate += 1;
                counter!("curator_rejected_total", "reason" => "near_duplicate").increment(1);
                continue;
            }
            out.fresh.push(c);
        }
        out
    }

    /// Score NEW candidates; a zero score is never worth promoting and is dropped.
    /// Returns the scored list and how many were dropped.
    pub fn score_fresh(&self, fresh: Vec<Candidate>) -> (Vec<ClassifiedCandidate>, usize) {
        let mut zero = 0;
        let scored = fresh
            .into_iter()
            .filter_map(|c| {
                let s = score(&c);
                if s > 0.0 {
                    Some(ClassifiedCandidate::new_offer(c, s))
                } else {
                    zero += 1;
                    None
                }
            })
            .collect();
        if zero > 0 {
            counter!("curator_rejected_total", "reason" => "zero_score").increment(zero as u64);
        }
        (scored, zero)
    }

    /// Deterministic publish order, truncated to the quota.
    pub fn select(
        &self,
        mut price_drops: Vec<ClassifiedCandidate>,
        mut new_offers: Vec<ClassifiedCandidate>,
    ) -> Vec<ClassifiedCandidate> {
        if self.policy.price_drop_order == PriceDropOrder::DiscountDesc {
            price_drops.sort_by(|a, b| {
                b.discount_pct()
                    .cmp(&a.discount_pct())
                    .then_with(|| a.item_id().cmp(&b.item_id()))
            });
        }
        new_offers.sort_by(|a, b| {
            let (sa, sb) = (a.score().unwrap_or(0.0), b.score().unwrap_or(0.0));
            sb.total_cmp(&sa).then_with(|| a.item_id().cmp(&b.item_id()))
        });

        let mut out = if self.policy.price_drops_first {
            price_drops.extend(new_offers);
            price_drops
        } else {
            new_offers.extend(price_drops);
            new_offers
        };
        out.truncate(self.policy.quota);
        out
    }

    /// CLASSIFYING → SCORING → SELECTING over an already collected list.
    pub fn curate(
        &self,
        candidates: Vec<Candidate>,
        history: &HistoryStore,
        now: i64,
    ) -> (Vec<ClassifiedCandidate>, RunReport) {
        let mut report = RunReport {
            collected: candidates.len(),
            ..RunReport::default()
        };

        debug!(phase = %Phase::Classifying, candidates = candidates.len());
        let classified = self.classify(candidates, history, now);
        report.price_drops = classified.price_drops.len();
        report.rejected_no_drop = classified.rejected_no_drop;
        report.rejected_duplicate = classified.rejected_duplicate;

        debug!(phase = %Phase::Scoring, fresh = classified.fresh.len());
        let (new_offers, zero) = self.score_fresh(classified.fresh);
        report.new_offers = new_offers.len();
        report.rejected_zero_score = zero;

        debug!(phase = %Phase::Selecting, quota = self.policy.quota);
        let selected = self.select(classified.price_drops, new_offers);
        report.selected = selected.iter().map(|c| c.item_id()).collect();
        (selected, report)
    }
}

/// PUBLISHING: text (NEW only) → message → delivery → history commit on success.
pub async fn publish(
    selected: Vec<ClassifiedCandidate>,
    history: &mut HistoryStore,
    generator: &dyn TextGenerator,
    delivery: &dyn MessageDelivery,
    now: i64,
) -> PublishReport {
    ensure_metrics_described();
    let mut report = PublishReport::default();
    let mut done_this_run: HashSet<u64> = HashSet::new();

    for mut item in selected {
        let id = item.item_id();
        if !done_this_run.insert(id) {
            report.repeated += 1;
            continue;
        }

        if !item.is_price_drop() {
            let text = match generator.generate(&item.candidate).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(item_id = id, provider = generator.provider_name(), error = %e, "text generation failed, using fallback");
                    counter!("curator_textgen_fallbacks_total").increment(1);
                    report.text_fallbacks += 1;
                    fallback_text(&item.candidate)
                }
            };
            item.marketing_text = Some(text);
        }

        let message = build_message(&item);
        let delivered = delivery
            .deliver(&message, item.candidate.image_url.as_deref())
            .await;
        if !delivered {
            warn!(item_id = id, channel = delivery.name(), "delivery failed, not recorded");
            counter!("curator_delivery_failures_total").increment(1);
            report.failed.push(id);
            continue;
        }

        counter!("curator_published_total", "kind" => item.kind.label()).increment(1);
        if let Err(e) = history.commit(&item.candidate, now) {
            // Posted but not durable: a later run may post it again.
            warn!(item_id = id, error = ?e, "history flush failed");
            report.history_errors += 1;
        }
        info!(item_id = id, kind = item.kind.label(), name = %item.candidate.name, "published");
        report.published.push(id);
    }
    report
}

/// One full run. Source/text/delivery failures degrade; nothing here is fatal.
pub async fn run_cycle(
    curator: &Curator,
    collab: &Collaborators<'_>,
    selectors: &[SourceSelector],
    collect_params: &CollectParams,
    history: &mut HistoryStore,
    now: i64,
) -> RunReport {
    ensure_metrics_described();

    debug!(phase = %Phase::Collecting, selectors = selectors.len());
    let (candidates, collect_stats) =
        collect(collab.source, collab.links, selectors, collect_params).await;

    let (selected, mut report) = curator.curate(candidates, history, now);
    report.collect = collect_stats;

    debug!(phase = %Phase::Publishing, selected = selected.len());
    report.publish = publish(selected, history, collab.generator, collab.delivery, now).await;

    gauge!("curator_last_run_ts").set(now as f64);
    info!(
        phase = %Phase::Done,
        collected = report.collected,
        price_drops = report.price_drops,
        new_offers = report.new_offers,
        rejected_no_drop = report.rejected_no_drop,
        rejected_duplicate = report.rejected_duplicate,
        rejected_zero_score = report.rejected_zero_score,
        selected = report.selected.len(),
        published = report.publish.published.len(),
        failed = report.publish.failed.len(),
        "curation run finished"
    );
    report
}
