//! Repost gate for previously published products.
//!
//! Qualifies when the price fell by more than `drop_threshold` (fraction of the old
//! price) AND the last post is older than the cooldown. Same shape as an alert
//! cooldown: nothing is mutated here, the caller records the post on success.

use chrono::Duration;

use crate::candidate::Candidate;
use crate::history::HistoryEntry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceDropInfo {
    pub previous_price: f64,
    /// round((1 - new/old) * 100)
    pub discount_pct: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct PriceDropRule {
    drop_threshold: f64,
    cooldown: Duration,
}

impl PriceDropRule {
    /// `drop_threshold` is clamped to 0..1; negative cooldowns count as 0.
    pub fn new(drop_threshold: f64, cooldown_secs: i64) -> Self {
        let drop_threshold = if drop_threshold.is_finite() {
            drop_threshold.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            drop_threshold,
            cooldown: Duration::seconds(cooldown_secs.clamp(0, i64::MAX / 1_000)),
        }
    }

    pub fn from_days(drop_threshold: f64, cooldown_days: u64) -> Self {
        let secs = i64::try_from(cooldown_days.saturating_mul(86_400)).unwrap_or(i64::MAX);
        Self::new(drop_threshold, secs)
    }

    pub fn detect(
        &self,
        candidate: &Candidate,
        entry: &HistoryEntry,
        now: i64,
    ) -> Option<PriceDropInfo> {
        detect(
            candidate,
            entry,
            now,
            self.drop_threshold,
            self.cooldown.num_seconds(),
        )
    }
}

/// `None` when the candidate does not qualify for a repost.
pub fn detect(
    candidate: &Candidate,
    entry: &HistoryEntry,
    now: i64,
    drop_threshold: f64,
    cooldown_secs: i64,
) -> Option<PriceDropInfo> {
    let old = entry.price;
    let new = candidate.price_min;
    if !(old.is_finite() && new.is_finite()) || old <= 0.0 || new < 0.0 {
        return None;
    }

    let cheap_enough = new < old * (1.0 - drop_threshold);
    let elapsed = now.saturating_sub(entry.last_posted_at);
    if !cheap_enough || elapsed <= cooldown_secs {
        return None;
    }

    let pct = ((1.0 - new / old) * 100.0).round().clamp(0.0, 100.0) as u32;
    Some(PriceDropInfo {
        previous_price: old,
        discount_pct: pct,
    })
}
