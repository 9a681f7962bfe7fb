//! Desirability score for never-seen candidates.
//!
//! score = discount_rate * 1.5 + rating * 1.0 + log10(sales) * 0.8
//!
//! A missing, non-finite or sub-4.0 rating is a hard floor: score 0.
//! Other missing/invalid signals contribute 0 to their own term only.

use crate::candidate::Candidate;

pub const MIN_SCORED_RATING: f64 = 4.0;

pub const W_DISCOUNT: f64 = 1.5;
pub const W_RATING: f64 = 1.0;
pub const W_SALES: f64 = 0.8;

pub fn score(candidate: &Candidate) -> f64 {
    let rating = match candidate.rating {
        Some(r) if r.is_finite() && r >= MIN_SCORED_RATING => r,
        _ => return 0.0,
    };

    let mut total = rating * W_RATING;

    if let Some(d) = candidate.discount_rate.filter(|d| d.is_finite() && *d > 0.0) {
        total += d * W_DISCOUNT;
    }
    if let Some(s) = candidate.sales.filter(|s| *s > 0) {
        total += (s as f64).log10() * W_SALES;
    }

    if total.is_finite() {
        total.max(0.0)
    } else {
        0.0
    }
}
