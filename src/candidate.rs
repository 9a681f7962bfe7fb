//! Candidate offers and their classified form.
//!
//! A `Candidate` is what a source returned this cycle, already validated at the
//! collector boundary (typed fields, optional signals as `Option`). A
//! `ClassifiedCandidate` carries the decision made by the pipeline.

use serde::{Deserialize, Serialize};

/// Product/offer observed from a source query this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable product identity; the only join key against history.
    pub item_id: u64,
    pub name: String,
    pub price_min: f64,
    pub price_max: Option<f64>,
    /// Fraction in 0..=1 (0.2 = 20% off).
    pub discount_rate: Option<f64>,
    pub rating: Option<f64>,
    pub sales: Option<u64>,
    pub offer_link: String,
    pub shop_name: String,
    pub image_url: Option<String>,
}

impl Candidate {
    /// Minimal constructor used by tests and fixtures; optional signals start empty.
    pub fn new(item_id: u64, name: impl Into<String>, price_min: f64) -> Self {
        Self {
            item_id,
            name: name.into(),
            price_min,
            price_max: None,
            discount_rate: None,
            rating: None,
            sales: None,
            offer_link: String::new(),
            shop_name: String::new(),
            image_url: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_discount(mut self, rate: f64) -> Self {
        self.discount_rate = Some(rate);
        self
    }

    pub fn with_sales(mut self, sales: u64) -> Self {
        self.sales = Some(sales);
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.offer_link = link.into();
        self
    }

    pub fn with_shop(mut self, shop: impl Into<String>) -> Self {
        self.shop_name = shop.into();
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Classification tag plus the data that only exists for that tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Never-before-published product, ranked by score.
    New { score: f64 },
    /// Previously published product that is now significantly cheaper.
    PriceDrop {
        previous_price: f64,
        discount_pct: u32,
    },
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::New { .. } => "new",
            Classification::PriceDrop { .. } => "price_drop",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedCandidate {
    pub candidate: Candidate,
    pub kind: Classification,
    /// Filled during publishing (NEW only).
    pub marketing_text: Option<String>,
}

impl ClassifiedCandidate {
    pub fn new_offer(candidate: Candidate, score: f64) -> Self {
        Self {
            candidate,
            kind: Classification::New { score },
            marketing_text: None,
        }
    }

    pub fn price_drop(candidate: Candidate, previous_price: f64, discount_pct: u32) -> Self {
        Self {
            candidate,
            kind: Classification::PriceDrop {
                previous_price,
                discount_pct,
            },
            marketing_text: None,
        }
    }

    pub fn item_id(&self) -> u64 {
        self.candidate.item_id
    }

    pub fn score(&self) -> Option<f64> {
        match self.kind {
            Classification::New { score } => Some(score),
            Classification::PriceDrop { .. } => None,
        }
    }

    pub fn discount_pct(&self) -> Option<u32> {
        match self.kind {
            Classification::PriceDrop { discount_pct, .. } => Some(discount_pct),
            Classification::New { .. } => None,
        }
    }

    pub fn is_price_drop(&self) -> bool {
        matches!(self.kind, Classification::PriceDrop { .. })
    }
}
