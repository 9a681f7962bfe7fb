// src/sources/mod.rs
pub mod link;
pub mod shopee;

use anyhow::Result;
use std::fmt;

use crate::candidate::Candidate;

/// What to query: free-text search or a whole shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    Keyword(String),
    Store(u64),
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSelector::Keyword(k) => write!(f, "keyword:{k}"),
            SourceSelector::Store(id) => write!(f, "store:{id}"),
        }
    }
}

/// One page of offers for a selector. Pages start at 1; an empty page ends the source.
#[async_trait::async_trait]
pub trait OfferSource: Send + Sync {
    async fn fetch(&self, selector: &SourceSelector, page: u32) -> Result<Vec<Candidate>>;
    fn name(&self) -> &'static str;
}

/// Destination-link reachability check used by the collector.
#[async_trait::async_trait]
pub trait LinkChecker: Send + Sync {
    async fn is_live(&self, url: &str) -> bool;
}

/// Skips probing; every non-empty link counts as live.
pub struct AssumeLive;

#[async_trait::async_trait]
impl LinkChecker for AssumeLive {
    async fn is_live(&self, url: &str) -> bool {
        !url.trim().is_empty()
    }
}
