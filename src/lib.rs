// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod candidate;
pub mod config;
pub mod history;
pub mod lock;
pub mod metrics;

// Decision logic
pub mod price_drop;
pub mod scoring;
pub mod similarity;

// Collection + orchestration
pub mod collect;
pub mod pipeline;

// External collaborators (offer source, text generation, delivery)
pub mod ai;
pub mod notify;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::candidate::{Candidate, Classification, ClassifiedCandidate};
pub use crate::history::{HistoryEntry, HistoryStore};
pub use crate::pipeline::{run_cycle, Collaborators, Curator, RunReport, SelectionPolicy};
