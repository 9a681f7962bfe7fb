//! history.rs — persisted record of published products (id → last name/price/time).
//!
//! The file is a single JSON object keyed by the product id in string form:
//!
//! ```json
//! { "123": { "productName": "...", "priceMin": 49.9, "lastPostedTimestamp": 1700000000 } }
//! ```
//!
//! It is rewritten in full on every commit (tmp file + rename). The store has no
//! eviction: it grows by one entry per distinct product ever published.
//! One process at a time; see `crate::lock` for the run lock.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::candidate::Candidate;
use crate::sources::shopee::{lenient_f64, lenient_u64};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(rename = "productName")]
    pub name: String,
    #[serde(rename = "priceMin")]
    pub price: f64,
    /// Unix seconds of the last successful post.
    #[serde(rename = "lastPostedTimestamp")]
    pub last_posted_at: i64,
}

/// Accepted on-disk shapes: the keyed map, or a bare id list from older bot runs.
/// Values stay untyped so one malformed entry never costs the rest of the file.
#[derive(Deserialize)]
#[serde(untagged)]
enum OnDisk {
    Keyed(BTreeMap<String, Value>),
    LegacyIds(Vec<Value>),
}

#[derive(Debug, Default)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    entries: BTreeMap<u64, HistoryEntry>,
}

impl HistoryEntry {
    /// Id-only entry: never a price-drop reference, never name-matched.
    fn legacy() -> Self {
        Self {
            name: String::new(),
            price: 0.0,
            last_posted_at: 0,
        }
    }
}

impl HistoryStore {
    /// Store that never touches disk (tests, dry runs).
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. Missing file → empty store. Entries with missing, null or
    /// mistyped fields are kept with defaults. A file that is not JSON at all is
    /// copied to `<file>.bak` and treated as empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(s) => parse_entries(&s).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "history unreadable, starting empty");
                backup_unreadable(&path);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading history {}", path.display()))
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "history loaded");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Keep the loaded entries but stop writing to disk (dry runs).
    pub fn detached(mut self) -> Self {
        self.path = None;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, item_id: u64) -> bool {
        self.entries.contains_key(&item_id)
    }

    pub fn get(&self, item_id: u64) -> Option<&HistoryEntry> {
        self.entries.get(&item_id)
    }

    /// Known names for near-duplicate matching; legacy entries have none.
    pub fn names(&self) -> Vec<&str> {
        self.entries
            .values()
            .map(|e| e.name.as_str())
            .filter(|n| !n.trim().is_empty())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &HistoryEntry)> {
        self.entries.iter()
    }

    /// Insert/overwrite the entry for a published candidate and flush immediately.
    /// The in-memory entry is kept even if the flush fails.
    pub fn commit(&mut self, candidate: &Candidate, now: i64) -> Result<()> {
        self.entries.insert(
            candidate.item_id,
            HistoryEntry {
                name: candidate.name.clone(),
                price: candidate.price_min,
                last_posted_at: now,
            },
        );
        self.flush()
    }

    /// Rewrite the whole file. No-op for in-memory stores.
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_atomic(path, &self.entries)
            .with_context(|| format!("writing history {}", path.display()))
    }
}

fn parse_entries(s: &str) -> Result<BTreeMap<u64, HistoryEntry>> {
    if s.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let parsed: OnDisk = serde_json::from_str(s).context("parse history JSON")?;
    let mut out = BTreeMap::new();
    match parsed {
        OnDisk::Keyed(map) => {
            let mut patched = 0usize;
            for (k, v) in map {
                let Ok(id) = k.trim().parse::<u64>() else {
                    warn!(key = %k, "history key is not a product id, skipped");
                    continue;
                };
                let (entry, complete) = entry_from_value(&v);
                if !complete {
                    debug!(item_id = id, raw = %v, "history entry patched with defaults");
                    patched += 1;
                }
                out.insert(id, entry);
            }
            if patched > 0 {
                warn!(patched, "history entries with missing or invalid fields kept with defaults");
            }
        }
        OnDisk::LegacyIds(ids) => {
            for v in ids {
                match lenient_u64(&v) {
                    Some(id) => {
                        out.insert(id, HistoryEntry::legacy());
                    }
                    None => warn!(raw = %v, "legacy history id unreadable, skipped"),
                }
            }
        }
    }
    Ok(out)
}

/// Field-by-field read; the flag is false when any field fell back to its default.
fn entry_from_value(v: &Value) -> (HistoryEntry, bool) {
    let field = |key: &str| v.get(key).filter(|x| !x.is_null());
    let name = field("productName").and_then(Value::as_str).map(str::to_string);
    let price = field("priceMin")
        .and_then(lenient_f64)
        .filter(|p| *p >= 0.0);
    let posted = field("lastPostedTimestamp")
        .and_then(lenient_u64)
        .and_then(|t| i64::try_from(t).ok());

    let complete = name.is_some() && price.is_some() && posted.is_some();
    let entry = HistoryEntry {
        name: name.unwrap_or_default(),
        price: price.unwrap_or(0.0),
        last_posted_at: posted.unwrap_or(0),
    };
    (entry, complete)
}

fn backup_unreadable(path: &Path) {
    let bak = path.with_extension("json.bak");
    match fs::copy(path, &bak) {
        Ok(_) => warn!(backup = %bak.display(), "unreadable history copied aside"),
        Err(e) => warn!(backup = %bak.display(), error = %e, "history backup failed"),
    }
}

fn write_atomic(path: &Path, entries: &BTreeMap<u64, HistoryEntry>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_vec_pretty(entries)?;
    let tmp = path.with_extension("json.tmp");
    let mut f = fs::File::create(&tmp)?;
    f.write_all(&json)?;
    f.write_all(b"\n")?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
