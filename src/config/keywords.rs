// src/config/keywords.rs
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load the keyword list: one search term per line.
pub fn load_keywords_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading keywords from {}", path.display()))?;
    Ok(parse_keywords(&content))
}

/// Blank lines and `#` comments are skipped; entries are trimmed and deduplicated
/// case-insensitively, first occurrence wins.
pub fn parse_keywords(s: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter(|l| seen.insert(l.to_lowercase()))
        .map(str::to_string)
        .collect()
}
