//! Marketing text generation: provider abstraction + deterministic fallback.

pub mod gemini;

use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::candidate::Candidate;

pub use gemini::GeminiGenerator;

/// Generative copy for a NEW offer. May fail; callers substitute [`fallback_text`].
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, candidate: &Candidate) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

/// Text used whenever generation fails or is disabled. Depends on the name only.
pub fn fallback_text(candidate: &Candidate) -> String {
    format!("✨ Confira esta super oferta! ✨\n\n{}", candidate.name)
}

/// Always fails, so every NEW post uses the fallback.
pub struct DisabledGenerator;

#[async_trait::async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _candidate: &Candidate) -> Result<String> {
        Err(anyhow!("text generation disabled"))
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Strip markup the model tends to emit (HTML tags, markdown emphasis and headings),
/// collapse runs of blank lines and spaces, trim, cap at `max_chars`.
pub fn sanitize_marketing_text(input: &str, max_chars: usize) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    static RE_MD: OnceCell<Regex> = OnceCell::new();
    let re_md = RE_MD.get_or_init(|| Regex::new(r"(?m)(\*\*|__|```|^[ \t]*#{1,6}[ \t]+)").unwrap());

    let stripped = re_tags.replace_all(input, "");
    let stripped = re_md.replace_all(&stripped, "");

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0;
    for line in stripped.lines() {
        let l = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if l.is_empty() {
            blank_run += 1;
            if blank_run == 1 && !lines.is_empty() {
                lines.push(String::new());
            }
            continue;
        }
        blank_run = 0;
        lines.push(l);
    }
    let joined = lines.join("\n");
    let trimmed = joined.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
