//! Near-duplicate detection for product names.
//!
//! Names are normalized (lowercase, punctuation to spaces, stopwords removed,
//! whitespace collapsed), then tokens are sorted so word order does not matter.
//! Similarity is the Indel ratio `2·LCS / (|a| + |b|)` on the sorted forms
//! (`rapidfuzz::fuzz::ratio`), scaled to 0..=100.
//!
//! Matching is a linear scan over all known names (no index). That is fine for the
//! few thousand entries a posting history accumulates, not beyond.

use std::collections::HashSet;

use rapidfuzz::fuzz;

/// Generic marketing/connective words that carry no product identity.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "original", "premium", "oferta", "promocao", "promoção", "novo", "nova", "lançamento",
    "lancamento", "kit", "super", "top", "melhor", "qualidade", "envio", "imediato",
    "frete", "gratis", "grátis", "barato", "de", "da", "do", "das", "dos", "para", "pra",
    "com", "sem", "e", "o", "a", "os", "as", "em", "the", "with", "for", "and", "new",
];

/// Normalizer configured with a stoplist.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    stopwords: HashSet<String>,
    threshold: u8,
}

impl NameMatcher {
    pub fn new<I, S>(stopwords: I, threshold: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            threshold: threshold.min(100),
        }
    }

    pub fn with_default_stopwords(threshold: u8) -> Self {
        Self::new(DEFAULT_STOPWORDS.iter().copied(), threshold)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Lowercase, drop punctuation and stopwords, collapse whitespace.
    pub fn normalize(&self, name: &str) -> String {
        name.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty() && !self.stopwords.contains(*t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Token-order-insensitive similarity in 0..=100.
    pub fn similarity(&self, a: &str, b: &str) -> u8 {
        token_sort_ratio(&self.normalize(a), &self.normalize(b))
    }

    /// `true` on the first known name at or above the threshold.
    pub fn is_duplicate<S: AsRef<str>>(&self, candidate_name: &str, known_names: &[S]) -> bool {
        self.find_duplicate(candidate_name, known_names).is_some()
    }

    /// Like `is_duplicate`, returning the matching name and its similarity.
    pub fn find_duplicate<'k, S: AsRef<str>>(
        &self,
        candidate_name: &str,
        known_names: &'k [S],
    ) -> Option<(&'k str, u8)> {
        let norm = self.normalize(candidate_name);
        known_names.iter().find_map(|known| {
            let known = known.as_ref();
            let sim = if known == candidate_name {
                100
            } else {
                token_sort_ratio(&norm, &self.normalize(known))
            };
            (sim >= self.threshold).then_some((known, sim))
        })
    }
}

/// Free-function form of [`NameMatcher::is_duplicate`] using the default stoplist.
pub fn is_duplicate<S: AsRef<str>>(candidate_name: &str, known_names: &[S], threshold: u8) -> bool {
    NameMatcher::with_default_stopwords(threshold).is_duplicate(candidate_name, known_names)
}

/// Sort whitespace tokens, rejoin, compare. Inputs are expected normalized.
fn token_sort_ratio(a: &str, b: &str) -> u8 {
    // Names made only of stopwords carry no identity.
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a == b {
        return 100;
    }
    let sa = sorted_tokens(a);
    let sb = sorted_tokens(b);
    let sim = fuzz::ratio(sa.chars(), sb.chars());
    (sim * 100.0).round().clamp(0.0, 100.0) as u8
}

fn sorted_tokens(s: &str) -> String {
    let mut toks: Vec<&str> = s.split_whitespace().collect();
    toks.sort_unstable();
    toks.join(" ")
}
