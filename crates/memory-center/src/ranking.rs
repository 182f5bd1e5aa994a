//! Relevance ranking across the persistent memory tiers.
//!
//! Score: `0.4 * recency + 0.4 * lexical_overlap + 0.2 * utility`, where
//! utility is the skill success rate, episode success, or pattern confidence.

use std::collections::HashSet;

use serde::Serialize;

/// Which tier a ranked result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    Episodic,
    Semantic,
    Skill,
}

/// One scored retrieval candidate.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    pub tier: MemoryTier,
    pub score: f64,
    pub snippet: String,
}

/// Blend the three signals into one relevance score.
pub fn score(query: &str, text: &str, recency: f64, utility: f64) -> f64 {
    0.4 * recency.clamp(0.0, 1.0)
        + 0.4 * lexical_overlap(query, text)
        + 0.2 * utility.clamp(0.0, 1.0)
}

/// Jaccard similarity over lowercase word sets.
pub fn lexical_overlap(a: &str, b: &str) -> f64 {
    let words_a = word_set(a);
    let words_b = word_set(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count() as f64;
    let union = words_a.union(&words_b).count() as f64;
    intersection / union
}

/// Position-based recency: newest item scores 1.0, oldest approaches 0.
pub fn recency_from_index(index: usize, len: usize) -> f64 {
    if len == 0 {
        return 0.0;
    }
    (index + 1) as f64 / len as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
