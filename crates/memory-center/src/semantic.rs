//! Semantic memory: generalized patterns distilled from episodes.
//!
//! The core only reads these entries when building context; an offline
//! consolidator produces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One generalization with its supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticEntry {
    pub pattern: String,
    pub evidence_count: u32,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
}

impl SemanticEntry {
    pub fn new(pattern: impl Into<String>, evidence_count: u32, confidence: f64) -> Self {
        Self {
            pattern: pattern.into(),
            evidence_count,
            confidence: confidence.clamp(0.0, 1.0),
            updated_at: Utc::now(),
        }
    }

    pub fn snippet(&self) -> String {
        format!(
            "[pattern] {} (confidence {:.2}, {} observations)",
            self.pattern, self.confidence, self.evidence_count
        )
    }
}

/// Read-mostly store of semantic entries.
#[derive(Debug, Default)]
pub struct SemanticStore {
    entries: Vec<SemanticEntry>,
}

impl SemanticStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: SemanticEntry) {
        self.entries.push(entry);
    }

    pub fn all(&self) -> &[SemanticEntry] {
        &self.entries
    }

    /// Drop entries below a confidence floor; used by offline maintenance.
    pub fn prune_below(&mut self, confidence: f64) {
        self.entries.retain(|entry| entry.confidence >= confidence);
    }
}
