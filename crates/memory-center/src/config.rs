//! Memory manager configuration.

use serde::{Deserialize, Serialize};

/// Capacities, compaction triggers and the prompt token budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Max step records kept verbatim before compaction is forced.
    pub working_cap: usize,

    /// Tail of step records preserved verbatim through compaction.
    pub preserve_recent: usize,

    /// Total working entries (verbatim + summaries) that trigger compaction.
    pub compact_threshold: usize,

    /// Serialized working-memory token estimate that triggers compaction.
    pub compaction_token_threshold: usize,

    /// The single screenshot-retention policy: image payloads kept on at
    /// most this many recent step records.
    pub last_n_screenshots: usize,

    /// Prompt size ceiling enforced before every LLM call.
    pub token_budget: usize,

    /// Episodic/semantic/skill snippets per tier in enriched context.
    pub snippets_per_tier: usize,

    /// Tail steps rendered in full when building context.
    pub detailed_steps: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            working_cap: 50,
            preserve_recent: 10,
            compact_threshold: 80,
            compaction_token_threshold: 6_000,
            last_n_screenshots: 1,
            token_budget: 8_000,
            snippets_per_tier: 3,
            detailed_steps: 10,
        }
    }
}

impl MemoryConfig {
    /// Builder: set the token budget.
    pub fn token_budget(mut self, budget: usize) -> Self {
        self.token_budget = budget;
        self
    }

    /// Builder: set compaction shape (cap, preserved tail, trigger).
    pub fn compaction(mut self, cap: usize, preserve: usize, threshold: usize) -> Self {
        self.working_cap = cap;
        self.preserve_recent = preserve;
        self.compact_threshold = threshold;
        self
    }
}
