//! Working memory: the in-session rolling buffer of step records.

use serde::{Deserialize, Serialize};

use axpilot_core_types::StepRecord;

use crate::config::MemoryConfig;
use crate::tokens::estimate_tokens;

const SUMMARY_OBSERVATION_CHARS: usize = 80;

/// One working-memory entry: a full record or its one-line summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkingEntry {
    Verbatim(StepRecord),
    Summary { step_number: u32, line: String },
}

impl WorkingEntry {
    pub fn step_number(&self) -> u32 {
        match self {
            WorkingEntry::Verbatim(record) => record.step_number,
            WorkingEntry::Summary { step_number, .. } => *step_number,
        }
    }

    pub fn is_verbatim(&self) -> bool {
        matches!(self, WorkingEntry::Verbatim(_))
    }

    /// One-line rendering regardless of entry state.
    pub fn summary_line(&self) -> String {
        match self {
            WorkingEntry::Verbatim(record) => summarize(record),
            WorkingEntry::Summary { line, .. } => line.clone(),
        }
    }
}

/// Collapse a step record into `"Step N: action(args) -> outcome"`.
pub fn summarize(record: &StepRecord) -> String {
    let mut line = format!(
        "Step {}: {} -> {}",
        record.step_number,
        record.args_summary,
        record.outcome_keyword()
    );
    if !record.success && !record.observation.is_empty() {
        line.push_str(": ");
        line.push_str(&truncate(&record.observation, SUMMARY_OBSERVATION_CHARS));
    }
    line
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Ordered, bounded buffer of step records with deterministic compaction.
#[derive(Debug, Default)]
pub struct WorkingMemory {
    entries: Vec<WorkingEntry>,
    compactions: u64,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StepRecord) {
        self.entries.push(WorkingEntry::Verbatim(record));
    }

    pub fn entries(&self) -> &[WorkingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn verbatim_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_verbatim()).count()
    }

    pub fn compactions(&self) -> u64 {
        self.compactions
    }

    /// Step records still held in full, oldest first.
    pub fn verbatim_records(&self) -> impl Iterator<Item = &StepRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            WorkingEntry::Verbatim(record) => Some(record),
            WorkingEntry::Summary { .. } => None,
        })
    }

    /// Whether the buffer has grown past any compaction trigger.
    pub fn needs_compaction(&self, config: &MemoryConfig) -> bool {
        if self.entries.len() >= config.compact_threshold {
            return true;
        }
        if self.verbatim_count() > config.working_cap {
            return true;
        }
        self.estimated_tokens() > config.compaction_token_threshold
    }

    /// Token estimate of the serialized buffer.
    pub fn estimated_tokens(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| match entry {
                WorkingEntry::Verbatim(record) => {
                    estimate_tokens(&record.args_summary) + estimate_tokens(&record.observation) + 8
                }
                WorkingEntry::Summary { line, .. } => estimate_tokens(line),
            })
            .sum()
    }

    /// Summarize everything but the newest `preserve_recent` records and
    /// apply the screenshot-retention policy. This is the only site that
    /// prunes screenshot bytes.
    pub fn compact(&mut self, config: &MemoryConfig) {
        let preserve = config.preserve_recent;
        let verbatim = self.verbatim_count();
        if verbatim > preserve {
            let mut to_summarize = verbatim - preserve;
            for entry in self.entries.iter_mut() {
                if to_summarize == 0 {
                    break;
                }
                if let WorkingEntry::Verbatim(record) = entry {
                    *entry = WorkingEntry::Summary {
                        step_number: record.step_number,
                        line: summarize(record),
                    };
                    to_summarize -= 1;
                }
            }
        }
        self.retain_screenshots(config.last_n_screenshots);
        self.compactions += 1;
    }

    /// Keep image bytes only on the newest `keep` records; references stay.
    fn retain_screenshots(&mut self, keep: usize) {
        let mut kept = 0usize;
        for entry in self.entries.iter_mut().rev() {
            if let WorkingEntry::Verbatim(record) = entry {
                if let Some(shot) = record.screenshot.as_mut() {
                    if shot.bytes.is_some() {
                        if kept < keep {
                            kept += 1;
                        } else {
                            shot.drop_bytes();
                        }
                    }
                }
            }
        }
    }

    /// Fold runs of summaries older than the preserved tail into one digest
    /// line. Running it twice produces the same buffer.
    pub fn consolidate(&mut self) {
        let summaries: Vec<(u32, String)> = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                WorkingEntry::Summary { step_number, line } => {
                    Some((*step_number, line.clone()))
                }
                WorkingEntry::Verbatim(_) => None,
            })
            .collect();
        if summaries.len() < 2 {
            return;
        }

        let first = summaries.first().map(|(n, _)| *n).unwrap_or(0);
        let last = summaries.last().map(|(n, _)| *n).unwrap_or(0);
        let failures = summaries
            .iter()
            .filter(|(_, line)| line.contains("-> failed"))
            .count();
        let digest = WorkingEntry::Summary {
            step_number: first,
            line: format!(
                "Steps {first}-{last}: {} ok, {failures} failed",
                summaries.len() - failures
            ),
        };

        self.entries.retain(|entry| entry.is_verbatim());
        // The digest is oldest by construction, so it leads the buffer.
        self.entries.insert(0, digest);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: u32, success: bool) -> StepRecord {
        StepRecord::new(
            step,
            "click",
            format!("click(e{step})"),
            if success { "clicked" } else { "element not found while clicking the submit button on the checkout form page" },
            success,
            10,
        )
    }

    fn config(cap: usize, preserve: usize, threshold: usize) -> MemoryConfig {
        MemoryConfig::default().compaction(cap, preserve, threshold)
    }

    #[test]
    fn test_summarize_format() {
        let line = summarize(&record(3, true));
        assert_eq!(line, "Step 3: click(e3) -> ok");

        let failed = summarize(&record(4, false));
        assert!(failed.starts_with("Step 4: click(e4) -> failed: "));
        // Observation bounded to 80 chars.
        let detail = failed.split("failed: ").nth(1).unwrap();
        assert!(detail.chars().count() <= 80);
    }

    #[test]
    fn test_compact_preserves_tail_verbatim() {
        let cfg = config(5, 2, 4);
        let mut memory = WorkingMemory::new();
        for step in 1..=5 {
            memory.push(record(step, true));
        }
        memory.compact(&cfg);

        let states: Vec<bool> = memory.entries().iter().map(|e| e.is_verbatim()).collect();
        assert_eq!(states, vec![false, false, false, true, true]);
        assert_eq!(memory.entries()[4].step_number(), 5);
    }

    #[test]
    fn test_screenshot_retention_single_policy() {
        let cfg = MemoryConfig::default().compaction(50, 10, 80);
        let mut memory = WorkingMemory::new();
        for step in 1..=3 {
            memory.push(
                StepRecord::new(step, "screenshot", "screenshot()", "captured", true, 5)
                    .with_screenshot(vec![step as u8; 16]),
            );
        }
        memory.compact(&cfg);

        let with_bytes: Vec<u32> = memory
            .verbatim_records()
            .filter(|r| r.screenshot.as_ref().is_some_and(|s| s.bytes.is_some()))
            .map(|r| r.step_number)
            .collect();
        assert_eq!(with_bytes, vec![3]);

        // References survive byte pruning.
        assert!(memory
            .verbatim_records()
            .all(|r| r.screenshot.is_some()));
    }

    #[test]
    fn test_needs_compaction_triggers() {
        let cfg = config(5, 2, 4);
        let mut memory = WorkingMemory::new();
        for step in 1..=3 {
            memory.push(record(step, true));
        }
        assert!(!memory.needs_compaction(&cfg));
        memory.push(record(4, true));
        assert!(memory.needs_compaction(&cfg));
    }

    #[test]
    fn test_consolidate_idempotent() {
        let cfg = config(5, 2, 4);
        let mut memory = WorkingMemory::new();
        for step in 1..=6 {
            memory.push(record(step, step != 2));
        }
        memory.compact(&cfg);
        memory.consolidate();
        let after_first: Vec<String> = memory.entries().iter().map(|e| e.summary_line()).collect();
        memory.consolidate();
        let after_second: Vec<String> = memory.entries().iter().map(|e| e.summary_line()).collect();
        assert_eq!(after_first, after_second);
        assert!(after_first[0].contains("1 failed"));
    }
}
