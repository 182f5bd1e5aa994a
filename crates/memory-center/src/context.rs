//! LLM-ready context assembly under a token budget.
//!
//! The reduction ladder is deterministic: halve the detailed tail, then drop
//! snippets in order of lowest relevance, then drop the earliest summaries.
//! If the prompt is still over budget it is returned as-is with
//! `budget_exceeded` set; downstream models truncate.

use serde::Serialize;

use crate::ranking::RankedResult;
use crate::tokens::estimate_tokens;
use crate::working::{WorkingEntry, WorkingMemory};

/// Result of one budget-enforced context build.
#[derive(Debug, Clone, Serialize)]
pub struct ContextReport {
    pub text: String,
    pub budget_exceeded: bool,
    pub detailed_steps_used: usize,
    pub snippets_included: usize,
    pub summaries_dropped: usize,
    pub estimated_tokens: usize,
}

/// Assemble working-memory history plus ranked snippets within the budget.
pub fn build(
    working: &WorkingMemory,
    mut snippets: Vec<RankedResult>,
    detailed_steps: usize,
    token_budget: usize,
) -> ContextReport {
    // Most relevant last so dropping from the front removes the weakest.
    snippets.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut detailed = detailed_steps;
    let mut summaries_dropped = 0usize;

    let mut text = render(working, detailed, &snippets, summaries_dropped);
    if estimate_tokens(&text) > token_budget {
        detailed /= 2;
        text = render(working, detailed, &snippets, summaries_dropped);
    }

    while estimate_tokens(&text) > token_budget && !snippets.is_empty() {
        snippets.remove(0);
        text = render(working, detailed, &snippets, summaries_dropped);
    }

    let max_droppable = summary_count(working, detailed);
    while estimate_tokens(&text) > token_budget && summaries_dropped < max_droppable {
        summaries_dropped += 1;
        text = render(working, detailed, &snippets, summaries_dropped);
    }

    let estimated = estimate_tokens(&text);
    ContextReport {
        budget_exceeded: estimated > token_budget,
        detailed_steps_used: detailed,
        snippets_included: snippets.len(),
        summaries_dropped,
        estimated_tokens: estimated,
        text,
    }
}

/// Entries older than the detailed tail, i.e. what the ladder may drop.
fn summary_count(working: &WorkingMemory, detailed: usize) -> usize {
    working.len().saturating_sub(detailed)
}

fn render(
    working: &WorkingMemory,
    detailed: usize,
    snippets: &[RankedResult],
    skip_oldest: usize,
) -> String {
    let mut out = String::new();
    let entries = working.entries();
    let tail_start = entries.len().saturating_sub(detailed);

    if tail_start > skip_oldest {
        out.push_str("## Earlier steps\n");
        for entry in entries[..tail_start].iter().skip(skip_oldest) {
            out.push_str(&entry.summary_line());
            out.push('\n');
        }
    }

    if tail_start < entries.len() {
        out.push_str("\n## Recent steps\n");
        for entry in &entries[tail_start..] {
            match entry {
                WorkingEntry::Verbatim(record) => {
                    out.push_str(&format!(
                        "Step {}: {}\n  outcome: {} - {} ({}ms)\n",
                        record.step_number,
                        record.args_summary,
                        record.outcome_keyword(),
                        record.observation,
                        record.duration_ms
                    ));
                }
                WorkingEntry::Summary { .. } => {
                    out.push_str(&entry.summary_line());
                    out.push('\n');
                }
            }
        }
    }

    if !snippets.is_empty() {
        out.push_str("\n## Relevant memory\n");
        // Highest relevance first in the rendered prompt.
        for snippet in snippets.iter().rev() {
            out.push_str(&snippet.snippet);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::MemoryTier;
    use axpilot_core_types::StepRecord;

    fn working_with(steps: u32) -> WorkingMemory {
        let mut working = WorkingMemory::new();
        for step in 1..=steps {
            working.push(StepRecord::new(
                step,
                "click",
                format!("click(e{step})"),
                "clicked the primary call to action button on the page",
                true,
                12,
            ));
        }
        working
    }

    fn snippet(score: f64, text: &str) -> RankedResult {
        RankedResult {
            tier: MemoryTier::Episodic,
            score,
            snippet: text.to_string(),
        }
    }

    #[test]
    fn test_tail_rendered_in_full() {
        let working = working_with(6);
        let report = build(&working, Vec::new(), 2, 100_000);
        assert!(!report.budget_exceeded);
        assert!(report.text.contains("Step 1: click(e1) -> ok"));
        assert!(report.text.contains("Step 6: click(e6)\n  outcome: ok"));
        assert_eq!(report.detailed_steps_used, 2);
    }

    #[test]
    fn test_ladder_halves_detail_first() {
        let working = working_with(20);
        let generous = build(&working, Vec::new(), 10, 100_000);
        let tight = build(&working, Vec::new(), 10, generous.estimated_tokens - 40);
        assert_eq!(tight.detailed_steps_used, 5);
    }

    #[test]
    fn test_ladder_drops_lowest_relevance_snippets() {
        let working = working_with(4);
        let snippets = vec![
            snippet(0.9, "[episode] highly relevant past run"),
            snippet(0.1, "[episode] barely related run with a long description that costs tokens"),
        ];
        let baseline = build(&working, snippets.clone(), 2, 100_000);
        assert_eq!(baseline.snippets_included, 2);

        // Probe the post-halving size so the budget forces exactly one
        // snippet drop after the detail reduction.
        let probe = build(&working, snippets.clone(), 1, 100_000);
        let squeezed = build(
            &working,
            snippets,
            2,
            probe.estimated_tokens.saturating_sub(5),
        );
        assert_eq!(squeezed.snippets_included, 1);
        assert!(squeezed.text.contains("highly relevant"));
        assert!(!squeezed.text.contains("barely related"));
    }

    #[test]
    fn test_budget_exceeded_flag_when_irreducible() {
        let working = working_with(3);
        let report = build(&working, Vec::new(), 1, 1);
        assert!(report.budget_exceeded);
        assert!(!report.text.is_empty());
    }
}
