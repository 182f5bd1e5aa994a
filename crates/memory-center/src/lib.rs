//! Four-tier memory for the agent: working steps, episodes, semantic
//! patterns and skills, with deterministic compaction and a token-budgeted
//! context builder.
//!
//! All operations are infallible in memory. Optional persistence (episode
//! log, skill store) is fire-and-forget; failures are logged and the
//! in-memory state stays authoritative.

pub mod config;
pub mod context;
pub mod episodic;
pub mod ranking;
pub mod semantic;
pub mod skills;
pub mod tokens;
pub mod working;

use std::path::Path;

use serde::Serialize;

use axpilot_core_types::StepRecord;

pub use config::MemoryConfig;
pub use context::ContextReport;
pub use episodic::{Episode, EpisodeStore};
pub use ranking::{MemoryTier, RankedResult};
pub use semantic::{SemanticEntry, SemanticStore};
pub use skills::{Skill, SkillStore};
pub use working::{WorkingEntry, WorkingMemory};

/// Counter view over one manager's lifetime.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MemoryStats {
    pub steps_recorded: u64,
    pub compactions: u64,
    pub episodes_saved: u64,
    pub budget_exceeded: u64,
}

/// The single memory manager: exclusive owner of the working buffer and the
/// only writer of episodes and skills for the current run.
pub struct MemoryManager {
    config: MemoryConfig,
    working: WorkingMemory,
    episodes: EpisodeStore,
    semantic: SemanticStore,
    skills: SkillStore,
    steps_recorded: u64,
    budget_exceeded: u64,
}

impl MemoryManager {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            working: WorkingMemory::new(),
            episodes: EpisodeStore::new(),
            semantic: SemanticStore::new(),
            skills: SkillStore::new(),
            steps_recorded: 0,
            budget_exceeded: 0,
        }
    }

    /// Enable persistence under `dir` (episode log + skill store).
    pub fn with_persistence(config: MemoryConfig, dir: &Path) -> Self {
        Self {
            episodes: EpisodeStore::with_log(dir.join("episodes.jsonl")),
            skills: SkillStore::with_store(dir.join("skills.json")),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Append a step record; compacts when any trigger fires.
    pub fn add_step(&mut self, record: StepRecord) {
        self.working.push(record);
        self.steps_recorded += 1;
        if self.working.needs_compaction(&self.config) {
            self.working.compact(&self.config);
        }
    }

    /// Plain history context: tail `detailed_steps` in full, earlier steps
    /// as one-line summaries, budget-enforced.
    pub fn get_context(&mut self, detailed_steps: usize) -> String {
        self.build_context(None, detailed_steps).text
    }

    /// History plus relevance-ranked episodic/semantic/skill snippets.
    pub fn get_enriched_context(&mut self, query: &str, detailed_steps: usize) -> String {
        self.build_context(Some(query), detailed_steps).text
    }

    /// Budget-enforced context build. This is the pre-LLM entry point: the
    /// projected prompt size is inspected (and compaction run) on every
    /// call, not only when records are appended.
    pub fn build_context(&mut self, query: Option<&str>, detailed_steps: usize) -> ContextReport {
        if self.working.needs_compaction(&self.config) {
            self.working.compact(&self.config);
        }

        let snippets = match query {
            Some(query) => self.top_snippets(query),
            None => Vec::new(),
        };
        let report = context::build(
            &self.working,
            snippets,
            detailed_steps,
            self.config.token_budget,
        );
        if report.budget_exceeded {
            self.budget_exceeded += 1;
        }
        report
    }

    /// Top `snippets_per_tier` candidates from each persistent tier.
    fn top_snippets(&self, query: &str) -> Vec<RankedResult> {
        let per_tier = self.config.snippets_per_tier;
        let mut out = Vec::new();
        for tier in [MemoryTier::Episodic, MemoryTier::Semantic, MemoryTier::Skill] {
            let mut candidates: Vec<RankedResult> = self.rank_tier(tier, query);
            candidates.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates.truncate(per_tier);
            out.extend(candidates);
        }
        out
    }

    fn rank_tier(&self, tier: MemoryTier, query: &str) -> Vec<RankedResult> {
        match tier {
            MemoryTier::Episodic => {
                let len = self.episodes.len();
                self.episodes
                    .all()
                    .iter()
                    .enumerate()
                    .map(|(index, episode)| RankedResult {
                        tier,
                        score: ranking::score(
                            query,
                            &format!("{} {}", episode.task_prompt, episode.outcome),
                            ranking::recency_from_index(index, len),
                            if episode.success { 1.0 } else { 0.0 },
                        ),
                        snippet: episode.snippet(),
                    })
                    .collect()
            }
            MemoryTier::Semantic => {
                let len = self.semantic.all().len();
                self.semantic
                    .all()
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| RankedResult {
                        tier,
                        score: ranking::score(
                            query,
                            &entry.pattern,
                            ranking::recency_from_index(index, len),
                            entry.confidence,
                        ),
                        snippet: entry.snippet(),
                    })
                    .collect()
            }
            MemoryTier::Skill => {
                let skills = self.skills.all();
                let len = skills.len();
                skills
                    .into_iter()
                    .enumerate()
                    .map(|(index, skill)| RankedResult {
                        tier,
                        score: ranking::score(
                            query,
                            &format!("{} {}", skill.name, skill.description),
                            ranking::recency_from_index(index, len),
                            skill.success_rate,
                        ),
                        snippet: skill.snippet(),
                    })
                    .collect()
            }
        }
    }

    /// Top results across the three persistent tiers.
    pub fn search(&self, query: &str, limit: usize) -> Vec<RankedResult> {
        let mut results: Vec<RankedResult> =
            [MemoryTier::Episodic, MemoryTier::Semantic, MemoryTier::Skill]
                .into_iter()
                .flat_map(|tier| self.rank_tier(tier, query))
                .collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);
        results
    }

    /// Record one episode; called exactly once per run on termination.
    pub fn save_episode(
        &mut self,
        task_prompt: &str,
        outcome: &str,
        success: bool,
        duration_ms: u64,
        tools_used: Vec<String>,
        step_count: u32,
    ) {
        self.episodes.record(Episode::new(
            task_prompt,
            outcome,
            success,
            duration_ms,
            tools_used,
            step_count,
        ));
    }

    /// Idempotent maintenance: folds older working summaries into a digest.
    pub fn consolidate(&mut self) {
        self.working.consolidate();
    }

    pub fn add_skill(&mut self, skill: Skill) {
        self.skills.upsert(skill);
    }

    pub fn record_skill_execution(&mut self, name: &str, success: bool) {
        self.skills.record_execution(name, success);
    }

    pub fn add_semantic(&mut self, entry: SemanticEntry) {
        self.semantic.insert(entry);
    }

    pub fn working(&self) -> &WorkingMemory {
        &self.working
    }

    pub fn episodes(&self) -> &EpisodeStore {
        &self.episodes
    }

    pub fn skills(&self) -> &SkillStore {
        &self.skills
    }

    /// Drop session-scoped state after the episode is recorded.
    pub fn end_session(&mut self) {
        self.working.clear();
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            steps_recorded: self.steps_recorded,
            compactions: self.working.compactions(),
            episodes_saved: self.episodes.len() as u64,
            budget_exceeded: self.budget_exceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: u32) -> StepRecord {
        StepRecord::new(step, "click", format!("click(e{step})"), "clicked", true, 5)
    }

    #[test]
    fn test_enriched_context_includes_relevant_skill() {
        let mut manager = MemoryManager::new(MemoryConfig::default());
        manager.add_skill(Skill::new(
            "site-search",
            "type a query into the search box and press Enter",
            vec!["type".into(), "press".into()],
        ));
        manager.add_step(record(1));

        let context = manager.get_enriched_context("search the site for rust", 5);
        assert!(context.contains("[skill] site-search"));
    }

    #[test]
    fn test_search_ranks_matching_episode_first() {
        let mut manager = MemoryManager::new(MemoryConfig::default());
        manager.save_episode("buy socks", "checkout complete", true, 100, vec![], 4);
        manager.save_episode(
            "search hacker news for AI posts",
            "found 3 posts",
            true,
            100,
            vec![],
            5,
        );

        let results = manager.search("hacker news AI", 2);
        assert!(!results.is_empty());
        assert!(results[0].snippet.contains("hacker news"));
    }

    #[test]
    fn test_stats_track_budget_exceeded() {
        let config = MemoryConfig::default().token_budget(1);
        let mut manager = MemoryManager::new(config);
        for step in 1..=3 {
            manager.add_step(record(step));
        }
        let report = manager.build_context(None, 2);
        assert!(report.budget_exceeded);
        assert_eq!(manager.stats().budget_exceeded, 1);
    }

    #[test]
    fn test_end_session_drops_working_only() {
        let mut manager = MemoryManager::new(MemoryConfig::default());
        manager.add_step(record(1));
        manager.save_episode("goal", "done", true, 10, vec![], 1);
        manager.end_session();
        assert!(manager.working().is_empty());
        assert_eq!(manager.episodes().len(), 1);
    }
}
