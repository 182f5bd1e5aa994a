//! The agent: one goal at a time through snapshot -> plan -> act -> record.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use action_executor::ActionExecutor;
use axpilot_core_types::{Action, BrowserDriver, Classification, StepRecord};
use memory_center::MemoryManager;
use snapshot_engine::{Snapshot, SnapshotEngine, SnapshotView};

use crate::config::AgentConfig;
use crate::errors::PlanError;
use crate::llm::LlmClient;
use crate::metrics::AgentMetrics;
use crate::planner::{LlmPlanner, Planner};
use crate::result::{AgentResult, ExitReason};

/// A single-goal browser agent over injected driver and planner ports.
///
/// All state lives inside the agent value; tests construct isolated agents.
pub struct Agent {
    engine: Arc<SnapshotEngine>,
    executor: ActionExecutor,
    memory: MemoryManager,
    planner: Arc<dyn Planner>,
    config: AgentConfig,
    cancel: CancellationToken,
    steps_taken: u32,
    llm_calls: u64,
    llm_parse_errors: u64,
    replans: u64,
}

impl Agent {
    /// Standard construction: driver + LLM client + config.
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        llm: Arc<dyn LlmClient>,
        config: AgentConfig,
    ) -> Self {
        let planner = Arc::new(LlmPlanner::new(llm, config.llm_timeout));
        Self::with_planner(driver, planner, config)
    }

    /// Construction with an explicit planner (rule-based runs, tests).
    pub fn with_planner(
        driver: Arc<dyn BrowserDriver>,
        planner: Arc<dyn Planner>,
        config: AgentConfig,
    ) -> Self {
        let engine = Arc::new(SnapshotEngine::new(
            Arc::clone(&driver),
            config.snapshot.clone(),
        ));
        let cancel = CancellationToken::new();
        let executor = ActionExecutor::new(driver, Arc::clone(&engine), config.executor.clone())
            .with_cancellation(cancel.clone());
        Self {
            engine,
            executor,
            memory: MemoryManager::new(config.memory.clone()),
            planner,
            config,
            cancel,
            steps_taken: 0,
            llm_calls: 0,
            llm_parse_errors: 0,
            replans: 0,
        }
    }

    /// Swap in a pre-built memory manager (e.g. with persistence attached).
    pub fn with_memory(mut self, memory: MemoryManager) -> Self {
        self.memory = memory;
        self
    }

    /// Request cancellation; observed at the next iteration boundary and in
    /// executor backoff sleeps. In-flight driver and LLM calls finish first.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> AgentMetrics {
        AgentMetrics {
            steps_taken: self.steps_taken,
            llm_calls: self.llm_calls,
            llm_parse_errors: self.llm_parse_errors,
            replans: self.replans,
            snapshot: self.engine.metrics(),
            executor: self.executor.metrics(),
            memory: self.memory.stats(),
        }
    }

    /// Drive `goal` to completion. Always returns a result; exactly one
    /// episode is recorded for every run that executed at least one step.
    pub async fn run(&mut self, goal: &str) -> AgentResult {
        let started = Instant::now();
        let goal = goal.trim().to_string();
        self.steps_taken = 0;

        if goal.is_empty() || goal.chars().count() > self.config.max_goal_len {
            return self.finish(
                &goal,
                started,
                false,
                ExitReason::FatalError,
                "invalid goal: empty or over length limit".to_string(),
                Vec::new(),
            );
        }
        info!(%goal, max_steps = self.config.max_steps, "agent run started");

        let mut consecutive_parse_errors = 0u32;
        let mut consecutive_permanent = 0u32;
        let mut pending_replan = false;
        let mut final_observation = String::new();
        let mut tools_used: Vec<String> = Vec::new();
        let mut success = false;
        let mut reason = ExitReason::StepBudget;

        while self.steps_taken < self.config.max_steps {
            if self.cancel.is_cancelled() {
                reason = ExitReason::Cancelled;
                final_observation = "cancelled".to_string();
                break;
            }
            // Persistent permanent failures end the run before another step
            // starts; a failure on the final budgeted step exits as
            // step_budget instead.
            if consecutive_permanent >= self.config.max_permanent_failures {
                reason = ExitReason::FatalError;
                break;
            }
            self.steps_taken += 1;
            let step = self.steps_taken;
            let step_started = Instant::now();

            // Observe. A replan after a permanent failure forces freshness.
            let force = pending_replan;
            if pending_replan {
                self.replans += 1;
                pending_replan = false;
            }
            let observed = self.engine.get(force, false).await;
            let snapshot = match observed {
                Ok(SnapshotView::Full(snapshot)) => snapshot,
                Ok(SnapshotView::Diff(_)) => {
                    warn!("unexpected diff view outside diff mode");
                    self.record_step(step, "snapshot", "snapshot()", "unexpected diff", false, step_started);
                    continue;
                }
                Err(err) if err.is_fatal() => {
                    final_observation = err.to_string();
                    self.record_step(step, "snapshot", "snapshot()", &final_observation, false, step_started);
                    reason = ExitReason::FatalError;
                    break;
                }
                Err(err) => {
                    // Recoverable (timeout): record and try again next step.
                    self.record_step(step, "snapshot", "snapshot()", &err.to_string(), false, step_started);
                    continue;
                }
            };

            // Think. The context build enforces the token budget before
            // every planner call.
            let context = self
                .memory
                .build_context(Some(&goal), self.config.memory.detailed_steps);
            self.llm_calls += 1;
            let decision = self.planner.decide(&goal, &context.text, &snapshot).await;

            let decision = match decision {
                Ok(decision) => {
                    consecutive_parse_errors = 0;
                    decision
                }
                Err(PlanError::Parse(detail)) => {
                    consecutive_parse_errors += 1;
                    self.llm_parse_errors += 1;
                    debug!(%detail, consecutive_parse_errors, "planner output unparsable");
                    self.record_step(step, "plan", "plan()", "llm_parse_error", false, step_started);
                    if consecutive_parse_errors >= self.config.max_parse_errors {
                        final_observation = "llm_parse_error".to_string();
                        reason = ExitReason::FatalError;
                        break;
                    }
                    continue;
                }
                Err(PlanError::Service(detail)) => {
                    // Counted like a permanent failure for fatal-exit
                    // purposes.
                    consecutive_parse_errors = 0;
                    consecutive_permanent += 1;
                    warn!(%detail, "llm service failure");
                    self.record_step(step, "plan", "plan()", &detail, false, step_started);
                    final_observation = detail;
                    continue;
                }
            };

            if decision.done {
                let message = decision.final_message();
                self.record_step(step, "done", "done()", &message, true, step_started);
                final_observation = message;
                success = true;
                reason = ExitReason::Done;
                break;
            }

            // Act.
            let action = match Action::parse(&decision.action, &decision.args) {
                Ok(action) => action,
                Err(err) => {
                    consecutive_permanent += 1;
                    let observation = match err {
                        axpilot_core_types::ActionParseError::UnknownAction(_) => {
                            format!("unknown_action: {}", decision.action)
                        }
                        other => other.to_string(),
                    };
                    self.record_step(
                        step,
                        &decision.action,
                        &format!("{}(?)", decision.action),
                        &observation,
                        false,
                        step_started,
                    );
                    final_observation = observation;
                    pending_replan = true;
                    continue;
                }
            };

            if !tools_used.iter().any(|t| t == action.name()) {
                tools_used.push(action.name().to_string());
            }

            let outcome = self.executor.apply(&action).await;
            final_observation = outcome.observation.clone();

            let mut record = StepRecord::new(
                step,
                action.name(),
                action.summary(),
                outcome.observation.clone(),
                outcome.success,
                step_started.elapsed().as_millis() as u64,
            );
            if let Some(bytes) = outcome.screenshot {
                record = record.with_screenshot(bytes);
            }
            self.memory.add_step(record);

            if outcome.success {
                consecutive_permanent = 0;
            } else if outcome.classification == Classification::Permanent {
                consecutive_permanent += 1;
                // One replanning step on a fresh snapshot follows each
                // permanent failure until the consecutive limit trips.
                pending_replan = true;
            }
        }

        if final_observation.is_empty() {
            final_observation = "step budget exhausted".to_string();
        }
        self.finish(&goal, started, success, reason, final_observation, tools_used)
    }

    fn record_step(
        &mut self,
        step: u32,
        action: &str,
        args_summary: &str,
        observation: &str,
        success: bool,
        started: Instant,
    ) {
        self.memory.add_step(StepRecord::new(
            step,
            action,
            args_summary,
            observation,
            success,
            started.elapsed().as_millis() as u64,
        ));
    }

    fn finish(
        &mut self,
        goal: &str,
        started: Instant,
        success: bool,
        reason: ExitReason,
        final_observation: String,
        tools_used: Vec<String>,
    ) -> AgentResult {
        let duration_ms = started.elapsed().as_millis() as u64;
        if self.steps_taken > 0 {
            self.memory.save_episode(
                goal,
                &final_observation,
                success,
                duration_ms,
                tools_used,
                self.steps_taken,
            );
        }
        self.memory.end_session();
        info!(
            reason = reason.as_str(),
            steps = self.steps_taken,
            success,
            "agent run finished"
        );
        AgentResult {
            success,
            steps: self.steps_taken,
            duration_ms,
            final_observation,
            reason,
            metrics: self.metrics(),
        }
    }

    /// Shared access for tests and embedding callers.
    pub fn engine(&self) -> &Arc<SnapshotEngine> {
        &self.engine
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    /// Current page view outside the loop (e.g. CLI inspection).
    pub async fn peek_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.engine.get(false, false).await.ok()?.into_full()
    }
}
