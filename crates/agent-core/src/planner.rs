//! Planner seam: LLM-backed and deterministic rule-based implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::time::timeout;
use tracing::debug;

use snapshot_engine::Snapshot;

use crate::errors::PlanError;
use crate::llm::{parse_decision, ChatMessage, Decision, LlmClient};
use crate::prompt;

/// Decides the next action from the goal, memory context and current page.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn decide(
        &self,
        goal: &str,
        context: &str,
        snapshot: &Snapshot,
    ) -> Result<Decision, PlanError>;
}

/// LLM-backed planner: prompt, complete, parse.
pub struct LlmPlanner {
    client: Arc<dyn LlmClient>,
    llm_timeout: Duration,
}

impl LlmPlanner {
    pub fn new(client: Arc<dyn LlmClient>, llm_timeout: Duration) -> Self {
        Self {
            client,
            llm_timeout,
        }
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn decide(
        &self,
        goal: &str,
        context: &str,
        snapshot: &Snapshot,
    ) -> Result<Decision, PlanError> {
        let messages = vec![
            ChatMessage::system(prompt::SYSTEM_PROMPT),
            ChatMessage::user(prompt::format_user_message(goal, context, snapshot)),
        ];

        let raw = match timeout(self.llm_timeout, self.client.complete(&messages)).await {
            Ok(result) => result.map_err(PlanError::from)?,
            Err(_) => {
                return Err(PlanError::Service(format!(
                    "llm completion timed out after {}ms",
                    self.llm_timeout.as_millis()
                )))
            }
        };

        debug!(chars = raw.len(), "llm completion received");
        parse_decision(&raw).map_err(PlanError::Parse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FallbackPhase {
    Init,
    Typed,
    Submitted,
}

/// Determinism escape hatch for `--no-llm` runs and tests.
///
/// Clicks nothing fancy: finds the first searchbox (or textbox), types the
/// goal into it, presses Enter, then reports done. Never parse-errors.
pub struct FallbackPlanner {
    phase: Mutex<FallbackPhase>,
}

impl Default for FallbackPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackPlanner {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(FallbackPhase::Init),
        }
    }

    fn search_input<'a>(snapshot: &'a Snapshot) -> Option<&'a axpilot_core_types::ElementRecord> {
        snapshot
            .by_role("searchbox")
            .into_iter()
            .next()
            .or_else(|| snapshot.by_role("textbox").into_iter().next())
            .or_else(|| snapshot.by_role("combobox").into_iter().next())
    }
}

#[async_trait]
impl Planner for FallbackPlanner {
    async fn decide(
        &self,
        goal: &str,
        _context: &str,
        snapshot: &Snapshot,
    ) -> Result<Decision, PlanError> {
        let mut phase = self.phase.lock();
        let decision = match *phase {
            FallbackPhase::Init => match Self::search_input(snapshot) {
                Some(input) => {
                    *phase = FallbackPhase::Typed;
                    Decision {
                        action: "type".to_string(),
                        args: json!({"ref": input.ref_id, "text": goal, "clear": true}),
                        rationale: "type the goal into the first search input".to_string(),
                        done: false,
                    }
                }
                None => Decision {
                    action: "done".to_string(),
                    args: json!({"final_message": "no valid refs to act on: page has no search input"}),
                    rationale: "nothing to interact with".to_string(),
                    done: true,
                },
            },
            FallbackPhase::Typed => {
                *phase = FallbackPhase::Submitted;
                Decision {
                    action: "press".to_string(),
                    args: json!({"key": "Enter"}),
                    rationale: "submit the typed query".to_string(),
                    done: false,
                }
            }
            FallbackPhase::Submitted => Decision {
                action: "done".to_string(),
                args: json!({"final_message": format!("submitted search for: {goal}")}),
                rationale: "query typed and submitted".to_string(),
                done: true,
            },
        };
        Ok(decision)
    }
}
