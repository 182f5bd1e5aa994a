//! Terminal result of one agent run.

use serde::{Deserialize, Serialize};

use crate::metrics::AgentMetrics;

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    Done,
    StepBudget,
    FatalError,
    Cancelled,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::Done => "done",
            ExitReason::StepBudget => "step_budget",
            ExitReason::FatalError => "fatal_error",
            ExitReason::Cancelled => "cancelled",
        }
    }

    /// Process exit code for the CLI surface.
    pub fn exit_code(self) -> i32 {
        match self {
            ExitReason::Done => 0,
            ExitReason::FatalError => 1,
            ExitReason::StepBudget => 2,
            ExitReason::Cancelled => 130,
        }
    }
}

/// Always returned by `Agent::run`; no error escapes the agent API.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResult {
    pub success: bool,
    pub steps: u32,
    pub duration_ms: u64,
    pub final_observation: String,
    pub reason: ExitReason,
    pub metrics: AgentMetrics,
}

impl AgentResult {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitReason::Done.exit_code(), 0);
        assert_eq!(ExitReason::FatalError.exit_code(), 1);
        assert_eq!(ExitReason::StepBudget.exit_code(), 2);
        assert_eq!(ExitReason::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&ExitReason::StepBudget).unwrap(),
            "\"step_budget\""
        );
    }
}
