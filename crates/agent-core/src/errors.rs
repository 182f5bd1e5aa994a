//! Error types for planning and LLM access.

use thiserror::Error;

/// Errors from an LLM client implementation.
#[derive(Debug, Error, Clone)]
pub enum LlmError {
    /// Transport or service-level failure.
    #[error("llm request failed: {0}")]
    Request(String),

    /// The completion call exceeded its deadline.
    #[error("llm request timed out after {0}ms")]
    Timeout(u64),

    /// The service answered with an empty completion.
    #[error("llm returned an empty response")]
    Empty,
}

/// Errors from a planner deciding the next action.
#[derive(Debug, Error, Clone)]
pub enum PlanError {
    /// The model's output was not a valid decision object. Absorbed by the
    /// step loop up to its consecutive-parse-error limit.
    #[error("llm_parse_error: {0}")]
    Parse(String),

    /// The completion call itself failed; counted like a permanent step
    /// failure.
    #[error("llm_service_error: {0}")]
    Service(String),
}

impl From<LlmError> for PlanError {
    fn from(err: LlmError) -> Self {
        PlanError::Service(err.to_string())
    }
}
