//! Agent step loop: snapshot, plan, act, record.
//!
//! Wires the snapshot engine, action executor and memory manager behind a
//! single [`Agent`] that drives one goal at a time to a terminal
//! [`AgentResult`]. The LLM and the browser driver are injected ports.

pub mod agent;
pub mod config;
pub mod errors;
pub mod http_llm;
pub mod llm;
pub mod metrics;
pub mod planner;
pub mod prompt;
pub mod result;

pub use agent::Agent;
pub use config::AgentConfig;
pub use errors::{LlmError, PlanError};
pub use http_llm::{HttpLlmClient, HttpLlmConfig};
pub use llm::{parse_decision, ChatMessage, Decision, LlmClient, MockLlmClient};
pub use metrics::AgentMetrics;
pub use planner::{FallbackPlanner, LlmPlanner, Planner};
pub use result::{AgentResult, ExitReason};
