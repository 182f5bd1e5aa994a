//! Aggregated agent configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use action_executor::ExecutorConfig;
use memory_center::MemoryConfig;
use snapshot_engine::SnapshotConfig;

/// All tunables for one agent: loop limits plus per-component configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Step loop iteration cap.
    pub max_steps: u32,

    /// Consecutive permanent failures before the loop exits fatally.
    pub max_permanent_failures: u32,

    /// Consecutive LLM parse errors before the loop exits fatally.
    pub max_parse_errors: u32,

    /// Maximum goal length in characters.
    pub max_goal_len: usize,

    /// Deadline for one LLM completion call.
    #[serde(with = "duration_millis")]
    pub llm_timeout: Duration,

    pub snapshot: SnapshotConfig,
    pub executor: ExecutorConfig,
    pub memory: MemoryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            max_permanent_failures: 3,
            max_parse_errors: 3,
            max_goal_len: 2_000,
            llm_timeout: Duration::from_secs(30),
            snapshot: SnapshotConfig::default(),
            executor: ExecutorConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Small, fast preset for tests.
    pub fn minimal() -> Self {
        Self {
            max_steps: 5,
            llm_timeout: Duration::from_secs(2),
            executor: ExecutorConfig::fast(),
            ..Self::default()
        }
    }

    /// Builder: set the step budget.
    pub fn max_steps(mut self, steps: u32) -> Self {
        self.max_steps = steps;
        self
    }

    /// Builder: set the consecutive permanent-failure limit.
    pub fn max_permanent_failures(mut self, limit: u32) -> Self {
        self.max_permanent_failures = limit;
        self
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
