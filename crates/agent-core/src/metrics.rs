//! Aggregated agent metrics.

use serde::Serialize;

use action_executor::ExecutorMetricsSnapshot;
use memory_center::MemoryStats;
use snapshot_engine::SnapshotMetricsSnapshot;

/// Loop counters plus per-component metric snapshots, taken atomically per
/// component at report time.
#[derive(Debug, Clone, Serialize)]
pub struct AgentMetrics {
    pub steps_taken: u32,
    pub llm_calls: u64,
    pub llm_parse_errors: u64,
    pub replans: u64,
    pub snapshot: SnapshotMetricsSnapshot,
    pub executor: ExecutorMetricsSnapshot,
    pub memory: MemoryStats,
}
