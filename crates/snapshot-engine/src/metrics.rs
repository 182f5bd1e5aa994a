//! Per-engine snapshot metrics.
//!
//! Counters are instance-held (one engine per agent) so isolated agents never
//! share metric state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Default)]
pub struct SnapshotMetrics {
    snapshots_taken: AtomicU64,
    cache_hits: AtomicU64,
    fallback_used: AtomicU64,
    total_snapshot_ns: AtomicU64,
    snapshot_samples: AtomicU64,
    elements_total: AtomicU64,
}

/// Point-in-time view of the engine's counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SnapshotMetricsSnapshot {
    pub snapshots_taken: u64,
    pub cache_hits: u64,
    pub fallback_used: u64,
    pub avg_snapshot_time_ms: f64,
    pub avg_elements_per_snapshot: f64,
}

impl SnapshotMetrics {
    pub fn record_fresh(&self, duration: Duration, element_count: usize, fallback: bool) {
        self.snapshots_taken.fetch_add(1, Ordering::Relaxed);
        self.snapshot_samples.fetch_add(1, Ordering::Relaxed);
        self.total_snapshot_ns
            .fetch_add(duration_to_nanos(duration), Ordering::Relaxed);
        self.elements_total
            .fetch_add(element_count as u64, Ordering::Relaxed);
        if fallback {
            self.fallback_used.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SnapshotMetricsSnapshot {
        let taken = self.snapshots_taken.load(Ordering::Relaxed);
        let samples = self.snapshot_samples.load(Ordering::Relaxed);
        let total_ns = self.total_snapshot_ns.load(Ordering::Relaxed);
        let elements = self.elements_total.load(Ordering::Relaxed);
        SnapshotMetricsSnapshot {
            snapshots_taken: taken,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fallback_used: self.fallback_used.load(Ordering::Relaxed),
            avg_snapshot_time_ms: average_ms(total_ns, samples),
            avg_elements_per_snapshot: if taken == 0 {
                0.0
            } else {
                elements as f64 / taken as f64
            },
        }
    }
}

fn average_ms(total_ns: u64, samples: u64) -> f64 {
    if samples == 0 {
        0.0
    } else {
        (total_ns as f64 / samples as f64) / 1_000_000.0
    }
}

fn duration_to_nanos(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_averages() {
        let metrics = SnapshotMetrics::default();
        metrics.record_fresh(Duration::from_millis(10), 4, false);
        metrics.record_fresh(Duration::from_millis(30), 8, true);
        metrics.record_hit();

        let view = metrics.snapshot();
        assert_eq!(view.snapshots_taken, 2);
        assert_eq!(view.cache_hits, 1);
        assert_eq!(view.fallback_used, 1);
        assert!((view.avg_snapshot_time_ms - 20.0).abs() < 1.0);
        assert!((view.avg_elements_per_snapshot - 6.0).abs() < f64::EPSILON);
    }
}
