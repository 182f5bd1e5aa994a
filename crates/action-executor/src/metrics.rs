//! Per-executor action metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use axpilot_core_types::Classification;

#[derive(Debug, Default)]
pub struct ExecutorMetrics {
    actions_executed: AtomicU64,
    action_failures: AtomicU64,
    action_retries: AtomicU64,
    total_action_ns: AtomicU64,
    samples: AtomicU64,
    ok: AtomicU64,
    transient: AtomicU64,
    permanent: AtomicU64,
    timeout: AtomicU64,
}

/// Point-in-time counter view.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ExecutorMetricsSnapshot {
    pub actions_executed: u64,
    pub action_failures: u64,
    pub action_retries: u64,
    pub avg_action_time_ms: f64,
    pub ok: u64,
    pub transient: u64,
    pub permanent: u64,
    pub timeout: u64,
}

impl ExecutorMetrics {
    pub fn record(&self, classification: Classification, retries: u32, duration: Duration) {
        self.actions_executed.fetch_add(1, Ordering::Relaxed);
        self.action_retries
            .fetch_add(u64::from(retries), Ordering::Relaxed);
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.total_action_ns
            .fetch_add(duration.as_nanos().min(u64::MAX as u128) as u64, Ordering::Relaxed);

        let counter = match classification {
            Classification::Ok => &self.ok,
            Classification::Transient => &self.transient,
            Classification::Permanent => &self.permanent,
            Classification::Timeout => &self.timeout,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if !classification.is_ok() {
            self.action_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ExecutorMetricsSnapshot {
        let samples = self.samples.load(Ordering::Relaxed);
        let total_ns = self.total_action_ns.load(Ordering::Relaxed);
        ExecutorMetricsSnapshot {
            actions_executed: self.actions_executed.load(Ordering::Relaxed),
            action_failures: self.action_failures.load(Ordering::Relaxed),
            action_retries: self.action_retries.load(Ordering::Relaxed),
            avg_action_time_ms: if samples == 0 {
                0.0
            } else {
                (total_ns as f64 / samples as f64) / 1_000_000.0
            },
            ok: self.ok.load(Ordering::Relaxed),
            transient: self.transient.load(Ordering::Relaxed),
            permanent: self.permanent.load(Ordering::Relaxed),
            timeout: self.timeout.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_counters() {
        let metrics = ExecutorMetrics::default();
        metrics.record(Classification::Ok, 2, Duration::from_millis(5));
        metrics.record(Classification::Permanent, 0, Duration::from_millis(3));

        let view = metrics.snapshot();
        assert_eq!(view.actions_executed, 2);
        assert_eq!(view.action_failures, 1);
        assert_eq!(view.action_retries, 2);
        assert_eq!(view.ok, 1);
        assert_eq!(view.permanent, 1);
        assert_eq!(view.transient, 0);
    }
}
