//! Executor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry, validation and timeout tunables for action dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Retries after the initial attempt for transient failures.
    pub max_retries: u32,

    /// Backoff base; attempt `n` sleeps `base * 2^n * (1 + jitter)` with
    /// jitter uniform in `[0, 0.3]`.
    #[serde(with = "duration_millis")]
    pub retry_base_delay: Duration,

    /// How long a healthy probe result stays trusted.
    #[serde(with = "duration_millis")]
    pub health_cache_ttl: Duration,

    /// Maximum `text` argument length in characters.
    pub max_text_len: usize,

    /// Maximum `url` argument length in characters.
    pub max_url_len: usize,

    /// User-requested waits are clamped to this.
    #[serde(with = "duration_millis")]
    pub max_wait: Duration,

    /// Deadline for navigation-class actions (navigate, back, forward).
    #[serde(with = "duration_millis")]
    pub navigate_timeout: Duration,

    /// Deadline for element-class actions (click, type, press, select,
    /// hover, scroll, screenshot, read_text).
    #[serde(with = "duration_millis")]
    pub action_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            health_cache_ttl: Duration::from_secs(5),
            max_text_len: 10_000,
            max_url_len: 2_048,
            max_wait: Duration::from_secs(60),
            navigate_timeout: Duration::from_secs(15),
            action_timeout: Duration::from_secs(5),
        }
    }
}

impl ExecutorConfig {
    /// Fast preset for tests: no meaningful backoff waits.
    pub fn fast() -> Self {
        Self {
            retry_base_delay: Duration::from_millis(1),
            ..Self::default()
        }
    }

    /// Builder: set the retry budget.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builder: set the backoff base delay.
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_base_delay, Duration::from_secs(1));
        assert_eq!(config.health_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.max_text_len, 10_000);
    }
}
