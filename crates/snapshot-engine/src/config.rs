//! Snapshot engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for extraction, caching and text bounding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// How long a cached snapshot stays servable. Zero forces a fresh
    /// snapshot on every call.
    #[serde(with = "duration_millis")]
    pub cache_ttl: Duration,

    /// Cap on elements per snapshot; the element list is truncated in
    /// traversal order past this.
    pub max_elements: usize,

    /// Truncation limit for element names and values.
    pub max_text_len: usize,

    /// Minimum interactive elements expected from the accessibility tree;
    /// below this the DOM-query fallback augments the list.
    pub fallback_floor: usize,

    /// How many URLs the cache keeps before evicting the stalest entry.
    pub max_cached_urls: usize,

    /// Deadline for the driver's tree and query calls.
    #[serde(with = "duration_millis")]
    pub snapshot_timeout: Duration,

    /// Roles indexed in addition to the default interactive set.
    #[serde(default)]
    pub extra_roles: Vec<String>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(2),
            max_elements: 100,
            max_text_len: 200,
            fallback_floor: 20,
            max_cached_urls: 8,
            snapshot_timeout: Duration::from_secs(10),
            extra_roles: Vec::new(),
        }
    }
}

impl SnapshotConfig {
    /// Builder: set cache TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder: set the element cap.
    pub fn max_elements(mut self, cap: usize) -> Self {
        self.max_elements = cap;
        self
    }

    /// Builder: set the fallback floor.
    pub fn fallback_floor(mut self, floor: usize) -> Self {
        self.fallback_floor = floor;
        self
    }
}

/// Serialize `Duration` fields as integer milliseconds.
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
