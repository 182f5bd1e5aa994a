//! The snapshot engine: cache check, extraction, fallback, diffing.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use axpilot_core_types::BrowserDriver;

use crate::cache::SnapshotCache;
use crate::config::SnapshotConfig;
use crate::differ;
use crate::errors::SnapshotError;
use crate::extract::{self, FALLBACK_SELECTORS};
use crate::metrics::{SnapshotMetrics, SnapshotMetricsSnapshot};
use crate::model::{Snapshot, SnapshotView};

/// Bounded, cached accessibility snapshots over an injected driver.
///
/// The engine exclusively owns the snapshot cache and the previous-snapshot
/// pointer used for diffs; the executor calls [`SnapshotEngine::invalidate`]
/// after successful mutating actions.
pub struct SnapshotEngine {
    driver: Arc<dyn BrowserDriver>,
    config: SnapshotConfig,
    cache: SnapshotCache,
    previous: Mutex<Option<Arc<Snapshot>>>,
    metrics: SnapshotMetrics,
}

impl SnapshotEngine {
    pub fn new(driver: Arc<dyn BrowserDriver>, config: SnapshotConfig) -> Self {
        let cache = SnapshotCache::new(config.cache_ttl, config.max_cached_urls);
        Self {
            driver,
            config,
            cache,
            previous: Mutex::new(None),
            metrics: SnapshotMetrics::default(),
        }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Snapshot the current page, serving from cache when safe.
    ///
    /// With `diff_mode` and a previous snapshot present this always returns
    /// [`SnapshotView::Diff`]; otherwise a full snapshot is returned and the
    /// previous pointer is seeded. Refs in a returned snapshot stay valid
    /// until the next call that produces a fresh snapshot.
    pub async fn get(&self, force: bool, diff_mode: bool) -> Result<SnapshotView, SnapshotError> {
        let url = self.driver.current_url().await?;

        if !force {
            if let Some(cached) = self.cache.get(&url) {
                self.metrics.record_hit();
                debug!(url = %url, "snapshot cache hit");
                // The previous pointer must equal the value just returned,
                // otherwise a later diff reads against stale state. Compute
                // the diff against the prior value first.
                let view = self.view_for(diff_mode, &cached);
                *self.previous.lock() = Some(cached);
                return Ok(view);
            }
        }

        let started = Instant::now();
        let snapshot = Arc::new(self.capture(&url).await?);
        self.metrics.record_fresh(
            started.elapsed(),
            snapshot.elements.len(),
            snapshot.fallback_used,
        );
        self.cache.put(url, Arc::clone(&snapshot));

        let view = self.view_for(diff_mode, &snapshot);
        *self.previous.lock() = Some(snapshot);
        Ok(view)
    }

    /// Drop the cache and the previous-snapshot pointer. Always safe;
    /// calling twice has the same effect as once.
    pub fn invalidate(&self) {
        self.cache.clear();
        *self.previous.lock() = None;
        debug!("snapshot cache invalidated");
    }

    pub fn metrics(&self) -> SnapshotMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn view_for(&self, diff_mode: bool, current: &Arc<Snapshot>) -> SnapshotView {
        if diff_mode {
            if let Some(previous) = self.previous.lock().as_ref() {
                return SnapshotView::Diff(differ::diff(previous, current));
            }
        }
        SnapshotView::Full(Arc::clone(current))
    }

    async fn capture(&self, url: &str) -> Result<Snapshot, SnapshotError> {
        let tree = timeout(self.config.snapshot_timeout, self.driver.accessibility_tree())
            .await
            .map_err(|_| SnapshotError::Timeout("accessibility tree call timed out".to_string()))??;

        let mut extraction = extract::from_tree(&tree, &self.config);

        if extraction.elements.len() < self.config.fallback_floor {
            match timeout(
                self.config.snapshot_timeout,
                self.driver.query_elements(FALLBACK_SELECTORS),
            )
            .await
            {
                Ok(Ok(nodes)) => extract::augment(&mut extraction, &nodes, &self.config),
                Ok(Err(err)) => {
                    warn!(error = %err, "fallback element query failed; continuing with tree elements only");
                }
                Err(_) => {
                    warn!("fallback element query timed out; continuing with tree elements only");
                }
            }
        }

        extract::bound(&mut extraction, self.config.max_elements);

        let title = self.page_title().await;
        Ok(Snapshot::new(
            url,
            title,
            extraction.elements,
            extraction.truncated,
            extraction.fallback_used,
        ))
    }

    /// Title is observability-only; failures degrade to an empty string.
    async fn page_title(&self) -> String {
        match self.driver.evaluate("document.title").await {
            Ok(value) => value.as_str().unwrap_or_default().to_string(),
            Err(err) => {
                debug!(error = %err, "title evaluation failed");
                String::new()
            }
        }
    }
}
