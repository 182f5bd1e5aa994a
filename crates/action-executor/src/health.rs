//! Cached browser-liveness gate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::warn;

use axpilot_core_types::BrowserDriver;

/// TTL-cached health probe.
///
/// A healthy result is trusted for the TTL; a cached unhealthy result always
/// triggers a fresh probe before the executor gives up on the browser.
pub struct HealthGate {
    driver: Arc<dyn BrowserDriver>,
    ttl: Duration,
    last: Mutex<Option<(bool, Instant)>>,
}

impl HealthGate {
    pub fn new(driver: Arc<dyn BrowserDriver>, ttl: Duration) -> Self {
        Self {
            driver,
            ttl,
            last: Mutex::new(None),
        }
    }

    pub async fn check(&self) -> bool {
        if let Some((healthy, probed_at)) = *self.last.lock() {
            if healthy && probed_at.elapsed() < self.ttl {
                return true;
            }
        }

        let healthy = match self.driver.health().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "browser health probe failed");
                false
            }
        };
        *self.last.lock() = Some((healthy, Instant::now()));
        healthy
    }
}
