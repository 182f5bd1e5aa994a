//! Action dispatch with retries, classification and cache invalidation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use axpilot_core_types::{
    Action, ActionOutcome, BrowserDriver, Classification, DriverError, WaitUntil,
};
use snapshot_engine::{SnapshotEngine, SnapshotError};

use crate::classify::{classify, is_retryable};
use crate::config::ExecutorConfig;
use crate::health::HealthGate;
use crate::metrics::{ExecutorMetrics, ExecutorMetricsSnapshot};
use crate::validate::validate;

const MAX_OBSERVATION_CHARS: usize = 200;

/// Validated, health-gated, retrying wrapper around the raw driver.
pub struct ActionExecutor {
    driver: Arc<dyn BrowserDriver>,
    engine: Arc<SnapshotEngine>,
    config: ExecutorConfig,
    health: HealthGate,
    cancel: CancellationToken,
    metrics: ExecutorMetrics,
}

impl ActionExecutor {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        engine: Arc<SnapshotEngine>,
        config: ExecutorConfig,
    ) -> Self {
        let health = HealthGate::new(Arc::clone(&driver), config.health_cache_ttl);
        Self {
            driver,
            engine,
            config,
            health,
            cancel: CancellationToken::new(),
            metrics: ExecutorMetrics::default(),
        }
    }

    /// Share a cancellation token with the agent loop; backoff sleeps are
    /// cancellable, in-flight driver calls are not.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn metrics(&self) -> ExecutorMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Apply one action. Never raises; the outcome carries exactly one
    /// classification.
    pub async fn apply(&self, action: &Action) -> ActionOutcome {
        let started = Instant::now();
        let outcome = self.apply_inner(action).await;
        self.metrics
            .record(outcome.classification, outcome.retries_used, started.elapsed());
        outcome
    }

    async fn apply_inner(&self, action: &Action) -> ActionOutcome {
        if let Err(reason) = validate(action, &self.config) {
            debug!(action = action.name(), %reason, "action rejected by validation");
            return ActionOutcome::permanent(limit(&reason));
        }

        if !self.health.check().await {
            return ActionOutcome::permanent("browser unhealthy");
        }

        let mut last_error: Option<DriverError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.dispatch(action).await {
                Ok((observation, screenshot)) => {
                    if action.is_mutating() {
                        self.engine.invalidate();
                    }
                    let mut outcome = ActionOutcome::ok(limit(&observation), attempt);
                    if let Some(bytes) = screenshot {
                        outcome = outcome.with_screenshot(bytes);
                    }
                    return outcome;
                }
                Err(err) => {
                    let classification = classify(&err);
                    if !is_retryable(classification) {
                        debug!(
                            action = action.name(),
                            error = %err,
                            "permanent failure, not retrying"
                        );
                        return ActionOutcome::failed(
                            Classification::Permanent,
                            limit(&err.to_string()),
                            attempt,
                        );
                    }

                    warn!(
                        action = action.name(),
                        attempt,
                        error = %err,
                        "transient failure"
                    );
                    last_error = Some(err);

                    if attempt < self.config.max_retries {
                        if !self.backoff(attempt).await {
                            // Cancelled mid-backoff: report what we know.
                            return self.exhausted(last_error, attempt);
                        }
                    }
                }
            }
        }

        self.exhausted(last_error, self.config.max_retries)
    }

    fn exhausted(&self, last_error: Option<DriverError>, retries: u32) -> ActionOutcome {
        let (classification, message) = match last_error {
            Some(err) if err.is_timeout() => (Classification::Timeout, err.to_string()),
            Some(err) => (Classification::Transient, err.to_string()),
            None => (Classification::Transient, "retries exhausted".to_string()),
        };
        ActionOutcome::failed(classification, limit(&message), retries)
    }

    /// Sleep `base * 2^attempt * (1 + jitter)`; returns false when cancelled.
    async fn backoff(&self, attempt: u32) -> bool {
        let jitter: f64 = rand::thread_rng().gen_range(0.0..=0.3);
        let factor = 2f64.powi(attempt as i32) * (1.0 + jitter);
        let delay = self.config.retry_base_delay.mul_f64(factor);
        info!(attempt, delay_ms = delay.as_millis() as u64, "backing off before retry");

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }

    async fn dispatch(&self, action: &Action) -> Result<(String, Option<Vec<u8>>), DriverError> {
        match action {
            Action::Navigate { url } => {
                let info = self
                    .bounded(self.config.navigate_timeout, self.driver.navigate(url, WaitUntil::default()))
                    .await?;
                Ok((format!("navigated to {} ({})", info.url, info.title), None))
            }
            Action::Click { target } => {
                self.bounded(
                    self.config.action_timeout,
                    self.driver.click(target, self.config.action_timeout),
                )
                .await?;
                Ok((format!("clicked {target}"), None))
            }
            Action::TypeText { target, text, clear } => {
                self.bounded(
                    self.config.action_timeout,
                    self.driver
                        .type_text(target, text, *clear, self.config.action_timeout),
                )
                .await?;
                Ok((
                    format!("typed {} chars into {target}", text.chars().count()),
                    None,
                ))
            }
            Action::Press { key } => {
                self.bounded(self.config.action_timeout, self.driver.press(key))
                    .await?;
                Ok((format!("pressed {key}"), None))
            }
            Action::Select { target, value } => {
                self.bounded(self.config.action_timeout, self.driver.select(target, value))
                    .await?;
                Ok((format!("selected '{value}' in {target}"), None))
            }
            Action::Hover { target } => {
                self.bounded(self.config.action_timeout, self.driver.hover(target))
                    .await?;
                Ok((format!("hovered {target}"), None))
            }
            Action::Scroll { direction, amount } => {
                self.bounded(
                    self.config.action_timeout,
                    self.driver.scroll(*direction, *amount),
                )
                .await?;
                Ok((format!("scrolled {} by {amount}", direction.as_str()), None))
            }
            Action::Wait { seconds } => {
                let clamped = seconds.min(self.config.max_wait.as_secs_f64());
                let deadline = self.config.max_wait + self.config.action_timeout;
                self.bounded(deadline, self.driver.wait(clamped)).await?;
                Ok((format!("waited {clamped}s"), None))
            }
            Action::Screenshot => {
                let bytes = self
                    .bounded(self.config.action_timeout, self.driver.screenshot())
                    .await?;
                Ok((format!("captured screenshot ({} bytes)", bytes.len()), Some(bytes)))
            }
            Action::ReadText { target } => self.read_text(target.as_deref()).await,
            Action::GoBack => {
                let info = self
                    .bounded(self.config.navigate_timeout, self.driver.back())
                    .await?;
                Ok((format!("went back to {}", info.url), None))
            }
            Action::GoForward => {
                let info = self
                    .bounded(self.config.navigate_timeout, self.driver.forward())
                    .await?;
                Ok((format!("went forward to {}", info.url), None))
            }
            // The loop terminates on `done` before dispatch; answering it
            // here keeps `apply` total.
            Action::Done { message } => Ok((message.clone(), None)),
        }
    }

    /// Read element text via the current snapshot, or page text via script.
    async fn read_text(
        &self,
        target: Option<&str>,
    ) -> Result<(String, Option<Vec<u8>>), DriverError> {
        match target {
            Some(ref_id) => {
                let view = self
                    .engine
                    .get(false, false)
                    .await
                    .map_err(snapshot_to_driver_error)?;
                let snapshot = view
                    .into_full()
                    .ok_or_else(|| DriverError::Protocol("expected full snapshot".to_string()))?;
                let element = snapshot
                    .element(ref_id)
                    .ok_or_else(|| DriverError::ElementNotFound(ref_id.to_string()))?;
                let text = if element.value.is_empty() {
                    element.name.clone()
                } else {
                    format!("{} = {}", element.name, element.value)
                };
                Ok((format!("{ref_id}: {text}"), None))
            }
            None => {
                let value = self
                    .bounded(
                        self.config.action_timeout,
                        self.driver
                            .evaluate("document.body ? document.body.innerText : ''"),
                    )
                    .await?;
                Ok((value.as_str().unwrap_or_default().to_string(), None))
            }
        }
    }

    async fn bounded<T>(
        &self,
        deadline: Duration,
        fut: impl std::future::Future<Output = Result<T, DriverError>>,
    ) -> Result<T, DriverError> {
        match timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::Timeout(format!(
                "driver call exceeded {}ms",
                deadline.as_millis()
            ))),
        }
    }
}

fn snapshot_to_driver_error(err: SnapshotError) -> DriverError {
    match err {
        SnapshotError::Timeout(message) => DriverError::Timeout(message),
        SnapshotError::DriverUnavailable(message) => DriverError::Unavailable(message),
    }
}

/// Observations are bounded to keep step records and prompts small.
fn limit(text: &str) -> String {
    if text.chars().count() <= MAX_OBSERVATION_CHARS {
        text.to_string()
    } else {
        let kept: String = text.chars().take(MAX_OBSERVATION_CHARS - 3).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_bounds_observations() {
        let long = "x".repeat(400);
        let limited = limit(&long);
        assert_eq!(limited.chars().count(), MAX_OBSERVATION_CHARS);
        assert!(limited.ends_with("..."));
        assert_eq!(limit("short"), "short");
    }
}
