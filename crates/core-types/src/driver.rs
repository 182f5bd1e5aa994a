//! The browser driver port.
//!
//! The agent core never talks to a browser process directly; it consumes this
//! narrow contract. Real drivers (CDP, WebDriver, a remote bridge) live
//! outside the core and implement this trait; `MockDriver` provides the
//! deterministic in-process implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::action::ScrollDirection;
use crate::element::{BBox, TriState};

/// Navigation settle condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    Load,
    #[default]
    DomReady,
    NetworkIdle,
}

/// Page identity returned by navigation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
}

/// One node of the driver's accessibility tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxNode {
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub disabled: TriState,
    #[serde(default)]
    pub checked: TriState,
    #[serde(default)]
    pub selected: TriState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    #[serde(default)]
    pub children: Vec<AxNode>,
}

impl AxNode {
    pub fn new(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_children(mut self, children: Vec<AxNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = TriState::from_option(Some(disabled));
        self
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = TriState::from_option(Some(checked));
        self
    }
}

/// Errors surfaced by driver implementations.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    /// Browser process gone or connection lost; fatal to the run.
    #[error("driver unavailable: {0}")]
    Unavailable(String),

    /// Operation exceeded its deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("element not visible: {0}")]
    ElementNotVisible(String),

    #[error("element detached: {0}")]
    ElementDetached(String),

    #[error("invalid ref: {0}")]
    InvalidRef(String),

    /// Network glitch between core and driver; retryable.
    #[error("network error: {0}")]
    Network(String),

    /// Driver temporarily busy; retryable.
    #[error("driver busy: {0}")]
    Busy(String),

    /// Protocol-level failure that is not obviously transient.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl DriverError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DriverError::Timeout(_) | DriverError::Network(_) | DriverError::Busy(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(_))
    }

    /// Whether further work through this driver is pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Unavailable(_))
    }
}

/// The narrow, mockable browser contract the core consumes.
///
/// Refs passed to element operations are snapshot-assigned identifiers; the
/// driver rejects refs it cannot resolve against the live page. The driver
/// performs no retries of its own.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str, wait_until: WaitUntil) -> Result<PageInfo, DriverError>;

    async fn accessibility_tree(&self) -> Result<AxNode, DriverError>;

    /// Query the DOM for the fallback selector set; used when the
    /// accessibility tree yields too few interactive elements.
    async fn query_elements(&self, selectors: &[&str]) -> Result<Vec<AxNode>, DriverError>;

    async fn click(&self, ref_id: &str, timeout: Duration) -> Result<(), DriverError>;

    async fn type_text(
        &self,
        ref_id: &str,
        text: &str,
        clear: bool,
        timeout: Duration,
    ) -> Result<(), DriverError>;

    async fn press(&self, key: &str) -> Result<(), DriverError>;

    async fn select(&self, ref_id: &str, value: &str) -> Result<(), DriverError>;

    async fn hover(&self, ref_id: &str) -> Result<(), DriverError>;

    async fn scroll(&self, direction: ScrollDirection, amount: i32) -> Result<(), DriverError>;

    async fn wait(&self, seconds: f64) -> Result<(), DriverError>;

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    async fn evaluate(&self, code: &str) -> Result<Value, DriverError>;

    async fn health(&self) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn back(&self) -> Result<PageInfo, DriverError>;

    async fn forward(&self) -> Result<PageInfo, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_transience() {
        assert!(DriverError::Timeout("t".into()).is_transient());
        assert!(DriverError::Network("n".into()).is_transient());
        assert!(DriverError::Busy("b".into()).is_transient());
        assert!(!DriverError::ElementNotFound("e1".into()).is_transient());
        assert!(!DriverError::Unavailable("gone".into()).is_transient());
        assert!(DriverError::Unavailable("gone".into()).is_fatal());
    }

    #[test]
    fn test_ax_node_builder() {
        let node = AxNode::new("button", "Submit")
            .with_value("v")
            .with_disabled(false);
        assert_eq!(node.role, "button");
        assert_eq!(node.disabled, TriState::False);
        assert!(node.children.is_empty());
    }
}
