//! Deterministic driver used for tests and offline development.
//!
//! `MockDriver` keeps an in-memory page store keyed by URL, resolves refs
//! positionally over the interactive-role set in document order (the same
//! order the snapshot engine assigns them), applies `type_text`/`select`
//! mutations to its tree, and supports per-method failure injection so tests
//! can script transient and permanent errors.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::action::ScrollDirection;
use crate::driver::{AxNode, BrowserDriver, DriverError, PageInfo, WaitUntil};
use crate::element::is_interactive_role;

#[derive(Debug, Clone)]
struct MockPage {
    title: String,
    tree: AxNode,
    fallback: Vec<AxNode>,
}

#[derive(Default)]
struct MockState {
    pages: HashMap<String, MockPage>,
    history: Vec<String>,
    cursor: usize,
    healthy: bool,
    screenshot_bytes: Vec<u8>,
    failures: HashMap<&'static str, VecDeque<DriverError>>,
    calls: HashMap<&'static str, u32>,
}

/// In-memory `BrowserDriver` implementation.
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                healthy: true,
                screenshot_bytes: vec![0x89, 0x50, 0x4e, 0x47],
                ..Default::default()
            }),
        }
    }

    /// Register a page and, if it is the first one, make it current.
    pub fn with_page(self, url: impl Into<String>, title: impl Into<String>, tree: AxNode) -> Self {
        self.add_page(url, title, tree);
        self
    }

    pub fn add_page(&self, url: impl Into<String>, title: impl Into<String>, tree: AxNode) {
        let url = url.into();
        let mut state = self.state.lock();
        state.pages.insert(
            url.clone(),
            MockPage {
                title: title.into(),
                tree,
                fallback: Vec::new(),
            },
        );
        if state.history.is_empty() {
            state.history.push(url);
            state.cursor = 0;
        }
    }

    /// Replace the tree of a registered page (simulates DOM mutation).
    pub fn set_tree(&self, url: &str, tree: AxNode) {
        let mut state = self.state.lock();
        if let Some(page) = state.pages.get_mut(url) {
            page.tree = tree;
        }
    }

    /// Extra elements returned by `query_elements` for a page.
    pub fn set_fallback_elements(&self, url: &str, elements: Vec<AxNode>) {
        let mut state = self.state.lock();
        if let Some(page) = state.pages.get_mut(url) {
            page.fallback = elements;
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.lock().healthy = healthy;
    }

    /// Queue an error for the next call of `method` (driver method name).
    pub fn fail_next(&self, method: &'static str, error: DriverError) {
        self.state
            .lock()
            .failures
            .entry(method)
            .or_default()
            .push_back(error);
    }

    /// Number of times a driver method actually executed (injected failures
    /// count; validation rejections in the executor never reach here).
    pub fn call_count(&self, method: &str) -> u32 {
        *self.state.lock().calls.get(method).unwrap_or(&0)
    }

    fn enter(&self, method: &'static str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        *state.calls.entry(method).or_insert(0) += 1;
        if let Some(queue) = state.failures.get_mut(method) {
            if let Some(err) = queue.pop_front() {
                return Err(err);
            }
        }
        Ok(())
    }

    fn current_page_url(state: &MockState) -> Option<String> {
        state.history.get(state.cursor).cloned()
    }

    /// Resolve `eN` to the N-th interactive node in document order.
    fn resolve_mut<'a>(tree: &'a mut AxNode, ref_id: &str) -> Option<&'a mut AxNode> {
        let index: usize = ref_id.strip_prefix('e')?.parse().ok()?;
        if index == 0 {
            return None;
        }
        let mut seen = 0usize;
        Self::walk_mut(tree, index, &mut seen)
    }

    fn walk_mut<'a>(node: &'a mut AxNode, wanted: usize, seen: &mut usize) -> Option<&'a mut AxNode> {
        if is_interactive_role(&node.role) {
            *seen += 1;
            if *seen == wanted {
                return Some(node);
            }
        }
        for child in node.children.iter_mut() {
            if let Some(found) = Self::walk_mut(child, wanted, seen) {
                return Some(found);
            }
        }
        None
    }

    fn with_element<F>(&self, ref_id: &str, apply: F) -> Result<(), DriverError>
    where
        F: FnOnce(&mut AxNode),
    {
        let mut state = self.state.lock();
        let url = Self::current_page_url(&state)
            .ok_or_else(|| DriverError::ElementNotFound(ref_id.to_string()))?;
        let page = state
            .pages
            .get_mut(&url)
            .ok_or_else(|| DriverError::ElementNotFound(ref_id.to_string()))?;
        match Self::resolve_mut(&mut page.tree, ref_id) {
            Some(node) => {
                apply(node);
                Ok(())
            }
            None => Err(DriverError::ElementNotFound(ref_id.to_string())),
        }
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str, _wait_until: WaitUntil) -> Result<PageInfo, DriverError> {
        self.enter("navigate")?;
        let mut state = self.state.lock();
        if !state.pages.contains_key(url) {
            state.pages.insert(
                url.to_string(),
                MockPage {
                    title: String::new(),
                    tree: AxNode::new("document", ""),
                    fallback: Vec::new(),
                },
            );
        }
        let cursor = state.cursor;
        if !state.history.is_empty() {
            state.history.truncate(cursor + 1);
        }
        state.history.push(url.to_string());
        state.cursor = state.history.len() - 1;
        let title = state.pages[url].title.clone();
        Ok(PageInfo {
            url: url.to_string(),
            title,
        })
    }

    async fn accessibility_tree(&self) -> Result<AxNode, DriverError> {
        self.enter("accessibility_tree")?;
        let state = self.state.lock();
        let tree = Self::current_page_url(&state)
            .and_then(|url| state.pages.get(&url).map(|p| p.tree.clone()))
            .unwrap_or_else(|| AxNode::new("document", ""));
        Ok(tree)
    }

    async fn query_elements(&self, _selectors: &[&str]) -> Result<Vec<AxNode>, DriverError> {
        self.enter("query_elements")?;
        let state = self.state.lock();
        let elements = Self::current_page_url(&state)
            .and_then(|url| state.pages.get(&url).map(|p| p.fallback.clone()))
            .unwrap_or_default();
        Ok(elements)
    }

    async fn click(&self, ref_id: &str, _timeout: Duration) -> Result<(), DriverError> {
        self.enter("click")?;
        self.with_element(ref_id, |_| {})
    }

    async fn type_text(
        &self,
        ref_id: &str,
        text: &str,
        clear: bool,
        _timeout: Duration,
    ) -> Result<(), DriverError> {
        self.enter("type_text")?;
        self.with_element(ref_id, |node| {
            if clear {
                node.value = text.to_string();
            } else {
                node.value.push_str(text);
            }
        })
    }

    async fn press(&self, _key: &str) -> Result<(), DriverError> {
        self.enter("press")
    }

    async fn select(&self, ref_id: &str, value: &str) -> Result<(), DriverError> {
        self.enter("select")?;
        self.with_element(ref_id, |node| {
            node.value = value.to_string();
        })
    }

    async fn hover(&self, ref_id: &str) -> Result<(), DriverError> {
        self.enter("hover")?;
        self.with_element(ref_id, |_| {})
    }

    async fn scroll(&self, _direction: ScrollDirection, _amount: i32) -> Result<(), DriverError> {
        self.enter("scroll")
    }

    async fn wait(&self, _seconds: f64) -> Result<(), DriverError> {
        // Deterministic: the mock never sleeps.
        self.enter("wait")
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.enter("screenshot")?;
        Ok(self.state.lock().screenshot_bytes.clone())
    }

    async fn evaluate(&self, code: &str) -> Result<Value, DriverError> {
        self.enter("evaluate")?;
        let state = self.state.lock();
        if code.contains("document.title") {
            let title = Self::current_page_url(&state)
                .and_then(|url| state.pages.get(&url).map(|p| p.title.clone()))
                .unwrap_or_default();
            return Ok(Value::String(title));
        }
        Ok(Value::Null)
    }

    async fn health(&self) -> Result<(), DriverError> {
        self.enter("health")?;
        if self.state.lock().healthy {
            Ok(())
        } else {
            Err(DriverError::Unavailable("health probe failed".to_string()))
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.enter("current_url")?;
        let state = self.state.lock();
        Ok(Self::current_page_url(&state).unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn back(&self) -> Result<PageInfo, DriverError> {
        self.enter("back")?;
        let mut state = self.state.lock();
        if state.cursor == 0 {
            return Err(DriverError::Protocol("no page to go back to".to_string()));
        }
        state.cursor -= 1;
        let url = state.history[state.cursor].clone();
        let title = state.pages.get(&url).map(|p| p.title.clone()).unwrap_or_default();
        Ok(PageInfo { url, title })
    }

    async fn forward(&self) -> Result<PageInfo, DriverError> {
        self.enter("forward")?;
        let mut state = self.state.lock();
        if state.cursor + 1 >= state.history.len() {
            return Err(DriverError::Protocol("no page to go forward to".to_string()));
        }
        state.cursor += 1;
        let url = state.history[state.cursor].clone();
        let title = state.pages.get(&url).map(|p| p.title.clone()).unwrap_or_default();
        Ok(PageInfo { url, title })
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.enter("close")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_page() -> AxNode {
        AxNode::new("document", "root").with_children(vec![
            AxNode::new("searchbox", "Search"),
            AxNode::new("button", "Go"),
        ])
    }

    #[tokio::test]
    async fn test_navigate_and_history() {
        let driver = MockDriver::new().with_page("https://a.example/", "A", search_page());
        driver.add_page("https://b.example/", "B", AxNode::new("document", ""));

        let info = driver
            .navigate("https://b.example/", WaitUntil::DomReady)
            .await
            .unwrap();
        assert_eq!(info.title, "B");
        assert_eq!(driver.current_url().await.unwrap(), "https://b.example/");

        let back = driver.back().await.unwrap();
        assert_eq!(back.url, "https://a.example/");
        let fwd = driver.forward().await.unwrap();
        assert_eq!(fwd.url, "https://b.example/");
    }

    #[tokio::test]
    async fn test_type_text_updates_tree() {
        let driver = MockDriver::new().with_page("https://a.example/", "A", search_page());
        driver
            .type_text("e1", "rust", true, Duration::from_secs(5))
            .await
            .unwrap();
        let tree = driver.accessibility_tree().await.unwrap();
        assert_eq!(tree.children[0].value, "rust");
    }

    #[tokio::test]
    async fn test_unknown_ref_rejected() {
        let driver = MockDriver::new().with_page("https://a.example/", "A", search_page());
        let err = driver.click("e99", Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, DriverError::ElementNotFound(_)));
    }

    #[tokio::test]
    async fn test_failure_injection_and_counts() {
        let driver = MockDriver::new().with_page("https://a.example/", "A", search_page());
        driver.fail_next("click", DriverError::Busy("busy".to_string()));

        let err = driver.click("e2", Duration::from_secs(5)).await.unwrap_err();
        assert!(err.is_transient());
        driver.click("e2", Duration::from_secs(5)).await.unwrap();
        assert_eq!(driver.call_count("click"), 2);
    }
}
