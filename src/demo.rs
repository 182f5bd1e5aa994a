//! Offline demo environment.
//!
//! Browser drivers are external processes; for offline runs and smoke tests
//! the CLI wires the deterministic in-process driver against a small demo
//! site instead.

use std::sync::Arc;

use axpilot_core_types::{AxNode, MockDriver};

pub const DEMO_URL: &str = "https://demo.axpilot.dev/";

/// A search page with a few result links, enough for the fallback planner
/// and short LLM-driven runs to do real work.
pub fn demo_driver() -> Arc<MockDriver> {
    let tree = AxNode::new("document", "demo").with_children(vec![
        AxNode::new("heading", "Demo search"),
        AxNode::new("searchbox", "Search the demo index"),
        AxNode::new("button", "Search"),
        AxNode::new("generic", "results").with_children(vec![
            AxNode::new("link", "Getting started"),
            AxNode::new("link", "Reference manual"),
            AxNode::new("link", "Release notes"),
        ]),
    ]);
    Arc::new(MockDriver::new().with_page(DEMO_URL, "axpilot demo", tree))
}
