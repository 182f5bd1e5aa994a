//! Snapshot and diff value types.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use axpilot_core_types::ElementRecord;

/// Immutable accessibility view of one page at one instant.
///
/// Refs (`e1`, `e2`, ...) are valid until the next fresh snapshot; consumers
/// must not persist them across mutating actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub elements: Vec<ElementRecord>,
    /// Set when the page had more interactive elements than the cap.
    pub truncated: bool,
    /// Set when the DOM-query fallback augmented the element list.
    pub fallback_used: bool,
    #[serde(skip)]
    refs: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        elements: Vec<ElementRecord>,
        truncated: bool,
        fallback_used: bool,
    ) -> Self {
        let refs = elements
            .iter()
            .enumerate()
            .map(|(index, element)| (element.ref_id.clone(), index))
            .collect();
        Self {
            url: url.into(),
            title: title.into(),
            timestamp: Utc::now(),
            elements,
            truncated,
            fallback_used,
            refs,
        }
    }

    /// Look up an element by ref.
    pub fn element(&self, ref_id: &str) -> Option<&ElementRecord> {
        self.refs.get(ref_id).map(|&index| &self.elements[index])
    }

    /// All elements with the given role, in document order.
    pub fn by_role(&self, role: &str) -> Vec<&ElementRecord> {
        self.elements.iter().filter(|e| e.role == role).collect()
    }

    /// First element whose accessible name contains `needle`
    /// (case-insensitive).
    pub fn find_by_name(&self, needle: &str) -> Option<&ElementRecord> {
        let needle = needle.to_lowercase();
        self.elements
            .iter()
            .find(|e| e.name.to_lowercase().contains(&needle))
    }

    /// Snapshot equality: same URL and the same ordered state tuples.
    pub fn same_page(&self, other: &Snapshot) -> bool {
        self.url == other.url
            && self.elements.len() == other.elements.len()
            && self
                .elements
                .iter()
                .zip(other.elements.iter())
                .all(|(a, b)| a.same_state(b))
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// An element whose state changed between two snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementChange {
    pub before: ElementRecord,
    pub after: ElementRecord,
}

/// Added/removed/changed element sets relative to the previous snapshot.
///
/// Derived on request, never cached. Because fresh snapshots re-number refs,
/// the join is keyed on `(role, name)` with position as tiebreaker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub added: Vec<ElementRecord>,
    pub removed: Vec<ElementRecord>,
    pub changed: Vec<ElementChange>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// What `SnapshotEngine::get` returns.
///
/// Diff mode with a previous snapshot present always yields `Diff`; a first
/// call (no previous) yields `Full` and seeds the previous pointer.
#[derive(Debug, Clone)]
pub enum SnapshotView {
    Full(Arc<Snapshot>),
    Diff(SnapshotDiff),
}

impl SnapshotView {
    pub fn into_full(self) -> Option<Arc<Snapshot>> {
        match self {
            SnapshotView::Full(snapshot) => Some(snapshot),
            SnapshotView::Diff(_) => None,
        }
    }

    pub fn into_diff(self) -> Option<SnapshotDiff> {
        match self {
            SnapshotView::Diff(diff) => Some(diff),
            SnapshotView::Full(_) => None,
        }
    }

    pub fn is_diff(&self) -> bool {
        matches!(self, SnapshotView::Diff(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ref_id: &str, role: &str, name: &str) -> ElementRecord {
        ElementRecord::new(ref_id, role, name)
    }

    #[test]
    fn test_ref_lookup() {
        let snapshot = Snapshot::new(
            "https://a.example/",
            "A",
            vec![record("e1", "button", "Go"), record("e2", "link", "Docs")],
            false,
            false,
        );
        assert_eq!(snapshot.element("e2").unwrap().name, "Docs");
        assert!(snapshot.element("e3").is_none());
    }

    #[test]
    fn test_same_page_ignores_refs_and_timestamps() {
        let a = Snapshot::new(
            "https://a.example/",
            "A",
            vec![record("e1", "button", "Go")],
            false,
            false,
        );
        let b = Snapshot::new(
            "https://a.example/",
            "A",
            vec![record("e7", "button", "Go")],
            false,
            true,
        );
        assert!(a.same_page(&b));

        let c = Snapshot::new(
            "https://other.example/",
            "A",
            vec![record("e1", "button", "Go")],
            false,
            false,
        );
        assert!(!a.same_page(&c));
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let snapshot = Snapshot::new(
            "https://a.example/",
            "A",
            vec![record("e1", "searchbox", "Search the site")],
            false,
            false,
        );
        assert!(snapshot.find_by_name("SEARCH").is_some());
        assert!(snapshot.find_by_name("missing").is_none());
    }
}
