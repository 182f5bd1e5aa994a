//! Element diffing between two snapshots.
//!
//! Fresh snapshots re-number refs, so the join key is `(role, name)` with
//! position as tiebreaker: the k-th old occurrence of an identity pairs with
//! the k-th new occurrence. Paired elements whose `(value, disabled,
//! checked)` differ are "changed"; unpaired old elements are "removed",
//! unpaired new elements are "added".

use std::collections::HashMap;

use crate::model::{ElementChange, Snapshot, SnapshotDiff};

pub fn diff(old: &Snapshot, new: &Snapshot) -> SnapshotDiff {
    let mut old_by_identity: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for (index, element) in old.elements.iter().enumerate() {
        old_by_identity
            .entry(element.identity())
            .or_default()
            .push(index);
    }

    let mut cursors: HashMap<(&str, &str), usize> = HashMap::new();
    let mut matched = vec![false; old.elements.len()];
    let mut result = SnapshotDiff::default();

    for element in &new.elements {
        let identity = element.identity();
        let cursor = cursors.entry(identity).or_insert(0);
        match old_by_identity.get(&identity).and_then(|indices| indices.get(*cursor)) {
            Some(&old_index) => {
                *cursor += 1;
                matched[old_index] = true;
                let before = &old.elements[old_index];
                let changed = before.value != element.value
                    || before.disabled != element.disabled
                    || before.checked != element.checked;
                if changed {
                    result.changed.push(ElementChange {
                        before: before.clone(),
                        after: element.clone(),
                    });
                }
            }
            None => result.added.push(element.clone()),
        }
    }

    for (index, was_matched) in matched.iter().enumerate() {
        if !was_matched {
            result.removed.push(old.elements[index].clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axpilot_core_types::{ElementRecord, TriState};

    fn snapshot(url: &str, elements: Vec<ElementRecord>) -> Snapshot {
        Snapshot::new(url, "", elements, false, false)
    }

    fn record(ref_id: &str, role: &str, name: &str) -> ElementRecord {
        ElementRecord::new(ref_id, role, name)
    }

    #[test]
    fn test_identical_snapshots_empty_diff() {
        let old = snapshot(
            "https://a.example/",
            vec![record("e1", "button", "A"), record("e2", "link", "B")],
        );
        let new = snapshot(
            "https://a.example/",
            vec![record("e1", "button", "A"), record("e2", "link", "B")],
        );
        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn test_added_element() {
        let old = snapshot(
            "https://a.example/",
            vec![record("e1", "button", "A"), record("e2", "link", "B")],
        );
        let new = snapshot(
            "https://a.example/",
            vec![
                record("e1", "button", "A"),
                record("e2", "link", "B"),
                record("e3", "link", "C"),
            ],
        );
        let result = diff(&old, &new);
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].name, "C");
        assert!(result.removed.is_empty());
        assert!(result.changed.is_empty());
    }

    #[test]
    fn test_removed_element() {
        let old = snapshot(
            "https://a.example/",
            vec![record("e1", "button", "A"), record("e2", "link", "B")],
        );
        let new = snapshot("https://a.example/", vec![record("e1", "button", "A")]);
        let result = diff(&old, &new);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].name, "B");
    }

    #[test]
    fn test_changed_value_detected() {
        let old = snapshot(
            "https://a.example/",
            vec![record("e1", "textbox", "Search")],
        );
        let mut after = record("e1", "textbox", "Search");
        after.value = "rust".to_string();
        let new = snapshot("https://a.example/", vec![after]);

        let result = diff(&old, &new);
        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.changed[0].after.value, "rust");
        assert!(result.added.is_empty());
    }

    #[test]
    fn test_changed_checked_detected() {
        let old = snapshot(
            "https://a.example/",
            vec![record("e1", "checkbox", "Agree")],
        );
        let mut after = record("e1", "checkbox", "Agree");
        after.checked = TriState::True;
        let new = snapshot("https://a.example/", vec![after]);
        assert_eq!(diff(&old, &new).changed.len(), 1);
    }

    #[test]
    fn test_duplicate_identity_position_tiebreak() {
        // Two buttons named "Add"; the second disappears.
        let old = snapshot(
            "https://a.example/",
            vec![
                record("e1", "button", "Add"),
                record("e2", "button", "Add"),
            ],
        );
        let new = snapshot("https://a.example/", vec![record("e1", "button", "Add")]);
        let result = diff(&old, &new);
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].ref_id, "e2");
    }
}
