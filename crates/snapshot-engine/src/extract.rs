//! Element extraction from the driver's accessibility tree.
//!
//! Walks the tree in document order, keeps interactive roles, assigns refs
//! `e1, e2, ...` in traversal order, augments from the DOM-query fallback
//! when the tree yields too few elements, and bounds both element count and
//! text lengths.

use axpilot_core_types::{is_interactive_role, AxNode, ElementRecord};

use crate::config::SnapshotConfig;

/// Fixed selector set for the DOM-query fallback path.
pub const FALLBACK_SELECTORS: &[&str] = &[
    "button",
    "a[href]",
    "input[type=text]",
    "input[type=search]",
    "input[type=checkbox]",
    "input[type=radio]",
    "textarea",
    "select",
    "[role=button]",
    "[role=searchbox]",
];

/// Headings are only kept this close to the tree root.
const MAX_HEADING_DEPTH: u32 = 2;

/// Working state of one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    pub elements: Vec<ElementRecord>,
    pub truncated: bool,
    pub fallback_used: bool,
}

/// Extract interactive elements from an accessibility tree.
pub fn from_tree(tree: &AxNode, config: &SnapshotConfig) -> Extraction {
    let mut extraction = Extraction::default();
    walk(tree, 0, config, &mut extraction);
    extraction
}

fn walk(node: &AxNode, depth: u32, config: &SnapshotConfig, out: &mut Extraction) {
    if keep(node, depth, config) {
        push_element(node, config, out);
    }
    for child in &node.children {
        walk(child, depth + 1, config, out);
    }
}

fn keep(node: &AxNode, depth: u32, config: &SnapshotConfig) -> bool {
    if node.role == "heading" {
        return depth <= MAX_HEADING_DEPTH;
    }
    if node.role == "image" {
        return !node.name.trim().is_empty();
    }
    is_interactive_role(&node.role) || config.extra_roles.iter().any(|r| r == &node.role)
}

/// Augment from fallback nodes, skipping anything the tree already produced.
/// Refs continue the existing sequence.
pub fn augment(extraction: &mut Extraction, fallback_nodes: &[AxNode], config: &SnapshotConfig) {
    let mut added = false;
    for node in fallback_nodes {
        let duplicate = extraction.elements.iter().any(|existing| {
            existing.role == node.role && existing.name == node.name && existing.value == node.value
        });
        if duplicate {
            continue;
        }
        push_element(node, config, extraction);
        added = true;
    }
    if added {
        extraction.fallback_used = true;
    }
}

/// Truncate the element list to the configured cap, in traversal order.
pub fn bound(extraction: &mut Extraction, max_elements: usize) {
    if extraction.elements.len() > max_elements {
        extraction.elements.truncate(max_elements);
        extraction.truncated = true;
    }
}

fn push_element(node: &AxNode, config: &SnapshotConfig, out: &mut Extraction) {
    let ref_id = format!("e{}", out.elements.len() + 1);
    out.elements.push(ElementRecord {
        ref_id,
        role: node.role.clone(),
        name: limit_text(&node.name, config.max_text_len),
        value: limit_text(&node.value, config.max_text_len),
        disabled: node.disabled,
        checked: node.checked,
        selected: node.selected,
        bbox: node.bbox,
    });
}

/// Truncate to `max_chars` characters with a trailing ellipsis.
fn limit_text(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let kept: String = trimmed.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axpilot_core_types::AxNode;

    fn config() -> SnapshotConfig {
        SnapshotConfig::default()
    }

    fn sample_tree() -> AxNode {
        AxNode::new("document", "root").with_children(vec![
            AxNode::new("heading", "Welcome"),
            AxNode::new("generic", "wrapper").with_children(vec![
                AxNode::new("searchbox", "Search"),
                AxNode::new("button", "Go"),
                AxNode::new("paragraph", "ignored text"),
            ]),
            AxNode::new("link", "Docs"),
        ])
    }

    #[test]
    fn test_refs_assigned_in_document_order() {
        let extraction = from_tree(&sample_tree(), &config());
        let refs: Vec<&str> = extraction.elements.iter().map(|e| e.ref_id.as_str()).collect();
        assert_eq!(refs, vec!["e1", "e2", "e3", "e4"]);
        assert_eq!(extraction.elements[0].role, "heading");
        assert_eq!(extraction.elements[1].role, "searchbox");
        assert_eq!(extraction.elements[3].role, "link");
    }

    #[test]
    fn test_deep_headings_skipped() {
        let tree = AxNode::new("document", "").with_children(vec![AxNode::new("generic", "")
            .with_children(vec![AxNode::new("generic", "").with_children(vec![AxNode::new(
                "heading",
                "Deep",
            )])])]);
        let extraction = from_tree(&tree, &config());
        assert!(extraction.elements.is_empty());
    }

    #[test]
    fn test_nameless_images_skipped() {
        let tree = AxNode::new("document", "").with_children(vec![
            AxNode::new("image", ""),
            AxNode::new("image", "Logo"),
        ]);
        let extraction = from_tree(&tree, &config());
        assert_eq!(extraction.elements.len(), 1);
        assert_eq!(extraction.elements[0].name, "Logo");
    }

    #[test]
    fn test_fallback_skips_duplicates_and_continues_refs() {
        let mut extraction = from_tree(&sample_tree(), &config());
        let fallback = vec![
            AxNode::new("button", "Go"),
            AxNode::new("button", "Hidden submit"),
        ];
        augment(&mut extraction, &fallback, &config());

        assert!(extraction.fallback_used);
        assert_eq!(extraction.elements.len(), 5);
        assert_eq!(extraction.elements[4].ref_id, "e5");
        assert_eq!(extraction.elements[4].name, "Hidden submit");
    }

    #[test]
    fn test_fallback_with_only_duplicates_not_marked() {
        let mut extraction = from_tree(&sample_tree(), &config());
        augment(&mut extraction, &[AxNode::new("button", "Go")], &config());
        assert!(!extraction.fallback_used);
        assert_eq!(extraction.elements.len(), 4);
    }

    #[test]
    fn test_bounding_sets_truncated() {
        let children: Vec<AxNode> = (0..10)
            .map(|i| AxNode::new("button", format!("b{i}")))
            .collect();
        let tree = AxNode::new("document", "").with_children(children);
        let mut extraction = from_tree(&tree, &config());
        bound(&mut extraction, 4);
        assert!(extraction.truncated);
        assert_eq!(extraction.elements.len(), 4);
        assert_eq!(extraction.elements[3].ref_id, "e4");
    }

    #[test]
    fn test_text_limited_with_ellipsis() {
        let tree = AxNode::new("document", "")
            .with_children(vec![AxNode::new("button", "x".repeat(300))]);
        let extraction = from_tree(&tree, &config());
        let name = &extraction.elements[0].name;
        assert_eq!(name.chars().count(), 200);
        assert!(name.ends_with("..."));
    }

    #[test]
    fn test_extra_roles_allowlist() {
        let mut cfg = config();
        cfg.extra_roles.push("listitem".to_string());
        let tree =
            AxNode::new("document", "").with_children(vec![AxNode::new("listitem", "Entry")]);
        let extraction = from_tree(&tree, &cfg);
        assert_eq!(extraction.elements.len(), 1);
    }
}
