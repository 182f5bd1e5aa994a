//! Element records extracted from the accessibility tree.

use serde::{Deserialize, Serialize};

/// Semantic roles the snapshot engine indexes by default.
///
/// Headings are additionally restricted to the top levels of the tree and
/// images require a non-empty accessible name; those rules live in the
/// extractor, not here.
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "textbox",
    "checkbox",
    "combobox",
    "searchbox",
    "option",
    "radio",
    "menuitem",
    "tab",
    "heading",
    "image",
];

/// Check whether a role belongs to the default interactive set.
pub fn is_interactive_role(role: &str) -> bool {
    INTERACTIVE_ROLES.contains(&role)
}

/// Tri-state element property (true / false / not exposed by the driver).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    True,
    False,
    #[default]
    Unset,
}

impl TriState {
    pub fn is_true(self) -> bool {
        matches!(self, TriState::True)
    }

    /// Convert from an optional boolean as exposed by driver payloads.
    pub fn from_option(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::True,
            Some(false) => TriState::False,
            None => TriState::Unset,
        }
    }
}

/// Element coordinates, present only when the driver exposes layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One interactive element within a single snapshot.
///
/// `ref_id` is an opaque short identifier (`e1`, `e2`, ...) valid only until
/// the next fresh snapshot over the same page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub ref_id: String,
    pub role: String,
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub disabled: TriState,
    #[serde(default)]
    pub checked: TriState,
    #[serde(default)]
    pub selected: TriState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

impl ElementRecord {
    pub fn new(ref_id: impl Into<String>, role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            role: role.into(),
            name: name.into(),
            value: String::new(),
            disabled: TriState::Unset,
            checked: TriState::Unset,
            selected: TriState::Unset,
            bbox: None,
        }
    }

    /// The identity tuple used for snapshot equality and diff joins.
    pub fn state_tuple(&self) -> (&str, &str, &str, TriState, TriState) {
        (
            &self.role,
            &self.name,
            &self.value,
            self.disabled,
            self.checked,
        )
    }

    /// Two records describe the same element state (ref ids excluded).
    pub fn same_state(&self, other: &ElementRecord) -> bool {
        self.state_tuple() == other.state_tuple()
    }

    /// Diff join key: role and accessible name.
    pub fn identity(&self) -> (&str, &str) {
        (&self.role, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_role_membership() {
        assert!(is_interactive_role("button"));
        assert!(is_interactive_role("searchbox"));
        assert!(!is_interactive_role("paragraph"));
    }

    #[test]
    fn test_state_tuple_ignores_ref() {
        let mut a = ElementRecord::new("e1", "button", "Submit");
        let mut b = ElementRecord::new("e9", "button", "Submit");
        assert!(a.same_state(&b));

        b.value = "x".to_string();
        assert!(!a.same_state(&b));

        b.value.clear();
        a.checked = TriState::True;
        assert!(!a.same_state(&b));
    }

    #[test]
    fn test_tristate_from_option() {
        assert_eq!(TriState::from_option(Some(true)), TriState::True);
        assert_eq!(TriState::from_option(Some(false)), TriState::False);
        assert_eq!(TriState::from_option(None), TriState::Unset);
    }
}
