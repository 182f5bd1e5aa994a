//! Prompt templates and snapshot rendering for the planner.

use snapshot_engine::Snapshot;

/// System prompt instructing the model on the action vocabulary and the
/// required JSON response shape.
pub const SYSTEM_PROMPT: &str = r#"You are a browser automation agent. You accomplish the user's goal through an iterative loop: each step you receive the current page as a list of interactive elements keyed by refs (e1, e2, ...) plus a memory of previous steps, and you answer with exactly one action.

## Refs
Refs are only valid for the current snapshot. After any page-changing action the elements are re-numbered; never reuse a ref from an earlier step.

## Actions
- navigate: {"url": "https://..."}
- click: {"ref": "e3"}
- type: {"ref": "e2", "text": "query", "clear": true}
- press: {"key": "Enter"}
- select: {"ref": "e4", "value": "option"}
- hover: {"ref": "e5"}
- scroll: {"direction": "down", "amount": 500}
- wait: {"seconds": 1}
- screenshot: {}
- read_text: {"ref": "e6"} (ref optional; omit for full page text)
- go_back: {}
- go_forward: {}
- done: {"final_message": "what was accomplished"}

## Response format
Respond with a single JSON object and nothing else:
{"action": "<name>", "args": {...}, "rationale": "<one short sentence>", "done": false}

Set "done": true with action "done" only when the goal is fully achieved or impossible; the final_message must state the outcome.

## Rules
- Use only refs present in the current element list.
- For search boxes, prefer type with the query followed by press Enter.
- If an action fails, try a different element or approach instead of repeating it.
"#;

/// Render a snapshot as the ref-keyed element list the model consumes.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!("URL: {}\n", snapshot.url));
    if !snapshot.title.is_empty() {
        out.push_str(&format!("Title: {}\n", snapshot.title));
    }
    out.push_str(&format!("Interactive elements ({}):\n", snapshot.elements.len()));

    for element in &snapshot.elements {
        out.push_str(&format!("[{}] <{}>", element.ref_id, element.role));
        if !element.name.is_empty() {
            out.push_str(&format!(" \"{}\"", element.name));
        }
        if !element.value.is_empty() {
            out.push_str(&format!(" value=\"{}\"", element.value));
        }
        if element.disabled.is_true() {
            out.push_str(" disabled");
        }
        if element.checked.is_true() {
            out.push_str(" checked");
        }
        out.push('\n');
    }

    if snapshot.truncated {
        out.push_str("(element list truncated)\n");
    }
    if snapshot.elements.is_empty() {
        out.push_str("(no interactive elements)\n");
    }
    out
}

/// Assemble the user message: goal, memory context, current page.
pub fn format_user_message(goal: &str, context: &str, snapshot: &Snapshot) -> String {
    let mut message = String::new();
    message.push_str("## Goal\n");
    message.push_str(goal);
    message.push('\n');

    if !context.trim().is_empty() {
        message.push_str("\n## Memory\n");
        message.push_str(context);
        if !context.ends_with('\n') {
            message.push('\n');
        }
    }

    message.push_str("\n## Current page\n");
    message.push_str(&render_snapshot(snapshot));
    message.push_str("\nRespond with the next action as a single JSON object.\n");
    message
}
