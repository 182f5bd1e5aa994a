//! The closed action vocabulary the agent loop recognizes.
//!
//! Actions arrive from the planner as an `(action, args)` pair; `Action::parse`
//! turns that into a typed variant or a permanent parse failure. The executor
//! dispatches on the variant directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Scroll direction for scroll actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

/// One action from the fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "args", rename_all = "snake_case")]
pub enum Action {
    Navigate {
        url: String,
    },
    Click {
        #[serde(rename = "ref")]
        target: String,
    },
    #[serde(rename = "type")]
    TypeText {
        #[serde(rename = "ref")]
        target: String,
        text: String,
        clear: bool,
    },
    Press {
        key: String,
    },
    Select {
        #[serde(rename = "ref")]
        target: String,
        value: String,
    },
    Hover {
        #[serde(rename = "ref")]
        target: String,
    },
    Scroll {
        direction: ScrollDirection,
        amount: i32,
    },
    Wait {
        seconds: f64,
    },
    Screenshot,
    ReadText {
        #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    GoBack,
    GoForward,
    Done {
        message: String,
    },
}

/// Failure to turn an `(action, args)` pair into a typed action.
///
/// Both variants are permanent from the executor's point of view.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionParseError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid arguments for {action}: {reason}")]
    InvalidArgs { action: String, reason: String },
}

impl ActionParseError {
    fn invalid(action: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgs {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

impl Action {
    /// Canonical action name as it appears in planner output.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Navigate { .. } => "navigate",
            Action::Click { .. } => "click",
            Action::TypeText { .. } => "type",
            Action::Press { .. } => "press",
            Action::Select { .. } => "select",
            Action::Hover { .. } => "hover",
            Action::Scroll { .. } => "scroll",
            Action::Wait { .. } => "wait",
            Action::Screenshot => "screenshot",
            Action::ReadText { .. } => "read_text",
            Action::GoBack => "go_back",
            Action::GoForward => "go_forward",
            Action::Done { .. } => "done",
        }
    }

    /// Whether a successful execution may have mutated the DOM.
    ///
    /// Mutating actions invalidate the snapshot cache afterwards.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Action::Navigate { .. }
                | Action::Click { .. }
                | Action::TypeText { .. }
                | Action::Press { .. }
                | Action::Select { .. }
                | Action::GoBack
                | Action::GoForward
        )
    }

    /// Parse a planner-supplied `(action, args)` pair into a typed action.
    pub fn parse(name: &str, args: &Value) -> Result<Action, ActionParseError> {
        match name {
            "navigate" => Ok(Action::Navigate {
                url: require_str(name, args, "url")?,
            }),
            "click" => Ok(Action::Click {
                target: require_str(name, args, "ref")?,
            }),
            "type" => Ok(Action::TypeText {
                target: require_str(name, args, "ref")?,
                text: require_str(name, args, "text")?,
                clear: args.get("clear").and_then(Value::as_bool).unwrap_or(true),
            }),
            "press" => Ok(Action::Press {
                key: require_str(name, args, "key")?,
            }),
            "select" => Ok(Action::Select {
                target: require_str(name, args, "ref")?,
                value: require_str(name, args, "value")?,
            }),
            "hover" => Ok(Action::Hover {
                target: require_str(name, args, "ref")?,
            }),
            "scroll" => {
                let direction = match require_str(name, args, "direction")?.to_lowercase().as_str()
                {
                    "up" => ScrollDirection::Up,
                    "down" => ScrollDirection::Down,
                    "left" => ScrollDirection::Left,
                    "right" => ScrollDirection::Right,
                    other => {
                        return Err(ActionParseError::invalid(
                            name,
                            format!("unknown scroll direction '{other}'"),
                        ))
                    }
                };
                let amount = args
                    .get("amount")
                    .and_then(Value::as_i64)
                    .unwrap_or(500);
                let amount = i32::try_from(amount)
                    .map_err(|_| ActionParseError::invalid(name, "amount out of range"))?;
                Ok(Action::Scroll { direction, amount })
            }
            "wait" => {
                let seconds = args
                    .get("seconds")
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0);
                Ok(Action::Wait { seconds })
            }
            "screenshot" => Ok(Action::Screenshot),
            "read_text" => Ok(Action::ReadText {
                target: args
                    .get("ref")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            "go_back" => Ok(Action::GoBack),
            "go_forward" => Ok(Action::GoForward),
            "done" => {
                let message = args
                    .get("final_message")
                    .or_else(|| args.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("task complete")
                    .to_string();
                Ok(Action::Done { message })
            }
            other => Err(ActionParseError::UnknownAction(other.to_string())),
        }
    }

    /// Compact one-line rendering used in history summaries.
    pub fn summary(&self) -> String {
        match self {
            Action::Navigate { url } => format!("navigate({})", truncate(url, 60)),
            Action::Click { target } => format!("click({target})"),
            Action::TypeText { target, text, .. } => {
                format!("type({target}, \"{}\")", truncate(text, 30))
            }
            Action::Press { key } => format!("press({key})"),
            Action::Select { target, value } => {
                format!("select({target}, {})", truncate(value, 30))
            }
            Action::Hover { target } => format!("hover({target})"),
            Action::Scroll { direction, amount } => {
                format!("scroll({}, {amount})", direction.as_str())
            }
            Action::Wait { seconds } => format!("wait({seconds}s)"),
            Action::Screenshot => "screenshot()".to_string(),
            Action::ReadText { target: Some(t) } => format!("read_text({t})"),
            Action::ReadText { target: None } => "read_text()".to_string(),
            Action::GoBack => "go_back()".to_string(),
            Action::GoForward => "go_forward()".to_string(),
            Action::Done { message } => format!("done({})", truncate(message, 40)),
        }
    }
}

fn require_str(action: &str, args: &Value, key: &str) -> Result<String, ActionParseError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ActionParseError::invalid(action, format!("missing string field '{key}'")))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
