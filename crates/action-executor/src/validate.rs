//! Input validation before dispatch.
//!
//! Rejections are permanent and never reach the driver.

use axpilot_core_types::Action;
use url::Url;

use crate::config::ExecutorConfig;

const MAX_REF_LEN: usize = 32;
const MIN_WAIT_SECONDS: f64 = 0.1;
const MAX_WAIT_SECONDS: f64 = 300.0;

/// Check an action's arguments against the configured limits.
pub fn validate(action: &Action, config: &ExecutorConfig) -> Result<(), String> {
    match action {
        Action::Navigate { url } => validate_url(url, config),
        Action::Click { target } | Action::Hover { target } => validate_ref(target),
        Action::TypeText { target, text, .. } => {
            validate_ref(target)?;
            if text.chars().count() > config.max_text_len {
                return Err(format!(
                    "text argument exceeds {} characters",
                    config.max_text_len
                ));
            }
            Ok(())
        }
        Action::Press { key } => {
            if key.trim().is_empty() {
                Err("key must not be empty".to_string())
            } else if key.chars().count() > MAX_REF_LEN {
                Err("key is too long".to_string())
            } else {
                Ok(())
            }
        }
        Action::Select { target, value } => {
            validate_ref(target)?;
            if value.chars().count() > config.max_text_len {
                return Err(format!(
                    "select value exceeds {} characters",
                    config.max_text_len
                ));
            }
            Ok(())
        }
        Action::Wait { seconds } => {
            if !seconds.is_finite() || *seconds < MIN_WAIT_SECONDS || *seconds > MAX_WAIT_SECONDS {
                Err(format!(
                    "wait seconds must be within [{MIN_WAIT_SECONDS}, {MAX_WAIT_SECONDS}]"
                ))
            } else {
                Ok(())
            }
        }
        Action::ReadText { target: Some(target) } => validate_ref(target),
        Action::Scroll { .. }
        | Action::Screenshot
        | Action::ReadText { target: None }
        | Action::GoBack
        | Action::GoForward
        | Action::Done { .. } => Ok(()),
    }
}

fn validate_url(raw: &str, config: &ExecutorConfig) -> Result<(), String> {
    if raw.chars().count() > config.max_url_len {
        return Err(format!("url exceeds {} characters", config.max_url_len));
    }
    let parsed = Url::parse(raw).map_err(|err| format!("invalid url: {err}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported url scheme '{other}'")),
    }
}

fn validate_ref(target: &str) -> Result<(), String> {
    if target.trim().is_empty() {
        Err("ref must not be empty".to_string())
    } else if target.chars().count() > MAX_REF_LEN {
        Err("ref is too long".to_string())
    } else {
        Ok(())
    }
}
