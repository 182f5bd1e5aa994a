//! Per-iteration step records and action outcome classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The executor's verdict on an action attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Ok,
    Transient,
    Permanent,
    Timeout,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Ok => "ok",
            Classification::Transient => "transient",
            Classification::Permanent => "permanent",
            Classification::Timeout => "timeout",
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Classification::Ok)
    }
}

/// Result of one executor dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    /// Short success message or the last error text.
    pub observation: String,
    pub retries_used: u32,
    pub classification: Classification,
    /// Image payload from a screenshot action; carried to the step record so
    /// the memory manager's retention policy can prune the bytes.
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,
}

impl ActionOutcome {
    pub fn ok(observation: impl Into<String>, retries_used: u32) -> Self {
        Self {
            success: true,
            observation: observation.into(),
            retries_used,
            classification: Classification::Ok,
            screenshot: None,
        }
    }

    pub fn failed(
        classification: Classification,
        observation: impl Into<String>,
        retries_used: u32,
    ) -> Self {
        Self {
            success: false,
            observation: observation.into(),
            retries_used,
            classification,
            screenshot: None,
        }
    }

    pub fn permanent(observation: impl Into<String>) -> Self {
        Self::failed(Classification::Permanent, observation, 0)
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = Some(bytes);
        self
    }
}

/// Screenshot attachment on a step record.
///
/// Compaction drops the bytes but keeps the record so history still shows
/// that a capture happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepScreenshot {
    pub captured_at: DateTime<Utc>,
    #[serde(skip)]
    pub bytes: Option<Vec<u8>>,
}

impl StepScreenshot {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            captured_at: Utc::now(),
            bytes: Some(bytes),
        }
    }

    pub fn drop_bytes(&mut self) {
        self.bytes = None;
    }
}

/// One entry per agent loop iteration. Never mutated after recording,
/// except for screenshot byte pruning during compaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_number: u32,
    pub action: String,
    pub args_summary: String,
    pub observation: String,
    pub success: bool,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<StepScreenshot>,
}

impl StepRecord {
    pub fn new(
        step_number: u32,
        action: impl Into<String>,
        args_summary: impl Into<String>,
        observation: impl Into<String>,
        success: bool,
        duration_ms: u64,
    ) -> Self {
        Self {
            step_number,
            action: action.into(),
            args_summary: args_summary.into(),
            observation: observation.into(),
            success,
            duration_ms,
            timestamp: Utc::now(),
            screenshot: None,
        }
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = Some(StepScreenshot::new(bytes));
        self
    }

    /// Outcome keyword used in one-line summaries.
    pub fn outcome_keyword(&self) -> &'static str {
        if self.success {
            "ok"
        } else {
            "failed"
        }
    }
}
