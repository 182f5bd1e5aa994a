//! Error types for the snapshot engine.

use thiserror::Error;

use axpilot_core_types::DriverError;

/// Errors surfaced by `SnapshotEngine::get`.
#[derive(Debug, Error, Clone)]
pub enum SnapshotError {
    /// The driver is gone; the run cannot continue.
    #[error("driver unavailable: {0}")]
    DriverUnavailable(String),

    /// The driver did not answer within the snapshot deadline; the caller
    /// may retry.
    #[error("snapshot timeout: {0}")]
    Timeout(String),
}

impl SnapshotError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SnapshotError::DriverUnavailable(_))
    }
}

impl From<DriverError> for SnapshotError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Timeout(message) => SnapshotError::Timeout(message),
            other => SnapshotError::DriverUnavailable(other.to_string()),
        }
    }
}
