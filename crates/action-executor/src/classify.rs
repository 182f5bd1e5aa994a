//! Driver error classification.
//!
//! Transient errors are retried with backoff; permanent errors return
//! immediately. Typed variants classify directly; protocol errors fall back
//! to message matching.

use axpilot_core_types::{Classification, DriverError};

const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "connection reset",
    "temporarily unavailable",
    "busy",
];

pub fn classify(err: &DriverError) -> Classification {
    match err {
        DriverError::Timeout(_) => Classification::Timeout,
        DriverError::Network(_) | DriverError::Busy(_) => Classification::Transient,
        DriverError::ElementNotFound(_)
        | DriverError::ElementNotVisible(_)
        | DriverError::ElementDetached(_)
        | DriverError::InvalidRef(_)
        | DriverError::Unavailable(_) => Classification::Permanent,
        DriverError::Protocol(message) => {
            let lowered = message.to_lowercase();
            if TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
                Classification::Transient
            } else {
                Classification::Permanent
            }
        }
    }
}

/// Whether another attempt may succeed.
pub fn is_retryable(classification: Classification) -> bool {
    matches!(
        classification,
        Classification::Transient | Classification::Timeout
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_variants() {
        assert_eq!(
            classify(&DriverError::Timeout("t".into())),
            Classification::Timeout
        );
        assert_eq!(
            classify(&DriverError::Network("n".into())),
            Classification::Transient
        );
        assert_eq!(
            classify(&DriverError::ElementNotFound("e9".into())),
            Classification::Permanent
        );
        assert_eq!(
            classify(&DriverError::Unavailable("gone".into())),
            Classification::Permanent
        );
    }

    #[test]
    fn test_protocol_message_matching() {
        assert_eq!(
            classify(&DriverError::Protocol("target temporarily unavailable".into())),
            Classification::Transient
        );
        assert_eq!(
            classify(&DriverError::Protocol("connection reset by peer".into())),
            Classification::Transient
        );
        assert_eq!(
            classify(&DriverError::Protocol("invalid selector syntax".into())),
            Classification::Permanent
        );
    }

    #[test]
    fn test_retryable_set() {
        assert!(is_retryable(Classification::Transient));
        assert!(is_retryable(Classification::Timeout));
        assert!(!is_retryable(Classification::Permanent));
        assert!(!is_retryable(Classification::Ok));
    }
}
