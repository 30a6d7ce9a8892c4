// SPDX-FileCopyrightText: 2026 Smsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the smsift agent.

use thiserror::Error;

/// The primary error type used across all smsift services and adapters.
#[derive(Debug, Error)]
pub enum SmsiftError {
    /// Configuration errors (invalid TOML, missing required fields, bad thresholds).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure). Retryable.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem errors around classifier artifacts. Retryable.
    #[error("io error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness invariant would be violated (duplicate review, concurrent activation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller supplied invalid input (empty text, out-of-range threshold).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation requested in a state that cannot satisfy it (e.g. empty training set).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Scoring requested with no active model, or predict before train/load.
    #[error("no active model loaded")]
    NotReady,

    /// The classifier failed during training. The prior active version is untouched.
    #[error("training failed: {0}")]
    TrainingFailed(String),

    /// Cancellation was signalled; the operation unwound without further writes.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SmsiftError {
    /// Whether a runner may retry the whole tick after its error delay.
    pub fn is_transient(&self) -> bool {
        matches!(self, SmsiftError::Storage { .. } | SmsiftError::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds() {
        let storage = SmsiftError::Storage {
            source: Box::new(std::io::Error::other("disk")),
        };
        let io = SmsiftError::Io {
            source: std::io::Error::other("artifact"),
        };
        assert!(storage.is_transient());
        assert!(io.is_transient());
        assert!(!SmsiftError::NotReady.is_transient());
        assert!(!SmsiftError::Cancelled.is_transient());
        assert!(!SmsiftError::Conflict("dup".into()).is_transient());
    }

    #[test]
    fn display_messages() {
        let e = SmsiftError::NotFound("message 42".to_string());
        assert_eq!(e.to_string(), "not found: message 42");
        assert_eq!(SmsiftError::NotReady.to_string(), "no active model loaded");
    }
}
