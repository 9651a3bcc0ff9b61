//! Pipeline errors.
//!
//! Registration returns `Result<ActionHandle, ActionError>`; the only
//! hard failure is a signature conflict in non-overload mode. Execute
//! never fails as a `Result` (its diagnostics land in the returned
//! `ActionResult`), but the messages are built from these variants.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ActionError::KeyAbsent`] | `ACTION_KEY_ABSENT` | Yes |
//! | [`ActionError::SignatureMismatch`] | `ACTION_SIGNATURE_MISMATCH` | No |
//! | [`ActionError::NoMatchingOverload`] | `ACTION_NO_MATCHING_OVERLOAD` | No |
//! | [`ActionError::SignatureConflict`] | `ACTION_SIGNATURE_CONFLICT` | No |
//!
//! [`ProcessError`] is different in kind: it is the error *processors
//! return* to abort a pipeline run, not an error of the pipeline
//! itself.

use pulse_types::ErrorCode;
use thiserror::Error;

/// Failure returned by a processor to abort the pipeline.
///
/// The message is recorded in the run's `ActionResult::error_message`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProcessError {
    message: String,
}

impl ProcessError {
    /// Creates a process failure with a diagnostic message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ProcessError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProcessError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Failure of a pipeline registration or key/signature resolution.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// Execute on a key with no registered container. Recoverable:
    /// registering a handler makes the same execute run.
    #[error("action not found: {key}")]
    KeyAbsent {
        /// Debug rendering of the key.
        key: String,
    },

    /// Non-overload execute whose arguments do not match the
    /// container's fixed signature.
    #[error("action parameter type mismatch: expected '{expected}', got '{got}'")]
    SignatureMismatch {
        /// The container's fixed signature.
        expected: String,
        /// Signature of the arguments passed to execute.
        got: String,
    },

    /// Overload-mode execute with no container for the argument
    /// signature.
    #[error("no matching parameter types for action {key}: got '{got}'")]
    NoMatchingOverload {
        /// Debug rendering of the key.
        key: String,
        /// Signature of the arguments passed to execute.
        got: String,
    },

    /// Non-overload registration with a signature different from the
    /// container's fixed one. The registration is refused.
    #[error(
        "action {key} is fixed to signature '{existing}'; cannot register handler with '{requested}'"
    )]
    SignatureConflict {
        /// Debug rendering of the key.
        key: String,
        /// Signature fixed by the first registration.
        existing: String,
        /// Signature of the refused registration.
        requested: String,
    },
}

impl ErrorCode for ActionError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyAbsent { .. } => "ACTION_KEY_ABSENT",
            Self::SignatureMismatch { .. } => "ACTION_SIGNATURE_MISMATCH",
            Self::NoMatchingOverload { .. } => "ACTION_NO_MATCHING_OVERLOAD",
            Self::SignatureConflict { .. } => "ACTION_SIGNATURE_CONFLICT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::KeyAbsent { .. })
    }
}
