//! Bus errors.
//!
//! Publish failures are reported through [`PublishResult`]
//! (`pulse_bus::PublishResult`) rather than `Result` returns; these
//! variants are the structured form behind the result's
//! `error_message` and the diagnostic sink.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`BusError::KeyAbsent`] | `BUS_KEY_ABSENT` | Yes |
//! | [`BusError::SignatureMismatch`] | `BUS_SIGNATURE_MISMATCH` | No |
//! | [`BusError::AllHandlersFailed`] | `BUS_ALL_HANDLERS_FAILED` | No |

use pulse_types::ErrorCode;
use thiserror::Error;

use crate::SubscriptionMode;

/// Failure of a publish.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// No handler is registered for the key in the published mode.
    /// Recoverable: subscribing makes the same publish succeed.
    #[error("no {mode} subscriber for key {key}")]
    KeyAbsent {
        /// Debug rendering of the key.
        key: String,
        /// Mode the publish ran in.
        mode: SubscriptionMode,
    },

    /// A handler's signature does not match the published arguments.
    #[error("signature mismatch: published '{published}', handler expects '{expected}'")]
    SignatureMismatch {
        /// Signature of the published arguments.
        published: String,
        /// Signature the handler declared.
        expected: String,
    },

    /// Every candidate handler was skipped or rejected.
    #[error(
        "all {total} subscribers failed; published '{published}', expected one of [{}]",
        expected.join("; ")
    )]
    AllHandlersFailed {
        /// Handlers considered.
        total: usize,
        /// Signature of the published arguments.
        published: String,
        /// Signatures the handlers would have accepted.
        expected: Vec<String>,
    },
}

impl ErrorCode for BusError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyAbsent { .. } => "BUS_KEY_ABSENT",
            Self::SignatureMismatch { .. } => "BUS_SIGNATURE_MISMATCH",
            Self::AllHandlersFailed { .. } => "BUS_ALL_HANDLERS_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::KeyAbsent { .. })
    }
}
