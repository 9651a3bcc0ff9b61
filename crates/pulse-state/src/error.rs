//! State tree errors.
//!
//! Tree operations report failures through the diagnostic sink and
//! boolean/`Option` returns rather than `Result`s; this enum is the
//! structured form those reports are built from.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`StateError::InvalidPath`] | `STATE_INVALID_PATH` | No |
//! | [`StateError::TypeMismatch`] | `STATE_TYPE_MISMATCH` | No |
//! | [`StateError::NotFound`] | `STATE_NOT_FOUND` | Yes |

use pulse_types::ErrorCode;
use thiserror::Error;

use crate::node::NodeKind;

/// Failure of a state tree operation.
#[derive(Debug, Clone, Error)]
pub enum StateError {
    /// An operation that needs at least one path segment got an
    /// empty path.
    #[error("invalid path '{path}' for {operation}")]
    InvalidPath {
        /// The offending path as given by the caller.
        path: String,
        /// Short operation label, e.g. `"set"` or `"move"`.
        operation: &'static str,
    },

    /// A write hit an existing node of a different kind. The write
    /// still proceeds by replacement; this error is diagnostic.
    #[error("type mismatch at '{path}': found {found:?}, writing {writing:?}")]
    TypeMismatch {
        /// Path of the conflicting node.
        path: String,
        /// Kind already stored at the path.
        found: NodeKind,
        /// Kind the caller is writing.
        writing: NodeKind,
    },

    /// A strict operation addressed a path with no matching node.
    /// Recoverable: creating the node makes the call succeed.
    #[error("no node at '{path}' for {operation}")]
    NotFound {
        /// The addressed path.
        path: String,
        /// Short operation label.
        operation: &'static str,
    },
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath { .. } => "STATE_INVALID_PATH",
            Self::TypeMismatch { .. } => "STATE_TYPE_MISMATCH",
            Self::NotFound { .. } => "STATE_NOT_FOUND",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
