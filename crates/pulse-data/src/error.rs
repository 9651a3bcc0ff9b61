//! Registry errors.
//!
//! All variants carry the stringified key plus enough type-name
//! context to diagnose a mismatch without re-querying the bag.
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`BagError::DuplicateKey`] | `BAG_DUPLICATE_KEY` | No |
//! | [`BagError::NullPointer`] | `BAG_NULL_POINTER` | No |
//! | [`BagError::KeyAbsent`] | `BAG_KEY_ABSENT` | Yes |
//! | [`BagError::TypeMismatch`] | `BAG_TYPE_MISMATCH` | No |

use pulse_types::ErrorCode;
use thiserror::Error;

/// Failure of a [`ValueBag`](crate::ValueBag) operation.
#[derive(Debug, Clone, Error)]
pub enum BagError {
    /// `register` on a key that already has an entry. The existing
    /// entry is left untouched.
    #[error("key '{key}' already registered with type {registered}")]
    DuplicateKey {
        /// Stringified key.
        key: String,
        /// Type name of the existing entry.
        registered: &'static str,
    },

    /// `register` with a null pointer.
    #[error("refusing to register null pointer for key '{key}'")]
    NullPointer {
        /// Stringified key.
        key: String,
    },

    /// Lookup on a key with no entry. Recoverable: registering the
    /// key makes the same lookup succeed.
    #[error("no entry for key '{key}'")]
    KeyAbsent {
        /// Stringified key.
        key: String,
    },

    /// Lookup at a type other than the one registered.
    #[error(
        "type mismatch for key '{key}': registered {registered}, requested {requested}"
    )]
    TypeMismatch {
        /// Stringified key.
        key: String,
        /// Type name recorded at registration.
        registered: &'static str,
        /// Type name the caller asked for.
        requested: &'static str,
    },
}

impl ErrorCode for BagError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateKey { .. } => "BAG_DUPLICATE_KEY",
            Self::NullPointer { .. } => "BAG_NULL_POINTER",
            Self::KeyAbsent { .. } => "BAG_KEY_ABSENT",
            Self::TypeMismatch { .. } => "BAG_TYPE_MISMATCH",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::KeyAbsent { .. })
    }
}
