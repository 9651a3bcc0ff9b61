//! Unified error code contract for pulse crates.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that
//! callers can branch on stable machine-readable codes instead of
//! display strings, and so that diagnostic sinks log a consistent
//! format across engines.
//!
//! # Code Convention
//!
//! | Crate | Prefix | Example |
//! |-------|--------|---------|
//! | pulse-state | `STATE_` | `STATE_TYPE_MISMATCH` |
//! | pulse-bus | `BUS_` | `BUS_KEY_ABSENT` |
//! | pulse-action | `ACTION_` | `ACTION_SIGNATURE_CONFLICT` |
//! | pulse-data | `BAG_` | `BAG_DUPLICATE_KEY` |
//!
//! Codes are UPPER_SNAKE_CASE and stable once published; renaming a
//! code is a breaking change.
//!
//! # Recoverability
//!
//! `is_recoverable` answers "could the same call succeed later without
//! a code change?". Pulse engines run in-process with no transient
//! failure modes (no I/O, no timeouts), so most codes are permanent:
//! a signature mismatch will not fix itself on retry. A code is
//! recoverable only when ordinary program flow can clear it, for
//! example a key lookup that fails before the key is registered.
//!
//! # Example
//!
//! ```
//! use pulse_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum TreeError {
//!     InvalidPath,
//!     TypeMismatch,
//! }
//!
//! impl ErrorCode for TreeError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::InvalidPath => "STATE_INVALID_PATH",
//!             Self::TypeMismatch => "STATE_TYPE_MISMATCH",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         false
//!     }
//! }
//!
//! assert_eq!(TreeError::InvalidPath.code(), "STATE_INVALID_PATH");
//! ```

/// Machine-readable error code contract.
///
/// Implemented by every pulse error enum. Codes are the stable API for
/// programmatic error handling; `Display` strings are for humans and
/// may change between releases.
pub trait ErrorCode {
    /// Returns the stable UPPER_SNAKE_CASE code for this error,
    /// prefixed with the owning crate's namespace (`STATE_`, `BUS_`,
    /// `ACTION_`, `BAG_`).
    fn code(&self) -> &'static str;

    /// Returns whether ordinary program flow can clear this error so
    /// that the same call could succeed later.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error's code follows the pulse conventions.
///
/// Checks that the code is non-empty, UPPER_SNAKE_CASE, and carries
/// the expected crate prefix. Panics with a descriptive message on
/// violation. Intended for use in each crate's error tests.
///
/// # Example
///
/// ```
/// use pulse_types::{assert_error_code, ErrorCode};
///
/// #[derive(Debug)]
/// struct Missing;
///
/// impl ErrorCode for Missing {
///     fn code(&self) -> &'static str { "BAG_KEY_ABSENT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Missing, "BAG_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Asserts conventions for every variant of an error enum at once.
///
/// Pair this with an `all_variants()` helper in the error module's
/// tests so that newly added variants cannot silently skip the code
/// conventions.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum SampleError {
        Clearable,
        Permanent,
    }

    impl ErrorCode for SampleError {
        fn code(&self) -> &'static str {
            match self {
                Self::Clearable => "SAMPLE_CLEARABLE",
                Self::Permanent => "SAMPLE_PERMANENT",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Clearable)
        }
    }

    #[test]
    fn code_and_recoverability() {
        assert_eq!(SampleError::Clearable.code(), "SAMPLE_CLEARABLE");
        assert!(SampleError::Clearable.is_recoverable());
        assert!(!SampleError::Permanent.is_recoverable());
    }

    #[test]
    fn accepts_conforming_codes() {
        assert_error_codes(
            &[SampleError::Clearable, SampleError::Permanent],
            "SAMPLE_",
        );
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn rejects_wrong_prefix() {
        assert_error_code(&SampleError::Clearable, "OTHER_");
    }

    #[test]
    fn upper_snake_case_rules() {
        assert!(is_upper_snake_case("STATE_INVALID_PATH"));
        assert!(is_upper_snake_case("BUS_2_PHASE"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("state_invalid"));
        assert!(!is_upper_snake_case("_STATE"));
        assert!(!is_upper_snake_case("STATE_"));
        assert!(!is_upper_snake_case("STATE__X"));
    }
}
