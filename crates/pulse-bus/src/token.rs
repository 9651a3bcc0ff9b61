//! Subscription tokens.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle identifying one subscription.
///
/// Tokens are 128-bit random ids; equality and hashing are by raw
/// bits. The nil id is reserved as the invalid token and is never
/// issued.
///
/// # Example
///
/// ```
/// use pulse_bus::SubscriberId;
///
/// let token = SubscriberId::generate();
/// assert!(token.is_valid());
/// assert!(!SubscriberId::invalid().is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Issues a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The reserved invalid token.
    #[must_use]
    pub fn invalid() -> Self {
        Self(Uuid::nil())
    }

    /// Whether this token could have been issued by a bus.
    #[must_use]
    pub fn is_valid(self) -> bool {
        !self.0.is_nil()
    }

    /// Raw id bits.
    #[must_use]
    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_valid() {
        let a = SubscriberId::generate();
        let b = SubscriberId::generate();
        assert_ne!(a, b);
        assert!(a.is_valid());
    }

    #[test]
    fn invalid_token_is_nil() {
        let invalid = SubscriberId::invalid();
        assert!(!invalid.is_valid());
        assert_eq!(invalid, SubscriberId::invalid());
    }

    #[test]
    fn display_is_prefixed() {
        let token = SubscriberId::generate();
        let shown = token.to_string();
        assert!(shown.starts_with("sub:"));
        assert!(shown.contains(&token.uuid().to_string()));
    }
}
