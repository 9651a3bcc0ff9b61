//! Runtime fingerprints of argument tuples.
//!
//! A [`Signature`] is the canonical representation of a payload
//! tuple's types: an ordered list of [`TypeId`]s plus the matching
//! type names for diagnostics. Two signatures compare equal iff their
//! element types match pairwise; that equality is the whole routing
//! contract for overloaded handlers.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered type fingerprint of an argument tuple.
///
/// Equality and hashing use the [`TypeId`]s only; the names ride
/// along for error messages and statistics output.
///
/// # Example
///
/// ```
/// use pulse_types::{ArgTuple, Signature};
///
/// let ints: Signature = <(i32, i32)>::signature();
/// let mixed: Signature = <(i32, f32)>::signature();
///
/// assert_eq!(ints, <(i32, i32)>::signature());
/// assert_ne!(ints, mixed);
/// assert_eq!(ints.arity(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Signature {
    ids: Vec<TypeId>,
    names: Vec<&'static str>,
}

impl Signature {
    /// Builds a signature from parallel id/name lists.
    ///
    /// Used by the [`ArgTuple`](crate::ArgTuple) impls; not intended
    /// to be called with mismatched lists.
    #[must_use]
    pub fn from_parts(ids: Vec<TypeId>, names: Vec<&'static str>) -> Self {
        debug_assert_eq!(ids.len(), names.len());
        Self { ids, names }
    }

    /// Number of elements in the fingerprinted tuple.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.ids.len()
    }

    /// Type names of the elements, in tuple order.
    #[must_use]
    pub fn type_names(&self) -> &[&'static str] {
        &self.names
    }

    /// Whether `other` routes to the same handlers: equal arity and
    /// pairwise-equal element types.
    #[must_use]
    pub fn matches(&self, other: &Signature) -> bool {
        self.ids == other.ids
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ids.hash(state);
    }
}

impl fmt::Display for Signature {
    /// Renders as `()` for the empty tuple, otherwise the comma-joined
    /// type names, e.g. `i32, alloc::string::String`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.names.is_empty() {
            return f.write_str("()");
        }
        f.write_str(&self.names.join(", "))
    }
}
