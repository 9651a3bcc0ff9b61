//! Path splitting and joining.
//!
//! A path is a `/`-separated sequence of non-empty segments. The
//! empty path addresses the root object. Splitting discards empty
//! segments, so repeated or trailing slashes collapse: `"a//b/"`
//! and `"a/b"` address the same node.

/// Splits `path` into its non-empty segments.
#[must_use]
pub fn split(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Joins two path fragments with a single `/`, leaving the other
/// fragment untouched when one side is empty.
#[must_use]
pub fn combine(base: &str, relative: &str) -> String {
    if base.is_empty() {
        return relative.to_string();
    }
    if relative.is_empty() {
        return base.to_string();
    }
    format!("{base}/{relative}")
}

/// Canonical form of `path`: segments re-joined with single slashes.
#[must_use]
pub fn canonical(path: &str) -> String {
    split(path).join("/")
}

/// The canonical parent of `path`, or `None` for the root / empty
/// path.
#[must_use]
pub fn parent(path: &str) -> Option<String> {
    let parts = split(path);
    let (_, head) = parts.split_last()?;
    Some(head.join("/"))
}
