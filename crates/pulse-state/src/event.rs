//! Change-event records and listener vocabulary.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::node::{NodeKind, Value};

/// Identifier of a registered tree listener. Monotonic per tree;
/// `0` is reserved as invalid.
pub type ListenerId = u64;

/// What happened at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A node was created.
    Add,
    /// A node (and its subtree) was removed.
    Remove,
    /// A subtree was relocated. The event's `related_path` carries
    /// the destination.
    Move,
    /// A node's value was written.
    Update,
}

/// Scope of a listener's interest relative to its registered path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// Exactly the registered path.
    Node,
    /// Direct children of the registered path.
    DirectChild,
    /// The registered path and every descendant.
    Subtree,
}

/// One delivered change notification.
///
/// `related_path` is empty except for [`EventKind::Move`], where it
/// carries the destination path. `value` is an owned snapshot of the
/// involved node (`None` only for events about missing targets), and
/// `node_kind` is [`NodeKind::Empty`] exactly when `value` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEvent {
    /// What happened.
    pub kind: EventKind,
    /// Path the event happened at.
    pub path: String,
    /// Secondary path; destination for moves, empty otherwise.
    pub related_path: String,
    /// Snapshot of the involved node.
    pub value: Option<Value>,
    /// Kind of the involved node.
    pub node_kind: NodeKind,
}

/// Shared handle to a listener callback. Shared so that dispatch can
/// invoke callbacks without keeping the registry borrowed, which is
/// what allows a callback to mutate the tree re-entrantly.
pub type EventCallback = Rc<RefCell<dyn FnMut(&PathEvent)>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_round_trip() {
        let event = PathEvent {
            kind: EventKind::Move,
            path: "a/b".into(),
            related_path: "c/d".into(),
            value: Some(Value::Int(7)),
            node_kind: NodeKind::Int,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: PathEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn kinds_and_granularities_are_distinct() {
        assert_ne!(EventKind::Add, EventKind::Update);
        assert_ne!(Granularity::Node, Granularity::Subtree);
    }
}
