//! Path-addressed hierarchical state for the pulse toolkit.
//!
//! The centerpiece is [`StateTree`]: a tree of typed values addressed
//! by `/`-separated paths, with auto-creating writes, strict typed
//! updates, subtree moves, and staged change notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  StateTree         engine + PathRef accessor │
//! ├──────────────────────────────────────────────┤
//! │  ListenerSet       granularity matching      │
//! │  PathTrie          segment-keyed lookups     │
//! ├──────────────────────────────────────────────┤
//! │  Node / NodeKind   tagged value model        │
//! │  path              split / combine           │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Listener model
//!
//! Listeners register `(path, granularity, event kind, callback)`:
//!
//! | Granularity | Fires for |
//! |-------------|-----------|
//! | [`Granularity::Node`] | events exactly at the registered path |
//! | [`Granularity::DirectChild`] | events at direct children |
//! | [`Granularity::Subtree`] | events at the path or any descendant |
//!
//! Delivery order is ancestor subtree listeners first (root
//! outward), then direct-child listeners at the parent, then node
//! listeners at the path; no listener fires twice in one dispatch.
//!
//! # Example
//!
//! ```
//! use pulse_state::{EventKind, Granularity, StateTree};
//!
//! let tree = StateTree::new();
//!
//! let id = tree.add_listener("app", Granularity::Subtree, EventKind::Add, |event| {
//!     println!("new node at {}", event.path);
//! });
//!
//! tree.set_int("app/config/width", 1920);
//! tree.set_string("app/title", "editor");
//!
//! assert_eq!(tree.int_or("app/config/width", 0), 1920);
//! assert!(tree.remove_listener(id));
//! ```

mod error;
mod event;
mod listeners;
mod node;
pub mod path;
mod tree;
mod trie;

pub use error::StateError;
pub use event::{EventKind, Granularity, ListenerId, PathEvent};
pub use node::{Node, NodeKind, ObjectNode, Value};
pub use tree::{PathRef, StateTree};
pub use trie::PathTrie;
