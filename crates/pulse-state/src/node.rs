//! Tree nodes, node kinds, and value snapshots.
//!
//! The node model is a closed tagged sum: five leaf kinds plus
//! `Object`. Only objects carry their absolute path; leaves are pure
//! values. `NodeKind::Empty` never appears in the tree; it is the
//! sentinel returned by type queries for missing nodes.
//!
//! `Pointer` leaves hold an address-sized opaque handle to
//! externally-owned memory. The tree never dereferences or frees it.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::path;

/// Discriminant of a node, plus the `Empty` sentinel for queries on
/// missing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Mapping from segment name to child node.
    Object,
    /// Signed 32-bit integer.
    Int,
    /// 32-bit binary float.
    Float,
    /// Boolean.
    Bool,
    /// Opaque address-sized handle; lifetime owned by the caller.
    Pointer,
    /// UTF-8 string.
    String,
    /// Query result for a path with no node. Never stored.
    Empty,
}

/// Owned snapshot of a node's content, carried by event records.
///
/// Object snapshots record only the child count; a snapshot never
/// aliases the tree, so listeners are free to mutate the tree while
/// holding one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Snapshot of an [`Node::Int`] leaf.
    Int(i32),
    /// Snapshot of a [`Node::Float`] leaf.
    Float(f32),
    /// Snapshot of a [`Node::Bool`] leaf.
    Bool(bool),
    /// Snapshot of a [`Node::Pointer`] leaf.
    Pointer(usize),
    /// Snapshot of a [`Node::Str`] leaf.
    Str(String),
    /// Snapshot of an object: its direct child count.
    Object {
        /// Number of direct children at snapshot time.
        children: usize,
    },
}

/// A node in the state tree.
#[derive(Debug)]
pub enum Node {
    /// Signed 32-bit integer leaf.
    Int(i32),
    /// 32-bit float leaf.
    Float(f32),
    /// Boolean leaf.
    Bool(bool),
    /// Opaque externally-owned handle leaf.
    Pointer(usize),
    /// UTF-8 string leaf.
    Str(String),
    /// Interior object node.
    Object(ObjectNode),
}

/// An object node: named children plus the node's absolute path.
#[derive(Debug, Default)]
pub struct ObjectNode {
    absolute_path: String,
    children: BTreeMap<String, Node>,
}

impl Node {
    /// The node's kind discriminant.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Int(_) => NodeKind::Int,
            Node::Float(_) => NodeKind::Float,
            Node::Bool(_) => NodeKind::Bool,
            Node::Pointer(_) => NodeKind::Pointer,
            Node::Str(_) => NodeKind::String,
            Node::Object(_) => NodeKind::Object,
        }
    }

    /// Owned snapshot of the node's content.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        match self {
            Node::Int(v) => Value::Int(*v),
            Node::Float(v) => Value::Float(*v),
            Node::Bool(v) => Value::Bool(*v),
            Node::Pointer(v) => Value::Pointer(*v),
            Node::Str(v) => Value::Str(v.clone()),
            Node::Object(o) => Value::Object {
                children: o.child_count(),
            },
        }
    }

    /// One-line content rendering, e.g. `[Int: 7]` or
    /// `[Object: 3 children]`.
    #[must_use]
    pub fn content(&self) -> String {
        match self {
            Node::Int(v) => format!("[Int: {v}]"),
            Node::Float(v) => format!("[Float: {v}]"),
            Node::Bool(v) => format!("[Bool: {v}]"),
            Node::Pointer(v) => format!("[Pointer: {v:#x}]"),
            Node::Str(v) => format!("[String: \"{v}\"]"),
            Node::Object(o) => format!("[Object: {} children]", o.child_count()),
        }
    }

    /// Rewrites the absolute paths of this subtree's object nodes so
    /// that they root at `new_path`. Leaves carry no path and are
    /// untouched.
    pub(crate) fn rewrite_object_paths(&mut self, new_path: &str) {
        if let Node::Object(obj) = self {
            obj.absolute_path = new_path.to_string();
            for (name, child) in &mut obj.children {
                child.rewrite_object_paths(&path::combine(new_path, name));
            }
        }
    }

    /// Appends the box-drawing rendering of this node's children to
    /// `out`. Leaves render nothing at this level; their line is
    /// produced by the enclosing object.
    pub(crate) fn render_into(&self, out: &mut String, prefix: &str, is_last: bool) {
        if let Node::Object(obj) = self {
            obj.render_into(out, prefix, is_last);
        }
    }
}

impl ObjectNode {
    /// Creates an empty object node rooted at `absolute_path`.
    #[must_use]
    pub fn new(absolute_path: impl Into<String>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            children: BTreeMap::new(),
        }
    }

    /// The node's absolute path ("" for the tree root).
    #[must_use]
    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }

    /// Inserts `node` under `name`, returning the displaced child if
    /// one existed.
    pub fn insert_child(&mut self, name: impl Into<String>, node: Node) -> Option<Node> {
        self.children.insert(name.into(), node)
    }

    /// Detaches and returns the child named `name`.
    pub fn remove_child(&mut self, name: &str) -> Option<Node> {
        self.children.remove(name)
    }

    /// Borrows the child named `name`.
    #[must_use]
    pub fn get_child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Mutably borrows the child named `name`.
    pub fn get_child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    /// Whether a child named `name` exists.
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Child names in name order.
    #[must_use]
    pub fn child_names(&self) -> Vec<String> {
        self.children.keys().cloned().collect()
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Visits each child as `(name, node)` in name order.
    pub fn for_each_child(&self, mut f: impl FnMut(&str, &Node)) {
        for (name, node) in &self.children {
            f(name, node);
        }
    }

    /// Appends the box-drawing rendering of this object's children to
    /// `out`. `prefix` is the accumulated indentation; `is_last`
    /// selects the continuation glyph for deeper levels.
    pub(crate) fn render_into(&self, out: &mut String, prefix: &str, is_last: bool) {
        if self.children.is_empty() {
            return;
        }
        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let count = self.children.len();
        for (index, (name, child)) in self.children.iter().enumerate() {
            let child_is_last = index + 1 == count;
            let branch = if child_is_last { "└── " } else { "├── " };
            if matches!(child, Node::Object(_)) {
                let _ = writeln!(out, "{child_prefix}{branch}\"{name}\": [Object]");
                child.render_into(out, &child_prefix, child_is_last);
            } else {
                let _ = writeln!(out, "{child_prefix}{branch}\"{name}\": {}", child.content());
            }
        }
    }

    /// Mutable descent helper: returns the child object named `name`,
    /// creating it (or silently replacing a non-object child) with a
    /// fresh object rooted at `abs_path`.
    pub(crate) fn child_object_mut(&mut self, name: &str, abs_path: &str) -> &mut ObjectNode {
        let slot = self
            .children
            .entry(name.to_string())
            .or_insert_with(|| Node::Object(ObjectNode::new(abs_path)));
        if !matches!(slot, Node::Object(_)) {
            *slot = Node::Object(ObjectNode::new(abs_path));
        }
        match slot {
            Node::Object(obj) => obj,
            // The slot was just coerced to an object above.
            _ => unreachable!(),
        }
    }
}
