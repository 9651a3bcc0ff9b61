//! The state tree engine.
//!
//! A [`StateTree`] is a path-addressed store of typed values with
//! change notifications. The root is always an object and always
//! exists; writes auto-create object intermediates; removals destroy
//! whole subtrees.
//!
//! # Re-entrancy
//!
//! All methods take `&self`; internal state lives behind `RefCell`.
//! Event callbacks run with no internal borrow held, so a listener
//! may freely write to the tree, register or remove listeners, or
//! query state. Dispatch iterates a snapshot of listener ids and
//! re-resolves each one just before invoking it, so listeners removed
//! during a dispatch are silently skipped. A callback must not
//! recursively trigger itself.
//!
//! # Events
//!
//! Listeners observe the post-mutation tree: a replacement is
//! complete (new node placed, displaced node destroyed) before any
//! callback runs. Event records carry an owned [`Value`] snapshot of
//! the involved node instead of a reference into the tree.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::error::StateError;
use crate::event::{EventCallback, EventKind, Granularity, ListenerId, PathEvent};
use crate::listeners::ListenerSet;
use crate::node::{Node, NodeKind, ObjectNode, Value};
use crate::path;

type Sink = Rc<dyn Fn(&str)>;

/// Hierarchical, path-addressed state store with granular change
/// notifications.
///
/// # Example
///
/// ```
/// use pulse_state::{EventKind, Granularity, StateTree};
///
/// let tree = StateTree::new();
/// tree.add_listener("config", Granularity::Subtree, EventKind::Add, |event| {
///     println!("added: {}", event.path);
/// });
///
/// tree.set_int("config/width", 1920);
/// assert_eq!(tree.get_int("config/width"), Some(1920));
/// ```
pub struct StateTree {
    root: RefCell<ObjectNode>,
    listeners: RefCell<ListenerSet>,
    events_enabled: Cell<bool>,
    sink: RefCell<Sink>,
}

fn descend<'a>(root: &'a ObjectNode, parts: &[&str]) -> Option<&'a ObjectNode> {
    let mut current = root;
    for part in parts {
        match current.get_child(part)? {
            Node::Object(obj) => current = obj,
            _ => return None,
        }
    }
    Some(current)
}

fn descend_mut<'a>(root: &'a mut ObjectNode, parts: &[&str]) -> Option<&'a mut ObjectNode> {
    let mut current = root;
    for part in parts {
        match current.get_child_mut(part)? {
            Node::Object(obj) => current = obj,
            _ => return None,
        }
    }
    Some(current)
}

/// Descends to the parent addressed by `parts`, creating object
/// intermediates and silently replacing non-object intermediates.
fn descend_create<'a>(root: &'a mut ObjectNode, parts: &[&str]) -> &'a mut ObjectNode {
    let mut current = root;
    for part in parts {
        let abs = path::combine(current.absolute_path(), part);
        current = current.child_object_mut(part, &abs);
    }
    current
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTree {
    /// Creates an empty tree: a root object at path `""`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RefCell::new(ObjectNode::new("")),
            listeners: RefCell::new(ListenerSet::default()),
            events_enabled: Cell::new(true),
            sink: RefCell::new(Rc::new(|msg: &str| eprintln!("StateTree error: {msg}"))),
        }
    }

    /// Replaces the diagnostic sink (default: stderr).
    pub fn set_error_sink(&self, sink: impl Fn(&str) + 'static) {
        *self.sink.borrow_mut() = Rc::new(sink);
    }

    /// Enables or disables event delivery. Disabling suppresses only
    /// delivery; mutations proceed normally.
    pub fn set_events_enabled(&self, enabled: bool) {
        self.events_enabled.set(enabled);
    }

    fn report(&self, err: &StateError) {
        use pulse_types::ErrorCode;
        debug!(code = err.code(), "{err}");
        let sink = self.sink.borrow().clone();
        sink(&err.to_string());
    }

    // ---- listeners ------------------------------------------------

    /// Registers a listener for events of `kind` scoped by
    /// `granularity` relative to `listen_path`.
    pub fn add_listener(
        &self,
        listen_path: &str,
        granularity: Granularity,
        kind: EventKind,
        callback: impl FnMut(&PathEvent) + 'static,
    ) -> ListenerId {
        let callback: EventCallback = Rc::new(RefCell::new(callback));
        self.listeners
            .borrow_mut()
            .add(listen_path, granularity, kind, callback)
    }

    /// Removes a listener. Returns whether it existed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn emit(
        &self,
        kind: EventKind,
        at: &str,
        related: &str,
        value: Option<Value>,
        node_kind: NodeKind,
    ) {
        if !self.events_enabled.get() {
            return;
        }
        let event = PathEvent {
            kind,
            path: at.to_string(),
            related_path: related.to_string(),
            value,
            node_kind,
        };
        let ids = self.listeners.borrow().matching(&event.path, kind);
        for id in ids {
            // Re-resolve: the listener may have been removed by an
            // earlier callback in this same dispatch.
            let callback = self.listeners.borrow().callback(id);
            if let Some(callback) = callback {
                (callback.borrow_mut())(&event);
            }
        }
    }

    // ---- writes ---------------------------------------------------

    /// Writes an integer leaf at `raw_path`, auto-creating
    /// intermediates.
    pub fn set_int(&self, raw_path: &str, value: i32) {
        self.write_leaf(raw_path, Node::Int(value));
    }

    /// Writes a float leaf.
    pub fn set_float(&self, raw_path: &str, value: f32) {
        self.write_leaf(raw_path, Node::Float(value));
    }

    /// Writes a boolean leaf.
    pub fn set_bool(&self, raw_path: &str, value: bool) {
        self.write_leaf(raw_path, Node::Bool(value));
    }

    /// Writes an opaque pointer leaf. The tree stores the handle
    /// without ever dereferencing it.
    pub fn set_pointer(&self, raw_path: &str, value: usize) {
        self.write_leaf(raw_path, Node::Pointer(value));
    }

    /// Writes a string leaf.
    pub fn set_string(&self, raw_path: &str, value: impl Into<String>) {
        self.write_leaf(raw_path, Node::Str(value.into()));
    }

    fn write_leaf(&self, raw_path: &str, node: Node) {
        let parts = path::split(raw_path);
        let Some((&name, head)) = parts.split_last() else {
            self.report(&StateError::InvalidPath {
                path: raw_path.to_string(),
                operation: "set",
            });
            return;
        };
        let canonical = parts.join("/");
        let writing = node.kind();
        let value = node.snapshot();
        let existed = self.has(raw_path);

        let mut mismatch = None;
        {
            let mut root = self.root.borrow_mut();
            let parent = descend_create(&mut root, head);
            match parent.get_child_mut(name) {
                Some(existing) if existing.kind() == writing => {
                    *existing = node;
                }
                Some(existing) => {
                    mismatch = Some(StateError::TypeMismatch {
                        path: canonical.clone(),
                        found: existing.kind(),
                        writing,
                    });
                    parent.insert_child(name, node);
                }
                None => {
                    parent.insert_child(name, node);
                }
            }
        }
        if let Some(err) = mismatch {
            self.report(&err);
        }

        let event_kind = if existed {
            EventKind::Update
        } else {
            EventKind::Add
        };
        debug!(path = %canonical, kind = ?writing, ?event_kind, "leaf written");
        self.emit(event_kind, &canonical, "", Some(value), writing);
    }

    /// Ensures an object node at `raw_path`. An existing object is
    /// left untouched (children preserved) and reported as `Update`;
    /// a leaf in the way is replaced.
    pub fn set_object(&self, raw_path: &str) {
        let parts = path::split(raw_path);
        let Some((&name, head)) = parts.split_last() else {
            self.report(&StateError::InvalidPath {
                path: raw_path.to_string(),
                operation: "set_object",
            });
            return;
        };
        let canonical = parts.join("/");
        let existed = self.has(raw_path);

        let mut mismatch = None;
        let children;
        {
            let mut root = self.root.borrow_mut();
            let parent = descend_create(&mut root, head);
            match parent.get_child_mut(name) {
                Some(Node::Object(obj)) => {
                    children = obj.child_count();
                }
                Some(existing) => {
                    mismatch = Some(StateError::TypeMismatch {
                        path: canonical.clone(),
                        found: existing.kind(),
                        writing: NodeKind::Object,
                    });
                    parent.insert_child(name, Node::Object(ObjectNode::new(canonical.clone())));
                    children = 0;
                }
                None => {
                    parent.insert_child(name, Node::Object(ObjectNode::new(canonical.clone())));
                    children = 0;
                }
            }
        }
        if let Some(err) = mismatch {
            self.report(&err);
        }

        let event_kind = if existed {
            EventKind::Update
        } else {
            EventKind::Add
        };
        self.emit(
            event_kind,
            &canonical,
            "",
            Some(Value::Object { children }),
            NodeKind::Object,
        );
    }

    /// Places an externally built node at `raw_path`, replacing any
    /// existing node there. Object paths inside `node` are rewritten
    /// to root at the destination. With an invalid path the node is
    /// dropped and an error reported.
    pub fn set_node(&self, raw_path: &str, mut node: Node) {
        let parts = path::split(raw_path);
        let Some((&name, head)) = parts.split_last() else {
            self.report(&StateError::InvalidPath {
                path: raw_path.to_string(),
                operation: "set_node",
            });
            return;
        };
        let canonical = parts.join("/");
        let writing = node.kind();
        node.rewrite_object_paths(&canonical);
        let value = node.snapshot();
        let existed = self.has(raw_path);

        let mut mismatch = None;
        {
            let mut root = self.root.borrow_mut();
            let parent = descend_create(&mut root, head);
            if let Some(old) = parent.insert_child(name, node) {
                if old.kind() != writing {
                    mismatch = Some(StateError::TypeMismatch {
                        path: canonical.clone(),
                        found: old.kind(),
                        writing,
                    });
                }
            }
        }
        if let Some(err) = mismatch {
            self.report(&err);
        }

        let event_kind = if existed {
            EventKind::Update
        } else {
            EventKind::Add
        };
        self.emit(event_kind, &canonical, "", Some(value), writing);
    }

    // ---- strict writes --------------------------------------------

    /// Strict integer write: no path creation, no type change.
    pub fn try_set_int(&self, raw_path: &str, value: i32) -> bool {
        self.try_write(raw_path, Node::Int(value))
    }

    /// Strict float write.
    pub fn try_set_float(&self, raw_path: &str, value: f32) -> bool {
        self.try_write(raw_path, Node::Float(value))
    }

    /// Strict boolean write.
    pub fn try_set_bool(&self, raw_path: &str, value: bool) -> bool {
        self.try_write(raw_path, Node::Bool(value))
    }

    /// Strict pointer write.
    pub fn try_set_pointer(&self, raw_path: &str, value: usize) -> bool {
        self.try_write(raw_path, Node::Pointer(value))
    }

    /// Strict string write.
    pub fn try_set_string(&self, raw_path: &str, value: impl Into<String>) -> bool {
        self.try_write(raw_path, Node::Str(value.into()))
    }

    fn try_write(&self, raw_path: &str, node: Node) -> bool {
        let parts = path::split(raw_path);
        let Some((&name, head)) = parts.split_last() else {
            self.report(&StateError::NotFound {
                path: raw_path.to_string(),
                operation: "try_set",
            });
            return false;
        };
        let canonical = parts.join("/");
        let kind = node.kind();
        let value = node.snapshot();

        let updated = {
            let mut root = self.root.borrow_mut();
            match descend_mut(&mut root, head).and_then(|p| p.get_child_mut(name)) {
                Some(existing) if existing.kind() == kind => {
                    *existing = node;
                    true
                }
                _ => false,
            }
        };
        if updated {
            self.emit(EventKind::Update, &canonical, "", Some(value), kind);
        } else {
            self.report(&StateError::NotFound {
                path: canonical,
                operation: "try_set",
            });
        }
        updated
    }

    // ---- structure ------------------------------------------------

    /// Removes the node (and subtree) at `raw_path`. The `Remove`
    /// event is emitted while the detached subtree is still alive and
    /// carries its snapshot.
    pub fn remove(&self, raw_path: &str) -> bool {
        let parts = path::split(raw_path);
        let Some((&name, head)) = parts.split_last() else {
            return false;
        };
        let canonical = parts.join("/");

        let removed = {
            let mut root = self.root.borrow_mut();
            descend_mut(&mut root, head).and_then(|parent| parent.remove_child(name))
        };
        match removed {
            Some(node) => {
                debug!(path = %canonical, "subtree removed");
                self.emit(
                    EventKind::Remove,
                    &canonical,
                    "",
                    Some(node.snapshot()),
                    node.kind(),
                );
                true
            }
            None => false,
        }
    }

    /// Moves the subtree at `from` underneath the parent of `to`,
    /// auto-creating destination intermediates. Emits exactly one
    /// `Move` event (`path = from`, `related_path = to`) and no
    /// `Add`/`Remove`. On an unresolvable destination the subtree is
    /// restored at its original location and `false` returned.
    pub fn move_node(&self, from: &str, to: &str) -> bool {
        let from_parts = path::split(from);
        let Some((&from_name, from_head)) = from_parts.split_last() else {
            return false;
        };
        let from_canonical = from_parts.join("/");

        let detached = {
            let mut root = self.root.borrow_mut();
            descend_mut(&mut root, from_head).and_then(|p| p.remove_child(from_name))
        };
        let Some(mut node) = detached else {
            return false;
        };

        let to_parts = path::split(to);
        let Some((&to_name, to_head)) = to_parts.split_last() else {
            // Destination unresolvable: restore at the origin.
            let mut root = self.root.borrow_mut();
            if let Some(parent) = descend_mut(&mut root, from_head) {
                parent.insert_child(from_name, node);
            }
            return false;
        };
        let to_canonical = to_parts.join("/");

        node.rewrite_object_paths(&to_canonical);
        let value = node.snapshot();
        let kind = node.kind();
        {
            let mut root = self.root.borrow_mut();
            let parent = descend_create(&mut root, to_head);
            parent.insert_child(to_name, node);
        }
        debug!(from = %from_canonical, to = %to_canonical, "subtree moved");
        self.emit(
            EventKind::Move,
            &from_canonical,
            &to_canonical,
            Some(value),
            kind,
        );
        true
    }

    // ---- queries --------------------------------------------------

    fn with_node<R>(&self, raw_path: &str, f: impl FnOnce(&Node) -> Option<R>) -> Option<R> {
        let parts = path::split(raw_path);
        let (&name, head) = parts.split_last()?;
        let root = self.root.borrow();
        let parent = descend(&root, head)?;
        f(parent.get_child(name)?)
    }

    /// Whether a node exists at `raw_path`.
    #[must_use]
    pub fn has(&self, raw_path: &str) -> bool {
        self.with_node(raw_path, |_| Some(())).is_some()
    }

    /// Kind of the node at `raw_path`; [`NodeKind::Empty`] when
    /// missing.
    #[must_use]
    pub fn kind_of(&self, raw_path: &str) -> NodeKind {
        self.with_node(raw_path, |n| Some(n.kind()))
            .unwrap_or(NodeKind::Empty)
    }

    /// Owned snapshot of the node at `raw_path`.
    #[must_use]
    pub fn snapshot(&self, raw_path: &str) -> Option<Value> {
        self.with_node(raw_path, |n| Some(n.snapshot()))
    }

    /// Integer at `raw_path`, if present with that kind.
    #[must_use]
    pub fn get_int(&self, raw_path: &str) -> Option<i32> {
        self.with_node(raw_path, |n| match n {
            Node::Int(v) => Some(*v),
            _ => None,
        })
    }

    /// Float at `raw_path`.
    #[must_use]
    pub fn get_float(&self, raw_path: &str) -> Option<f32> {
        self.with_node(raw_path, |n| match n {
            Node::Float(v) => Some(*v),
            _ => None,
        })
    }

    /// Boolean at `raw_path`.
    #[must_use]
    pub fn get_bool(&self, raw_path: &str) -> Option<bool> {
        self.with_node(raw_path, |n| match n {
            Node::Bool(v) => Some(*v),
            _ => None,
        })
    }

    /// Pointer handle at `raw_path`.
    #[must_use]
    pub fn get_pointer(&self, raw_path: &str) -> Option<usize> {
        self.with_node(raw_path, |n| match n {
            Node::Pointer(v) => Some(*v),
            _ => None,
        })
    }

    /// String at `raw_path` (cloned).
    #[must_use]
    pub fn get_string(&self, raw_path: &str) -> Option<String> {
        self.with_node(raw_path, |n| match n {
            Node::Str(v) => Some(v.clone()),
            _ => None,
        })
    }

    /// Integer at `raw_path`, or `default` on any miss.
    #[must_use]
    pub fn int_or(&self, raw_path: &str, default: i32) -> i32 {
        self.get_int(raw_path).unwrap_or(default)
    }

    /// Float with default.
    #[must_use]
    pub fn float_or(&self, raw_path: &str, default: f32) -> f32 {
        self.get_float(raw_path).unwrap_or(default)
    }

    /// Boolean with default.
    #[must_use]
    pub fn bool_or(&self, raw_path: &str, default: bool) -> bool {
        self.get_bool(raw_path).unwrap_or(default)
    }

    /// Pointer with default.
    #[must_use]
    pub fn pointer_or(&self, raw_path: &str, default: usize) -> usize {
        self.get_pointer(raw_path).unwrap_or(default)
    }

    /// String with default.
    #[must_use]
    pub fn string_or(&self, raw_path: &str, default: &str) -> String {
        self.get_string(raw_path)
            .unwrap_or_else(|| default.to_string())
    }

    // ---- enumeration ----------------------------------------------

    /// Child names of the object at `raw_path`, name-ordered. The
    /// empty path enumerates the root. Non-objects yield an empty
    /// list.
    #[must_use]
    pub fn child_names(&self, raw_path: &str) -> Vec<String> {
        if path::split(raw_path).is_empty() {
            return self.root.borrow().child_names();
        }
        self.with_node(raw_path, |n| match n {
            Node::Object(obj) => Some(obj.child_names()),
            _ => None,
        })
        .unwrap_or_default()
    }

    /// Direct child count of the object at `raw_path` (root for the
    /// empty path); `None` for missing or non-object nodes.
    #[must_use]
    pub fn child_count(&self, raw_path: &str) -> Option<usize> {
        if path::split(raw_path).is_empty() {
            return Some(self.root.borrow().child_count());
        }
        self.with_node(raw_path, |n| match n {
            Node::Object(obj) => Some(obj.child_count()),
            _ => None,
        })
    }

    /// Visits `(name, kind)` for each child of the object at
    /// `raw_path` (root for the empty path), in name order. The
    /// snapshot is taken before `f` first runs, so `f` may mutate the
    /// tree.
    pub fn for_each_child(&self, raw_path: &str, mut f: impl FnMut(&str, NodeKind)) {
        let children: Vec<(String, NodeKind)> = {
            let root = self.root.borrow();
            let object = if path::split(raw_path).is_empty() {
                Some(&*root)
            } else {
                let parts = path::split(raw_path);
                let (&name, head) = match parts.split_last() {
                    Some(split) => split,
                    None => return,
                };
                descend(&root, head).and_then(|p| match p.get_child(name) {
                    Some(Node::Object(obj)) => Some(obj),
                    _ => None,
                })
            };
            match object {
                Some(obj) => {
                    let mut out = Vec::with_capacity(obj.child_count());
                    obj.for_each_child(|name, node| out.push((name.to_string(), node.kind())));
                    out
                }
                None => return,
            }
        };
        for (name, kind) in children {
            f(&name, kind);
        }
    }

    // ---- rendering ------------------------------------------------

    /// Deterministic textual rendering of the whole tree.
    #[must_use]
    pub fn render_tree(&self) -> String {
        let mut out = String::from("StateTree:\n");
        self.root.borrow().render_into(&mut out, "", true);
        out
    }

    /// Chainable accessor rooted at `raw_path`.
    #[must_use]
    pub fn at(&self, raw_path: &str) -> PathRef<'_> {
        PathRef {
            tree: self,
            path: path::canonical(raw_path),
        }
    }
}

/// Chainable path accessor bound to a tree.
///
/// Composes segments with [`at`](Self::at) and forwards reads and
/// writes to the owning [`StateTree`].
///
/// # Example
///
/// ```
/// use pulse_state::StateTree;
///
/// let tree = StateTree::new();
/// let config = tree.at("app/config");
/// config.at("width").set_int(1920);
/// assert_eq!(config.at("width").get_int(), Some(1920));
/// assert_eq!(tree.at("app/config/width").int_or(0), 1920);
/// ```
pub struct PathRef<'t> {
    tree: &'t StateTree,
    path: String,
}

impl<'t> PathRef<'t> {
    /// Extends the accessor by a relative path.
    #[must_use]
    pub fn at(&self, relative: &str) -> PathRef<'t> {
        PathRef {
            tree: self.tree,
            path: path::combine(&self.path, &path::canonical(relative)),
        }
    }

    /// The absolute path this accessor addresses.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a node exists here.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.tree.has(&self.path)
    }

    /// Kind of the node here; `Empty` when missing.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.tree.kind_of(&self.path)
    }

    /// Writes an integer here.
    pub fn set_int(&self, value: i32) {
        self.tree.set_int(&self.path, value);
    }

    /// Writes a float here.
    pub fn set_float(&self, value: f32) {
        self.tree.set_float(&self.path, value);
    }

    /// Writes a boolean here.
    pub fn set_bool(&self, value: bool) {
        self.tree.set_bool(&self.path, value);
    }

    /// Writes a pointer handle here.
    pub fn set_pointer(&self, value: usize) {
        self.tree.set_pointer(&self.path, value);
    }

    /// Writes a string here.
    pub fn set_string(&self, value: impl Into<String>) {
        self.tree.set_string(&self.path, value);
    }

    /// Reads an integer.
    #[must_use]
    pub fn get_int(&self) -> Option<i32> {
        self.tree.get_int(&self.path)
    }

    /// Reads a float.
    #[must_use]
    pub fn get_float(&self) -> Option<f32> {
        self.tree.get_float(&self.path)
    }

    /// Reads a boolean.
    #[must_use]
    pub fn get_bool(&self) -> Option<bool> {
        self.tree.get_bool(&self.path)
    }

    /// Reads a pointer handle.
    #[must_use]
    pub fn get_pointer(&self) -> Option<usize> {
        self.tree.get_pointer(&self.path)
    }

    /// Reads a string.
    #[must_use]
    pub fn get_string(&self) -> Option<String> {
        self.tree.get_string(&self.path)
    }

    /// Integer with default.
    #[must_use]
    pub fn int_or(&self, default: i32) -> i32 {
        self.tree.int_or(&self.path, default)
    }

    /// Float with default.
    #[must_use]
    pub fn float_or(&self, default: f32) -> f32 {
        self.tree.float_or(&self.path, default)
    }

    /// Boolean with default.
    #[must_use]
    pub fn bool_or(&self, default: bool) -> bool {
        self.tree.bool_or(&self.path, default)
    }

    /// String with default.
    #[must_use]
    pub fn string_or(&self, default: &str) -> String {
        self.tree.string_or(&self.path, default)
    }

    /// Removes the node here.
    pub fn remove(&self) -> bool {
        self.tree.remove(&self.path)
    }
}
