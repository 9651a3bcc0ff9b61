//! End-to-end state tree scenarios: write/event interplay, moves,
//! and listener scoping across a populated tree.

use std::cell::RefCell;
use std::rc::Rc;

use pulse_state::{EventKind, Granularity, NodeKind, PathEvent, StateTree, Value};

fn tree() -> StateTree {
    let tree = StateTree::new();
    tree.set_error_sink(|_| {});
    tree
}

fn record_events(
    tree: &StateTree,
    listen_path: &str,
    granularity: Granularity,
    kind: EventKind,
) -> Rc<RefCell<Vec<PathEvent>>> {
    let log: Rc<RefCell<Vec<PathEvent>>> = Rc::default();
    let sink = Rc::clone(&log);
    tree.add_listener(listen_path, granularity, kind, move |event| {
        sink.borrow_mut().push(event.clone());
    });
    log
}

#[test]
fn write_twice_logs_add_then_update() {
    let tree = tree();
    let adds = record_events(&tree, "", Granularity::Subtree, EventKind::Add);
    let updates = record_events(&tree, "", Granularity::Subtree, EventKind::Update);

    tree.set_int("a/b", 7);
    tree.set_int("a/b", 8);

    assert_eq!(tree.get_int("a/b"), Some(8));
    assert_eq!(adds.borrow().len(), 1);
    assert_eq!(adds.borrow()[0].path, "a/b");
    assert_eq!(updates.borrow().len(), 1);
    assert_eq!(updates.borrow()[0].path, "a/b");
}

#[test]
fn subtree_add_listener_fires_exactly_once_for_deep_write() {
    let tree = tree();
    let log = record_events(&tree, "x", Granularity::Subtree, EventKind::Add);

    tree.set_int("x/y/z", 1);

    let events = log.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, "x/y/z");
    assert_eq!(events[0].node_kind, NodeKind::Int);
    assert_eq!(events[0].value, Some(Value::Int(1)));
}

#[test]
fn populated_subtree_move_preserves_values() {
    let tree = tree();
    let moves = record_events(&tree, "", Granularity::Subtree, EventKind::Move);
    let adds = record_events(&tree, "", Granularity::Subtree, EventKind::Add);
    let removes = record_events(&tree, "", Granularity::Subtree, EventKind::Remove);

    tree.set_int("s/v", 5);
    tree.set_int("s/sub/v2", 6);
    let adds_before = adds.borrow().len();

    assert!(tree.move_node("s", "t"));

    assert_eq!(tree.get_int("t/v"), Some(5));
    assert_eq!(tree.get_int("t/sub/v2"), Some(6));
    assert!(!tree.has("s"));

    let move_events = moves.borrow();
    assert_eq!(move_events.len(), 1);
    assert_eq!(move_events[0].path, "s");
    assert_eq!(move_events[0].related_path, "t");
    assert_eq!(adds.borrow().len(), adds_before, "moves emit no Add");
    assert!(removes.borrow().is_empty(), "moves emit no Remove");
}

#[test]
fn listener_granularities_are_disjoint_scopes() {
    let tree = tree();
    let node_hits: Rc<RefCell<u32>> = Rc::default();
    let child_hits: Rc<RefCell<u32>> = Rc::default();
    let subtree_hits: Rc<RefCell<u32>> = Rc::default();

    let n = Rc::clone(&node_hits);
    tree.add_listener("app", Granularity::Node, EventKind::Add, move |_| {
        *n.borrow_mut() += 1;
    });
    let c = Rc::clone(&child_hits);
    tree.add_listener("app", Granularity::DirectChild, EventKind::Add, move |_| {
        *c.borrow_mut() += 1;
    });
    let s = Rc::clone(&subtree_hits);
    tree.add_listener("app", Granularity::Subtree, EventKind::Add, move |_| {
        *s.borrow_mut() += 1;
    });

    tree.set_object("app"); // node itself
    tree.set_int("app/direct", 1); // direct child
    tree.set_int("app/deep/leaf", 2); // deeper descendant

    assert_eq!(*node_hits.borrow(), 1);
    assert_eq!(*child_hits.borrow(), 1);
    assert_eq!(*subtree_hits.borrow(), 3);
}

#[test]
fn no_listener_fires_twice_per_mutation() {
    let tree = tree();
    let hits: Rc<RefCell<u32>> = Rc::default();

    // Same listener concept registered once but matching through the
    // subtree rule both as ancestor and exact node.
    let h = Rc::clone(&hits);
    tree.add_listener("dup", Granularity::Subtree, EventKind::Add, move |_| {
        *h.borrow_mut() += 1;
    });

    tree.set_object("dup");
    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn remove_then_queries_report_empty() {
    let tree = tree();
    tree.set_string("doc/title", "draft");
    tree.set_int("doc/revision", 3);

    assert!(tree.remove("doc"));
    assert!(!tree.has("doc"));
    assert!(!tree.has("doc/title"));
    assert_eq!(tree.kind_of("doc"), NodeKind::Empty);
    assert_eq!(tree.kind_of("doc/revision"), NodeKind::Empty);
    assert_eq!(tree.get_string("doc/title"), None);
}

#[test]
fn operations_do_not_disturb_siblings() {
    let tree = tree();
    tree.set_int("left/a", 1);
    tree.set_string("right/b", "kept");
    tree.set_bool("right/flag", true);

    tree.set_float("left/a", 2.0); // type replacement on the left
    tree.remove("left");
    assert!(tree.move_node("right", "relocated"));

    assert_eq!(tree.get_string("relocated/b").as_deref(), Some("kept"));
    assert_eq!(tree.get_bool("relocated/flag"), Some(true));
}

#[test]
fn strict_writes_never_create() {
    let tree = tree();
    assert!(!tree.try_set_int("never/created", 1));
    assert!(!tree.has("never"));

    tree.set_int("typed", 1);
    assert!(!tree.try_set_string("typed", "no"));
    assert_eq!(tree.kind_of("typed"), NodeKind::Int);
    assert!(tree.try_set_int("typed", 2));
    assert_eq!(tree.get_int("typed"), Some(2));
}

#[test]
fn render_is_deterministic() {
    let tree = tree();
    tree.set_int("z", 1);
    tree.set_int("a/inner", 2);
    tree.set_pointer("a/handle", 0x1000);

    let first = tree.render_tree();
    let second = tree.render_tree();
    assert_eq!(first, second);
    assert!(first.contains("\"a\": [Object]"));
    assert!(first.contains("\"handle\": [Pointer: 0x1000]"));
    assert!(first.contains("\"z\": [Int: 1]"));
}

#[test]
fn listener_cascade_settles() {
    // A listener mirrors writes under "primary" into "mirror"; the
    // mirrored writes themselves raise events that nothing consumes.
    let tree = Rc::new(tree());
    let mirror_tree = Rc::clone(&tree);
    tree.add_listener("primary", Granularity::Subtree, EventKind::Add, move |event| {
        if let Some(Value::Int(v)) = event.value {
            let mirrored = event.path.replacen("primary", "mirror", 1);
            mirror_tree.set_int(&mirrored, v);
        }
    });

    tree.set_int("primary/cell", 9);
    assert_eq!(tree.get_int("mirror/cell"), Some(9));
}
