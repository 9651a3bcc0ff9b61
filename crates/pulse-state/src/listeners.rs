//! Listener registry layered on the path trie.
//!
//! Each listener record carries its id, canonical registered path,
//! granularity, event-kind filter, and the shared callback handle.
//! Matching resolves the granularity contracts against a query path
//! and returns ids in delivery order:
//!
//! 1. Subtree listeners on the root-to-query walk (root first),
//! 2. DirectChild listeners registered at the query path's parent,
//! 3. Node listeners registered at the query path itself.
//!
//! Each id is returned at most once per query.

use std::collections::{HashMap, HashSet};

use crate::event::{EventCallback, EventKind, Granularity, ListenerId};
use crate::path;
use crate::trie::PathTrie;

pub(crate) struct ListenerRecord {
    id: ListenerId,
    granularity: Granularity,
    kind: EventKind,
    callback: EventCallback,
}

/// Registry of path listeners with id-based removal.
#[derive(Default)]
pub(crate) struct ListenerSet {
    trie: PathTrie<ListenerRecord>,
    paths: HashMap<ListenerId, String>,
    next_id: ListenerId,
}

impl ListenerSet {
    pub(crate) fn add(
        &mut self,
        listen_path: &str,
        granularity: Granularity,
        kind: EventKind,
        callback: EventCallback,
    ) -> ListenerId {
        self.next_id += 1;
        let id = self.next_id;
        let canonical = path::canonical(listen_path);
        self.trie.insert(
            &canonical,
            ListenerRecord {
                id,
                granularity,
                kind,
                callback,
            },
        );
        self.paths.insert(id, canonical);
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let Some(listen_path) = self.paths.remove(&id) else {
            return false;
        };
        self.trie.remove(&listen_path, |record| record.id == id)
    }

    /// Ids of the listeners matching an event of `kind` at `query`,
    /// in delivery order, each at most once.
    pub(crate) fn matching(&self, query: &str, kind: EventKind) -> Vec<ListenerId> {
        let mut ids = Vec::new();
        let mut seen: HashSet<ListenerId> = HashSet::new();
        let mut push = |record: &ListenerRecord, want: Granularity| {
            if record.kind == kind && record.granularity == want && seen.insert(record.id) {
                ids.push(record.id);
            }
        };

        self.trie
            .visit_ancestors(query, |record| push(record, Granularity::Subtree));
        self.trie
            .visit_parent(query, |record| push(record, Granularity::DirectChild));
        self.trie
            .visit_exact(query, |record| push(record, Granularity::Node));
        ids
    }

    /// Re-resolves a listener's callback just before invocation.
    /// `None` when the listener was removed since the ids were
    /// snapshotted.
    pub(crate) fn callback(&self, id: ListenerId) -> Option<EventCallback> {
        let listen_path = self.paths.get(&id)?;
        let mut found = None;
        self.trie.visit_exact(listen_path, |record| {
            if record.id == id {
                found = Some(record.callback.clone());
            }
        });
        found
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn noop() -> EventCallback {
        Rc::new(RefCell::new(|_: &crate::event::PathEvent| {}))
    }

    fn set_with(listeners: &[(&str, Granularity, EventKind)]) -> (ListenerSet, Vec<ListenerId>) {
        let mut set = ListenerSet::default();
        let ids = listeners
            .iter()
            .map(|(p, g, k)| set.add(p, *g, *k, noop()))
            .collect();
        (set, ids)
    }

    #[test]
    fn node_listener_requires_exact_path() {
        let (set, ids) = set_with(&[("a/b", Granularity::Node, EventKind::Add)]);
        assert_eq!(set.matching("a/b", EventKind::Add), vec![ids[0]]);
        assert!(set.matching("a/b/c", EventKind::Add).is_empty());
        assert!(set.matching("a", EventKind::Add).is_empty());
    }

    #[test]
    fn direct_child_listener_matches_children_only() {
        let (set, ids) = set_with(&[("a", Granularity::DirectChild, EventKind::Update)]);
        assert_eq!(set.matching("a/b", EventKind::Update), vec![ids[0]]);
        assert!(set.matching("a", EventKind::Update).is_empty());
        assert!(set.matching("a/b/c", EventKind::Update).is_empty());
    }

    #[test]
    fn subtree_listener_matches_path_and_descendants() {
        let (set, ids) = set_with(&[("x", Granularity::Subtree, EventKind::Add)]);
        assert_eq!(set.matching("x", EventKind::Add), vec![ids[0]]);
        assert_eq!(set.matching("x/y/z", EventKind::Add), vec![ids[0]]);
        assert!(set.matching("other", EventKind::Add).is_empty());
    }

    #[test]
    fn root_subtree_listener_sees_everything() {
        let (set, ids) = set_with(&[("", Granularity::Subtree, EventKind::Remove)]);
        assert_eq!(set.matching("deep/down/here", EventKind::Remove), vec![ids[0]]);
    }

    #[test]
    fn kind_filter_applies() {
        let (set, _) = set_with(&[("a", Granularity::Subtree, EventKind::Add)]);
        assert!(set.matching("a/b", EventKind::Update).is_empty());
    }

    #[test]
    fn delivery_order_subtree_then_child_then_node() {
        let (set, ids) = set_with(&[
            ("a/b", Granularity::Node, EventKind::Add),
            ("a", Granularity::DirectChild, EventKind::Add),
            ("", Granularity::Subtree, EventKind::Add),
            ("a", Granularity::Subtree, EventKind::Add),
        ]);
        // Root subtree, then subtree at "a", then direct-child at
        // "a", then node at "a/b".
        assert_eq!(
            set.matching("a/b", EventKind::Add),
            vec![ids[2], ids[3], ids[1], ids[0]]
        );
    }

    #[test]
    fn removed_listener_stops_matching() {
        let (mut set, ids) = set_with(&[("p", Granularity::Node, EventKind::Add)]);
        assert!(set.remove(ids[0]));
        assert!(!set.remove(ids[0]));
        assert!(set.matching("p", EventKind::Add).is_empty());
        assert!(set.callback(ids[0]).is_none());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn callback_resolution_survives_path_normalization() {
        let mut set = ListenerSet::default();
        let id = set.add("a//b/", Granularity::Node, EventKind::Add, noop());
        assert!(set.callback(id).is_some());
        assert_eq!(set.matching("a/b", EventKind::Add), vec![id]);
    }
}
