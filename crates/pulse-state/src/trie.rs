//! Prefix tree over path segments.
//!
//! `PathTrie` is the shared lookup substrate for the listener
//! registry: records attach to the trie node addressed by their
//! path's segments, and queries walk segment by segment, which makes
//! prefix relationships segment-exact (a record at `ab` is not an
//! ancestor of `abc/x`).
//!
//! Insertion and removal are O(depth); the ancestor walk visits at
//! most depth+1 nodes.

use std::collections::HashMap;

use crate::path;

#[derive(Debug)]
struct TrieNode<T> {
    children: HashMap<String, TrieNode<T>>,
    records: Vec<T>,
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            records: Vec::new(),
        }
    }
}

/// Prefix tree keyed by `/`-separated path segments, carrying
/// arbitrary records at every node (the root included).
#[derive(Debug)]
pub struct PathTrie<T> {
    root: TrieNode<T>,
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self {
            root: TrieNode::default(),
        }
    }
}

impl<T> PathTrie<T> {
    /// Creates an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, parts: &[&str]) -> Option<&TrieNode<T>> {
        let mut current = &self.root;
        for part in parts {
            current = current.children.get(*part)?;
        }
        Some(current)
    }

    /// Attaches `record` at the node addressed by `path`, creating
    /// intermediate trie nodes as needed.
    pub fn insert(&mut self, trie_path: &str, record: T) {
        let mut current = &mut self.root;
        for part in path::split(trie_path) {
            current = current.children.entry(part.to_string()).or_default();
        }
        current.records.push(record);
    }

    /// Removes the first record at `path` matching `pred`. Returns
    /// whether one was removed. Emptied trie nodes are retained.
    pub fn remove(&mut self, trie_path: &str, mut pred: impl FnMut(&T) -> bool) -> bool {
        let mut current = &mut self.root;
        for part in path::split(trie_path) {
            let Some(next) = current.children.get_mut(part) else {
                return false;
            };
            current = next;
        }
        let Some(index) = current.records.iter().position(|r| pred(r)) else {
            return false;
        };
        current.records.remove(index);
        true
    }

    /// Visits the records attached exactly at `path`, if that trie
    /// node exists.
    pub fn visit_exact(&self, trie_path: &str, mut f: impl FnMut(&T)) {
        let parts = path::split(trie_path);
        if let Some(node) = self.node(&parts) {
            for record in &node.records {
                f(record);
            }
        }
    }

    /// Visits the records attached at the parent of `path`. A
    /// single-segment path has the root as its parent; the empty path
    /// has no parent and nothing is visited.
    pub fn visit_parent(&self, trie_path: &str, mut f: impl FnMut(&T)) {
        let parts = path::split(trie_path);
        let Some((_, head)) = parts.split_last() else {
            return;
        };
        if let Some(node) = self.node(head) {
            for record in &node.records {
                f(record);
            }
        }
    }

    /// Visits records on the root-to-`path` walk, root first, the
    /// node at `path` last, stopping early where the trie ends.
    pub fn visit_ancestors(&self, trie_path: &str, mut f: impl FnMut(&T)) {
        let mut current = &self.root;
        for record in &current.records {
            f(record);
        }
        for part in path::split(trie_path) {
            let Some(next) = current.children.get(part) else {
                return;
            };
            current = next;
            for record in &current.records {
                f(record);
            }
        }
    }

    /// Total record count, mainly for diagnostics.
    #[must_use]
    pub fn record_count(&self) -> usize {
        fn walk<T>(node: &TrieNode<T>) -> usize {
            node.records.len() + node.children.values().map(walk).sum::<usize>()
        }
        walk(&self.root)
    }
}
