// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Path-keyed scene tree.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::Renderable;

/// Path of the root node.
pub const ROOT: &str = "";

/// Parent path of `path`: everything before the last `/`, or the root.
pub fn parent_path(path: &str) -> &str {
    path.rfind('/').map_or(ROOT, |i| &path[..i])
}

fn is_under(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// One node of the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Unique path.
    pub name: String,
    /// What this node draws.
    pub renderable: Renderable,
    /// Child paths in insertion order.
    pub children: Vec<String>,
    /// True while this node only exists to hold a child.
    pub placeholder: bool,
}

impl SceneNode {
    fn new(name: String, renderable: Renderable, placeholder: bool) -> Self {
        Self {
            name,
            renderable,
            children: Vec::new(),
            placeholder,
        }
    }
}

/// Full-viewport background image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    /// Media type of both images.
    pub media_type: String,
    /// Encoded color image.
    pub rgb: Bytes,
    /// Encoded depth image.
    pub depth: Option<Bytes>,
}

/// Mapping from path to node, connected at [`ROOT`].
///
/// Every parent/child link is kept in both directions: a node's path is in
/// its parent's `children` exactly once, and every child listed exists.
#[derive(Debug, Clone)]
pub struct SceneTree {
    nodes: HashMap<String, SceneNode>,
    background: Option<Background>,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Tree holding only the root.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT.to_string(),
            SceneNode::new(ROOT.to_string(), Renderable::placeholder(), true),
        );
        Self {
            nodes,
            background: None,
        }
    }

    /// Node at `path`.
    pub fn get(&self, path: &str) -> Option<&SceneNode> {
        self.nodes.get(path)
    }

    /// Returns true if `path` exists.
    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if only the root is present.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Iterator over every path, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Child paths of `path` (empty if absent).
    pub fn children(&self, path: &str) -> &[String] {
        self.nodes.get(path).map_or(&[], |n| n.children.as_slice())
    }

    /// Inserts or replaces the node at `path`.
    ///
    /// Missing ancestors are synthesized as invisible placeholders first.
    /// Replacing keeps the existing children. Returns the synthesized paths,
    /// outermost first.
    pub fn add_node(&mut self, path: &str, renderable: Renderable) -> Vec<String> {
        if let Some(node) = self.nodes.get_mut(path) {
            trace!(path, kind = renderable.kind(), "replacing scene node");
            node.renderable = renderable;
            node.placeholder = false;
            return Vec::new();
        }

        let mut missing = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = parent_path(path);
        while !self.nodes.contains_key(cursor) && seen.insert(cursor) {
            missing.push(cursor.to_string());
            cursor = parent_path(cursor);
        }
        missing.reverse();
        for ancestor in &missing {
            debug!(path = %ancestor, child = path, "synthesizing placeholder parent");
            self.insert_linked(ancestor.clone(), Renderable::placeholder(), true);
        }
        self.insert_linked(path.to_string(), renderable, false);
        missing
    }

    fn insert_linked(&mut self, path: String, renderable: Renderable, placeholder: bool) {
        let parent = parent_path(&path).to_string();
        if let Some(parent) = self.nodes.get_mut(&parent) {
            if !parent.children.iter().any(|c| *c == path) {
                parent.children.push(path.clone());
            }
        }
        self.nodes
            .insert(path.clone(), SceneNode::new(path, renderable, placeholder));
    }

    /// Removes `path` and every node nested under it.
    ///
    /// Removing the root drops every other node. Returns the removed paths.
    pub fn remove_node(&mut self, path: &str) -> Vec<String> {
        if path == ROOT {
            let removed: Vec<String> = self.paths().filter(|p| *p != ROOT).map(str::to_string).collect();
            self.nodes.retain(|p, _| p == ROOT);
            if let Some(root) = self.nodes.get_mut(ROOT) {
                root.children.clear();
            }
            return removed;
        }
        if !self.nodes.contains_key(path) {
            debug!(path, "remove for unknown scene node");
            return Vec::new();
        }
        let removed: Vec<String> = self
            .nodes
            .keys()
            .filter(|p| *p == path || is_under(p, path))
            .cloned()
            .collect();
        for p in &removed {
            self.nodes.remove(p);
        }
        if let Some(parent) = self.nodes.get_mut(parent_path(path)) {
            parent.children.retain(|c| c != path);
        }
        removed
    }

    /// Drops every node except the root, and the background.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Current background.
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Sets or clears the background.
    pub fn set_background(&mut self, background: Option<Background>) {
        self.background = background;
    }

    /// Paths reachable from the root, depth-first in child order.
    pub fn walk(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(path) = stack.pop() {
            out.push(path);
            stack.extend(self.children(path).iter().rev().map(String::as_str));
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn make_label(text: &str) -> Renderable {
        Renderable::Label { text: text.into() }
    }

    #[test]
    fn parent_path_splits_on_last_slash() {
        assert_eq!(parent_path("/a/b/c"), "/a/b");
        assert_eq!(parent_path("/a"), "");
        assert_eq!(parent_path("a"), "");
        assert_eq!(parent_path(""), "");
    }

    #[test]
    fn add_synthesizes_missing_parents() {
        let mut tree = SceneTree::new();
        let made = tree.add_node("/a/b/c", make_label("c"));
        assert_eq!(made, vec!["/a".to_string(), "/a/b".to_string()]);
        assert!(tree.get("/a").expect("a").placeholder);
        assert!(tree.get("/a/b").expect("b").placeholder);
        assert!(!tree.get("/a/b/c").expect("c").placeholder);
        assert_eq!(tree.walk(), vec!["", "/a", "/a/b", "/a/b/c"]);
    }

    #[test]
    fn readd_replaces_without_duplicate_child() {
        let mut tree = SceneTree::new();
        tree.add_node("/a", make_label("one"));
        tree.add_node("/a/x", make_label("x"));
        tree.add_node("/a", make_label("two"));
        assert_eq!(tree.children(ROOT), ["/a".to_string()]);
        assert_eq!(tree.children("/a"), ["/a/x".to_string()]);
        assert_eq!(tree.get("/a").expect("a").renderable, make_label("two"));
    }

    #[test]
    fn adding_over_placeholder_clears_flag() {
        let mut tree = SceneTree::new();
        tree.add_node("/a/b", make_label("b"));
        tree.add_node("/a", make_label("a"));
        let a = tree.get("/a").expect("a");
        assert!(!a.placeholder);
        assert_eq!(a.children, vec!["/a/b".to_string()]);
    }

    #[test]
    fn remove_cascades_by_segment() {
        let mut tree = SceneTree::new();
        tree.add_node("/a/b/c/d", make_label("d"));
        tree.add_node("/a/bc", make_label("bc"));
        let mut removed = tree.remove_node("/a/b");
        removed.sort();
        assert_eq!(removed, vec!["/a/b", "/a/b/c", "/a/b/c/d"]);
        assert!(tree.contains("/a/bc"));
        assert_eq!(tree.children("/a"), ["/a/bc".to_string()]);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut tree = SceneTree::new();
        tree.add_node("/a", make_label("a"));
        assert!(tree.remove_node("/zzz").is_empty());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn reset_leaves_only_root() {
        let mut tree = SceneTree::new();
        tree.add_node("/a/b", make_label("b"));
        tree.set_background(Some(Background {
            media_type: "image/png".into(),
            rgb: Bytes::from_static(b"png"),
            depth: None,
        }));
        tree.reset();
        assert!(tree.is_empty());
        assert!(tree.children(ROOT).is_empty());
        assert!(tree.background().is_none());
    }

    #[test]
    fn removing_root_clears_children() {
        let mut tree = SceneTree::new();
        tree.add_node("/a", make_label("a"));
        tree.add_node("b", make_label("b"));
        assert_eq!(tree.remove_node(ROOT).len(), 2);
        assert!(tree.is_empty());
    }
}
