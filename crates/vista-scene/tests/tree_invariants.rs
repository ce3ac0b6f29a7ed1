// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::expect_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use vista_scene::{parent_path, AttributeStore, Renderable, SceneTree, ROOT};

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Remove(String),
    Reset,
}

fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c"]), 1..4)
        .prop_map(|segs| format!("/{}", segs.join("/")))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => path_strategy().prop_map(Op::Add),
        3 => path_strategy().prop_map(Op::Remove),
        1 => Just(Op::Reset),
    ]
}

fn assert_connected(tree: &SceneTree) -> Result<(), TestCaseError> {
    let reachable: HashSet<&str> = tree.walk().into_iter().collect();
    prop_assert_eq!(reachable.len(), tree.len(), "every node reachable from root");
    for path in tree.paths() {
        let children = tree.children(path);
        let unique: HashSet<&String> = children.iter().collect();
        prop_assert_eq!(unique.len(), children.len(), "no duplicate children under {}", path);
        for child in children {
            prop_assert!(tree.contains(child), "dangling child {}", child);
            prop_assert_eq!(parent_path(child), path);
        }
        if path != ROOT {
            prop_assert!(tree.children(parent_path(path)).iter().any(|c| c == path));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn random_add_remove_keeps_tree_connected(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut tree = SceneTree::new();
        let mut attrs = AttributeStore::new();
        for op in ops {
            match op {
                Op::Add(path) => {
                    attrs.set_visibility(&path, true);
                    tree.add_node(&path, Renderable::Label { text: path.clone() });
                }
                Op::Remove(path) => {
                    let removed = tree.remove_node(&path);
                    attrs.remove_paths(&removed);
                    for p in &removed {
                        prop_assert!(!tree.contains(p));
                        prop_assert!(attrs.get(p).is_none());
                    }
                }
                Op::Reset => {
                    tree.reset();
                    attrs.clear();
                }
            }
            assert_connected(&tree)?;
        }
    }
}

#[test]
fn deep_add_makes_every_ancestor_reachable() {
    let mut tree = SceneTree::new();
    tree.add_node("/a/b/c", Renderable::Label { text: "c".into() });
    assert_eq!(tree.walk(), vec!["", "/a", "/a/b", "/a/b/c"]);
    let attrs = AttributeStore::new();
    for path in ["/a", "/a/b"] {
        let node = tree.get(path).expect("synthesized");
        assert!(node.placeholder);
        assert_eq!(node.renderable, Renderable::placeholder());
        assert!(attrs.local_pose(path).rotation.is_near_identity());
    }
}

#[test]
fn remove_cascades_through_grandchildren() {
    let mut tree = SceneTree::new();
    tree.add_node("/a/b/c/d", Renderable::Label { text: "d".into() });
    let mut removed = tree.remove_node("/a/b");
    removed.sort();
    assert_eq!(removed, ["/a/b", "/a/b/c", "/a/b/c/d"]);
    assert_eq!(tree.walk(), vec!["", "/a"]);
}
