// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Store-to-port traversal.

use std::collections::HashSet;

use tracing::error;
use vista_geom::{RenderPose, RENDER_FROM_WORLD};

use crate::{AttributeStore, DrawItem, ScenePort, SceneTree, ROOT};

/// Counts from one [`render_scene`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Nodes handed to the port.
    pub synced: usize,
    /// Of those, nodes drawn visible.
    pub visible: usize,
    /// Stale nodes removed from the port.
    pub removed: usize,
    /// Nodes the port refused.
    pub failed: usize,
}

/// Pushes the store into `port` and renders one frame.
///
/// Walks from the root depth-first in child order. Poses compose down the
/// tree, with the world-to-render rotation applied once at the root. A
/// hidden node hides its whole subtree. Nodes the port holds that are no
/// longer in the tree are removed.
pub fn render_scene(tree: &SceneTree, attrs: &AttributeStore, port: &mut impl ScenePort) -> RenderStats {
    let mut stats = RenderStats::default();
    let mut live = HashSet::with_capacity(tree.len());
    let frame_root = RenderPose::from_rotation(RENDER_FROM_WORLD);
    let mut stack = vec![(ROOT, frame_root, true, 0usize)];

    while let Some((path, parent_pose, parent_visible, depth)) = stack.pop() {
        let Some(node) = tree.get(path) else {
            continue;
        };
        let pose = parent_pose.compose(attrs.local_pose(path));
        let visible = parent_visible && attrs.effective_visibility(path);
        let item = DrawItem {
            name: path,
            renderable: &node.renderable,
            pose,
            visible,
            depth,
        };
        live.insert(path);
        stats.synced += 1;
        if visible {
            stats.visible += 1;
        }
        if let Err(err) = port.sync_node(&item) {
            error!(path, ?err, "renderer rejected node");
            stats.failed += 1;
        }
        for child in node.children.iter().rev() {
            stack.push((child.as_str(), pose, visible, depth + 1));
        }
    }

    for name in port.node_names() {
        if !live.contains(name.as_str()) {
            port.remove_node(&name);
            stats.removed += 1;
        }
    }
    port.set_background(tree.background());
    port.render();
    stats
}
