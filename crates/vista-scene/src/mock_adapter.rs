// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock adapter for headless testing of `ScenePort` implementations.
//!
//! MockAdapter tracks scene state in HashMaps without any GPU rendering.
//! The CLI also uses it to report what a real renderer would draw.

use std::collections::HashMap;

use vista_geom::{CameraState, RenderPose};

use crate::{ApplyError, Background, DrawItem, ScenePort};

/// What the mock holds for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct MockNode {
    /// Renderable kind name.
    pub kind: &'static str,
    /// Last synced pose.
    pub pose: RenderPose,
    /// Last synced visibility.
    pub visible: bool,
    /// Number of syncs received.
    pub syncs: u32,
}

/// Mock scene adapter for testing.
#[derive(Debug, Default)]
pub struct MockAdapter {
    /// Current nodes in the scene.
    pub nodes: HashMap<String, MockNode>,
    /// Current background.
    pub background: Option<Background>,
    /// Current camera state.
    pub camera: CameraState,
    /// Number of render calls.
    pub render_count: u32,
    /// Current viewport dimensions.
    pub viewport: (u32, u32, f32),
    /// Whether dispose has been called.
    pub disposed: bool,
    /// Paths to refuse in `sync_node`.
    pub reject: Vec<String>,
}

impl MockAdapter {
    /// Create a new mock adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of nodes in the scene.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes last synced as visible.
    pub fn visible_count(&self) -> usize {
        self.nodes.values().filter(|n| n.visible).count()
    }

    /// Get node by path.
    pub fn get_node(&self, name: &str) -> Option<&MockNode> {
        self.nodes.get(name)
    }
}

impl ScenePort for MockAdapter {
    fn sync_node(&mut self, item: &DrawItem<'_>) -> Result<(), ApplyError> {
        if self.reject.iter().any(|r| r == item.name) {
            return Err(ApplyError::Invalid {
                path: item.name.to_string(),
                reason: "rejected by mock".into(),
            });
        }
        let node = self.nodes.entry(item.name.to_string()).or_insert(MockNode {
            kind: item.renderable.kind(),
            pose: item.pose,
            visible: item.visible,
            syncs: 0,
        });
        node.kind = item.renderable.kind();
        node.pose = item.pose;
        node.visible = item.visible;
        node.syncs += 1;
        Ok(())
    }

    fn remove_node(&mut self, name: &str) {
        self.nodes.remove(name);
    }

    fn node_names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    fn set_background(&mut self, background: Option<&Background>) {
        self.background = background.cloned();
    }

    fn set_camera(&mut self, camera: &CameraState) {
        self.camera = *camera;
    }

    fn render(&mut self) {
        self.render_count += 1;
    }

    fn resize(&mut self, width: u32, height: u32, dpr: f32) {
        self.viewport = (width, height, dpr);
    }

    fn dispose(&mut self) {
        self.nodes.clear();
        self.background = None;
        self.disposed = true;
    }
}
