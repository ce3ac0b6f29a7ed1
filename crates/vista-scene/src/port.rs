// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene port trait defining the renderer contract.

use vista_geom::{CameraState, RenderPose};

use crate::{ApplyError, Background, Renderable};

/// One node as handed to a renderer.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    /// Node path.
    pub name: &'a str,
    /// What to draw.
    pub renderable: &'a Renderable,
    /// Render-frame pose with every ancestor applied.
    pub pose: RenderPose,
    /// False if this node or any ancestor is hidden.
    pub visible: bool,
    /// Distance from the root.
    pub depth: usize,
}

/// Scene rendering port trait.
///
/// Implementors receive nodes and render. No time ownership, no store
/// access: [`crate::render_scene`] does the traversal and diffing.
pub trait ScenePort {
    /// Create or update one node.
    fn sync_node(&mut self, item: &DrawItem<'_>) -> Result<(), ApplyError>;

    /// Drop a node that left the tree.
    fn remove_node(&mut self, name: &str);

    /// Paths this renderer currently holds.
    fn node_names(&self) -> Vec<String>;

    /// Set or clear the full-viewport background.
    fn set_background(&mut self, background: Option<&Background>);

    /// Set camera state.
    fn set_camera(&mut self, camera: &CameraState);

    /// Render the current scene.
    fn render(&mut self);

    /// Resize viewport.
    fn resize(&mut self, width: u32, height: u32, dpr: f32);

    /// Dispose all resources.
    fn dispose(&mut self);
}
