// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene-tree message payloads.
//!
//! Node names are `/`-separated paths. Orientations travel scalar-first
//! (`wxyz`), positions as `[x, y, z]`, both in the world frame (+Z up).
//! Binary fields hold packed little-endian arrays; see [`crate::buffers`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_axes_length() -> f32 {
    0.5
}

fn default_axes_radius() -> f32 {
    0.025
}

fn default_point_size() -> f32 {
    0.1
}

fn default_frustum_scale() -> f32 {
    0.3
}

fn default_frustum_color() -> u32 {
    0x00_80_80_80
}

const fn identity_wxyz() -> [f32; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

/// Coordinate frame node, optionally drawing its axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    /// Node path.
    pub name: String,
    /// Orientation relative to the parent (scalar-first).
    #[serde(default = "identity_wxyz")]
    pub wxyz: [f32; 4],
    /// Position relative to the parent.
    #[serde(default)]
    pub position: [f32; 3],
    /// Whether the axes gizmo is drawn.
    #[serde(default = "default_true")]
    pub show_axes: bool,
    /// Axes length (also reported as `scale` by older servers).
    #[serde(default = "default_axes_length", alias = "scale")]
    pub axes_length: f32,
    /// Axes cylinder radius.
    #[serde(default = "default_axes_radius")]
    pub axes_radius: f32,
}

impl FrameMessage {
    /// Frame at the identity pose with its axes shown.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wxyz: identity_wxyz(),
            position: [0.0; 3],
            show_axes: true,
            axes_length: default_axes_length(),
            axes_radius: default_axes_radius(),
        }
    }
}

/// Point cloud node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloudMessage {
    /// Node path.
    pub name: String,
    /// Packed `f32x3` positions.
    pub position: Bytes,
    /// Packed `u8x3` colors, one per point.
    pub color: Bytes,
    /// Rendered point size in world units.
    #[serde(default = "default_point_size")]
    pub point_size: f32,
}

/// Mesh shading material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshMaterial {
    /// Lit standard material.
    #[default]
    Standard,
    /// Toon shading with 3 bands.
    Toon3,
    /// Toon shading with 5 bands.
    Toon5,
}

/// Which triangle faces a mesh renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshSide {
    /// Front faces only.
    #[default]
    Front,
    /// Back faces only.
    Back,
    /// Both faces.
    Double,
}

/// Triangle mesh node, with optional linear-blend skinning data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshMessage {
    /// Node path.
    pub name: String,
    /// Packed `f32x3` vertices.
    pub vertices: Bytes,
    /// Packed `u32x3` triangle indices.
    pub faces: Bytes,
    /// Packed `0xRRGGBB` color; `None` uses the renderer default.
    #[serde(default)]
    pub color: Option<u32>,
    /// Shading material.
    #[serde(default)]
    pub material: MeshMaterial,
    /// Render as wireframe.
    #[serde(default)]
    pub wireframe: bool,
    /// Opacity in `[0, 1]`; `None` is opaque.
    #[serde(default)]
    pub opacity: Option<f32>,
    /// Rendered faces.
    #[serde(default)]
    pub side: MeshSide,
    /// Bone rest orientations (scalar-first).
    #[serde(default)]
    pub bone_wxyzs: Option<Vec<[f32; 4]>>,
    /// Bone rest positions.
    #[serde(default)]
    pub bone_positions: Option<Vec<[f32; 3]>>,
    /// Packed `u16x4` bone indices per vertex.
    #[serde(default)]
    pub skin_indices: Option<Bytes>,
    /// Packed `f32x4` bone weights per vertex.
    #[serde(default)]
    pub skin_weights: Option<Bytes>,
}

impl MeshMessage {
    /// Unskinned mesh with default material settings.
    pub fn new(name: impl Into<String>, vertices: Bytes, faces: Bytes) -> Self {
        Self {
            name: name.into(),
            vertices,
            faces,
            color: None,
            material: MeshMaterial::Standard,
            wireframe: false,
            opacity: None,
            side: MeshSide::Front,
            bone_wxyzs: None,
            bone_positions: None,
            skin_indices: None,
            skin_weights: None,
        }
    }
}

/// Camera frustum node, optionally textured with the captured image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraFrustumMessage {
    /// Node path.
    pub name: String,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Image width / height.
    pub aspect: f32,
    /// Frustum depth in world units.
    #[serde(default = "default_frustum_scale")]
    pub scale: f32,
    /// Packed `0xRRGGBB` line color.
    #[serde(default = "default_frustum_color")]
    pub color: u32,
    /// Media type of `image_data` (`image/jpeg` or `image/png`).
    #[serde(default)]
    pub image_media_type: Option<String>,
    /// Encoded image drawn on the frustum far plane.
    #[serde(default)]
    pub image_data: Option<Bytes>,
}

/// Image plane node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMessage {
    /// Node path.
    pub name: String,
    /// Media type of `data`.
    pub media_type: String,
    /// Encoded image bytes.
    pub data: Bytes,
    /// Plane width in world units.
    pub render_width: f32,
    /// Plane height in world units.
    pub render_height: f32,
}

/// Scene background, optionally with per-pixel depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImageMessage {
    /// Media type of `rgb_data`.
    pub media_type: String,
    /// Encoded color image; `None` clears the background.
    #[serde(default)]
    pub rgb_data: Option<Bytes>,
    /// Encoded depth image.
    #[serde(default)]
    pub depth_data: Option<Bytes>,
}

/// Gaussian splat node.
///
/// `buffer` packs one splat per 32 bytes: center `f32x3`, a `u32` of packed
/// RGBA, then upper-triangular covariance as six `f16` plus padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianSplatsMessage {
    /// Node path.
    pub name: String,
    /// Packed splat records.
    pub buffer: Bytes,
}

/// Text label node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMessage {
    /// Node path.
    pub name: String,
    /// Displayed text.
    pub text: String,
}

/// Removes a node and its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSceneNodeMessage {
    /// Node path.
    pub name: String,
}

/// Sets server-side visibility for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSceneNodeVisibilityMessage {
    /// Node path.
    pub name: String,
    /// New visibility.
    pub visible: bool,
}

/// Sets a node orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOrientationMessage {
    /// Node path.
    pub name: String,
    /// Orientation relative to the parent (scalar-first).
    pub wxyz: [f32; 4],
}

/// Sets a node position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPositionMessage {
    /// Node path.
    pub name: String,
    /// Position relative to the parent.
    pub position: [f32; 3],
}
