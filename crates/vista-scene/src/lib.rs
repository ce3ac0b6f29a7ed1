// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene store and renderer contract for the Vista viewer.
//!
//! The store is split in two by update rate:
//!
//! - [`SceneTree`] maps `/`-separated paths to renderable descriptors and
//!   keeps every node reachable from the root, synthesizing invisible
//!   placeholder parents when a child arrives first.
//! - [`AttributeStore`] holds per-path pose and visibility, which servers
//!   update at high frequency without touching the tree.
//!
//! # Design Principles
//!
//! - **Renderers are dumb**: [`render_scene`] walks the store and hands each
//!   node to a [`ScenePort`] with its composed pose and effective visibility.
//! - **One conversion**: wire quaternions are reordered once, at ingestion;
//!   only the root carries the world-to-render rotation.

use thiserror::Error;

mod attributes;
mod mock_adapter;
mod port;
mod render;
mod renderable;
mod tree;

pub use attributes::{AttributeStore, NodeAttributes};
pub use mock_adapter::{MockAdapter, MockNode};
pub use port::{DrawItem, ScenePort};
pub use render::{render_scene, RenderStats};
pub use renderable::{EncodedImage, MeshData, Renderable, Skin, SPLAT_WORDS};
pub use tree::{parent_path, Background, SceneNode, SceneTree, ROOT};

/// Error type for a renderer failing to take a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The node description is inconsistent for this backend.
    #[error("invalid node {path}: {reason}")]
    Invalid {
        /// Node path.
        path: String,
        /// What went wrong.
        reason: String,
    },
    /// A backend-specific error occurred.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Error type for turning a message into a renderable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// A packed buffer has a ragged length.
    #[error(transparent)]
    Buffer(#[from] vista_proto::BufferError),
    /// Two parallel arrays disagree in length.
    #[error("{what}: expected {expected} elements, got {got}")]
    LengthMismatch {
        /// Field being checked.
        what: &'static str,
        /// Expected element count.
        expected: usize,
        /// Actual element count.
        got: usize,
    },
    /// A face references a vertex that does not exist.
    #[error("face index {index} out of range for {vertices} vertices")]
    FaceIndex {
        /// Offending index.
        index: u32,
        /// Vertex count.
        vertices: usize,
    },
    /// Only some of the four skinning fields are present.
    #[error("skinned mesh is missing {0}")]
    IncompleteSkin(&'static str),
}
