// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Renderable descriptors decoded from scene messages.

use bytes::Bytes;
use vista_geom::{quat_from_wxyz, FrustumGeometry, Quat, Vec3};
use vista_proto::{
    buffers, CameraFrustumMessage, GaussianSplatsMessage, ImageMessage, LabelMessage,
    MeshMaterial, MeshMessage, MeshSide, PointCloudMessage,
};

use crate::SceneError;

/// Number of 32-bit words per packed Gaussian splat.
pub const SPLAT_WORDS: usize = 8;

/// An encoded image carried through to the renderer as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Media type, e.g. `image/png`.
    pub media_type: String,
    /// Encoded bytes.
    pub data: Bytes,
}

/// Linear-blend skinning data.
#[derive(Debug, Clone, PartialEq)]
pub struct Skin {
    /// Bone rest orientations (scalar-last).
    pub bone_rotations: Vec<Quat>,
    /// Bone rest positions.
    pub bone_positions: Vec<Vec3>,
    /// Four bone indices per vertex.
    pub indices: Vec<[u16; 4]>,
    /// Four bone weights per vertex.
    pub weights: Vec<[f32; 4]>,
}

/// Triangle mesh geometry and material.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Triangle indices into `vertices`.
    pub faces: Vec<[u32; 3]>,
    /// Packed `0xRRGGBB` color.
    pub color: Option<u32>,
    /// Shading material.
    pub material: MeshMaterial,
    /// Wireframe rendering.
    pub wireframe: bool,
    /// Opacity; `None` is opaque.
    pub opacity: Option<f32>,
    /// Rendered faces.
    pub side: MeshSide,
    /// Skinning, for skinned meshes.
    pub skin: Option<Skin>,
}

/// What a scene node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
    /// Coordinate frame, optionally drawing axes.
    Frame {
        /// Axes drawn.
        show_axes: bool,
        /// Axes length.
        axes_length: f32,
        /// Axes radius.
        axes_radius: f32,
    },
    /// Colored points.
    PointCloud {
        /// Point positions.
        points: Vec<[f32; 3]>,
        /// One color per point.
        colors: Vec<[u8; 3]>,
        /// Point size in world units.
        point_size: f32,
    },
    /// Triangle mesh.
    Mesh(MeshData),
    /// Camera frustum outline.
    CameraFrustum {
        /// Line geometry in the camera frame.
        geometry: FrustumGeometry,
        /// Packed `0xRRGGBB` line color.
        color: u32,
        /// Image drawn on the far plane.
        image: Option<EncodedImage>,
    },
    /// Textured plane.
    Image {
        /// Texture.
        image: EncodedImage,
        /// Plane width.
        render_width: f32,
        /// Plane height.
        render_height: f32,
    },
    /// Gaussian splats.
    GaussianSplats {
        /// Splat centers, for depth sorting.
        centers: Vec<[f32; 3]>,
        /// Raw packed records, [`SPLAT_WORDS`] words per splat.
        words: Vec<u32>,
    },
    /// Text label.
    Label {
        /// Displayed text.
        text: String,
    },
}

impl Renderable {
    /// Invisible frame used for synthesized parents and the root.
    pub const fn placeholder() -> Self {
        Self::Frame {
            show_axes: false,
            axes_length: 0.5,
            axes_radius: 0.025,
        }
    }

    /// Short kind name for logs and test adapters.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Frame { .. } => "frame",
            Self::PointCloud { .. } => "point_cloud",
            Self::Mesh(m) if m.skin.is_some() => "skinned_mesh",
            Self::Mesh(_) => "mesh",
            Self::CameraFrustum { .. } => "camera_frustum",
            Self::Image { .. } => "image",
            Self::GaussianSplats { .. } => "gaussian_splats",
            Self::Label { .. } => "label",
        }
    }
}

fn check_len(what: &'static str, expected: usize, got: usize) -> Result<(), SceneError> {
    if expected == got {
        Ok(())
    } else {
        Err(SceneError::LengthMismatch {
            what,
            expected,
            got,
        })
    }
}

impl TryFrom<&PointCloudMessage> for Renderable {
    type Error = SceneError;

    fn try_from(msg: &PointCloudMessage) -> Result<Self, Self::Error> {
        let points = buffers::f32x3("point_cloud.position", &msg.position)?;
        let colors = buffers::u8x3("point_cloud.color", &msg.color)?;
        check_len("point_cloud.color", points.len(), colors.len())?;
        Ok(Self::PointCloud {
            points,
            colors,
            point_size: msg.point_size,
        })
    }
}

impl TryFrom<&MeshMessage> for Renderable {
    type Error = SceneError;

    fn try_from(msg: &MeshMessage) -> Result<Self, Self::Error> {
        let vertices = buffers::f32x3("mesh.vertices", &msg.vertices)?;
        let faces = buffers::u32x3("mesh.faces", &msg.faces)?;
        if let Some(&index) = faces
            .iter()
            .flatten()
            .find(|&&i| i as usize >= vertices.len())
        {
            return Err(SceneError::FaceIndex {
                index,
                vertices: vertices.len(),
            });
        }
        let skin = skin_from(msg, vertices.len())?;
        Ok(Self::Mesh(MeshData {
            vertices,
            faces,
            color: msg.color,
            material: msg.material,
            wireframe: msg.wireframe,
            opacity: msg.opacity,
            side: msg.side,
            skin,
        }))
    }
}

fn skin_from(msg: &MeshMessage, vertex_count: usize) -> Result<Option<Skin>, SceneError> {
    let (wxyzs, positions, indices, weights) = match (
        &msg.bone_wxyzs,
        &msg.bone_positions,
        &msg.skin_indices,
        &msg.skin_weights,
    ) {
        (None, None, None, None) => return Ok(None),
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        (None, ..) => return Err(SceneError::IncompleteSkin("bone_wxyzs")),
        (_, None, ..) => return Err(SceneError::IncompleteSkin("bone_positions")),
        (_, _, None, _) => return Err(SceneError::IncompleteSkin("skin_indices")),
        (.., None) => return Err(SceneError::IncompleteSkin("skin_weights")),
    };
    check_len("mesh.bone_positions", wxyzs.len(), positions.len())?;
    let indices = buffers::u16x4("mesh.skin_indices", indices)?;
    let weights = buffers::f32x4("mesh.skin_weights", weights)?;
    check_len("mesh.skin_indices", vertex_count, indices.len())?;
    check_len("mesh.skin_weights", vertex_count, weights.len())?;
    Ok(Some(Skin {
        bone_rotations: wxyzs.iter().copied().map(quat_from_wxyz).collect(),
        bone_positions: positions.iter().copied().map(Vec3::from_array).collect(),
        indices,
        weights,
    }))
}

impl From<&CameraFrustumMessage> for Renderable {
    fn from(msg: &CameraFrustumMessage) -> Self {
        let image = match (&msg.image_media_type, &msg.image_data) {
            (Some(media_type), Some(data)) => Some(EncodedImage {
                media_type: media_type.clone(),
                data: data.clone(),
            }),
            _ => None,
        };
        Self::CameraFrustum {
            geometry: FrustumGeometry::new(msg.fov, msg.aspect, msg.scale),
            color: msg.color,
            image,
        }
    }
}

impl From<&ImageMessage> for Renderable {
    fn from(msg: &ImageMessage) -> Self {
        Self::Image {
            image: EncodedImage {
                media_type: msg.media_type.clone(),
                data: msg.data.clone(),
            },
            render_width: msg.render_width,
            render_height: msg.render_height,
        }
    }
}

impl TryFrom<&GaussianSplatsMessage> for Renderable {
    type Error = SceneError;

    fn try_from(msg: &GaussianSplatsMessage) -> Result<Self, Self::Error> {
        let words = buffers::u32s("gaussian_splats.buffer", &msg.buffer)?;
        if words.len() % SPLAT_WORDS != 0 {
            return Err(vista_proto::BufferError {
                what: "gaussian_splats.buffer",
                len: msg.buffer.len(),
                stride: SPLAT_WORDS * 4,
            }
            .into());
        }
        let centers = words
            .chunks_exact(SPLAT_WORDS)
            .map(|w| [w[0], w[1], w[2]].map(f32::from_bits))
            .collect();
        Ok(Self::GaussianSplats { centers, words })
    }
}

impl From<&LabelMessage> for Renderable {
    fn from(msg: &LabelMessage) -> Self {
        Self::Label {
            text: msg.text.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn f32_bytes(xs: &[f32]) -> Bytes {
        xs.iter().flat_map(|x| x.to_le_bytes()).collect::<Vec<u8>>().into()
    }

    fn u32_bytes(xs: &[u32]) -> Bytes {
        xs.iter().flat_map(|x| x.to_le_bytes()).collect::<Vec<u8>>().into()
    }

    fn make_triangle() -> MeshMessage {
        MeshMessage::new(
            "/tri",
            f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
            u32_bytes(&[0, 1, 2]),
        )
    }

    #[test]
    fn point_cloud_requires_one_color_per_point() {
        let msg = PointCloudMessage {
            name: "/pc".into(),
            position: f32_bytes(&[0.0; 6]),
            color: Bytes::from_static(&[255, 0, 0]),
            point_size: 0.1,
        };
        assert_eq!(
            Renderable::try_from(&msg),
            Err(SceneError::LengthMismatch {
                what: "point_cloud.color",
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn mesh_decodes_typed_buffers() {
        let Renderable::Mesh(mesh) = Renderable::try_from(&make_triangle()).expect("mesh") else {
            panic!("expected mesh");
        };
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert!(mesh.skin.is_none());
    }

    #[test]
    fn mesh_rejects_out_of_range_faces() {
        let mut msg = make_triangle();
        msg.faces = u32_bytes(&[0, 1, 3]);
        assert_eq!(
            Renderable::try_from(&msg),
            Err(SceneError::FaceIndex { index: 3, vertices: 3 })
        );
    }

    #[test]
    fn partial_skin_is_rejected() {
        let mut msg = make_triangle();
        msg.bone_wxyzs = Some(vec![[1.0, 0.0, 0.0, 0.0]]);
        assert_eq!(
            Renderable::try_from(&msg),
            Err(SceneError::IncompleteSkin("bone_positions"))
        );
    }

    #[test]
    fn skinned_mesh_converts_bone_quaternions() {
        let mut msg = make_triangle();
        msg.bone_wxyzs = Some(vec![[0.0, 1.0, 0.0, 0.0]]);
        msg.bone_positions = Some(vec![[0.0, 0.0, 1.0]]);
        msg.skin_indices = Some(Bytes::from(vec![0u8; 3 * 8]));
        msg.skin_weights = Some(f32_bytes(&[1.0, 0.0, 0.0, 0.0].repeat(3)));
        let renderable = Renderable::try_from(&msg).expect("skinned");
        assert_eq!(renderable.kind(), "skinned_mesh");
        let Renderable::Mesh(MeshData { skin: Some(skin), .. }) = renderable else {
            panic!("expected skin");
        };
        assert_eq!(skin.bone_rotations[0], Quat::from_xyzw(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn splat_centers_come_from_first_three_words() {
        let mut words = vec![0u32; SPLAT_WORDS * 2];
        words[0] = 1.5f32.to_bits();
        words[SPLAT_WORDS + 2] = (-2.0f32).to_bits();
        let msg = GaussianSplatsMessage {
            name: "/splats".into(),
            buffer: u32_bytes(&words),
        };
        let Renderable::GaussianSplats { centers, .. } = Renderable::try_from(&msg).expect("splats")
        else {
            panic!("expected splats");
        };
        assert_eq!(centers, vec![[1.5, 0.0, 0.0], [0.0, 0.0, -2.0]]);
    }

    #[test]
    fn ragged_splat_buffer_is_rejected() {
        let msg = GaussianSplatsMessage {
            name: "/splats".into(),
            buffer: u32_bytes(&[0; 5]),
        };
        assert!(matches!(Renderable::try_from(&msg), Err(SceneError::Buffer(_))));
    }
}
