// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! World/render frame conversion and quaternion layout helpers.
//!
//! Poses stay in the wire's convention all the way down the scene tree; a
//! root pose carrying [`RENDER_FROM_WORLD`] moves everything into the render
//! frame at once.

use core::f32::consts::FRAC_1_SQRT_2;

use glam::{Quat, Vec3};

/// Rotation taking render-frame (+Y up) vectors into the world frame (+Z up).
///
/// +90° about X: render +Y maps to world +Z.
pub const WORLD_FROM_RENDER: Quat = Quat::from_xyzw(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);

/// Inverse of [`WORLD_FROM_RENDER`].
pub const RENDER_FROM_WORLD: Quat = Quat::from_xyzw(-FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);

/// Builds a quaternion from the wire's scalar-first layout.
#[must_use]
pub fn quat_from_wxyz(wxyz: [f32; 4]) -> Quat {
    let [w, x, y, z] = wxyz;
    Quat::from_xyzw(x, y, z, w)
}

/// Returns the wire's scalar-first layout of `q`.
#[must_use]
pub fn quat_to_wxyz(q: Quat) -> [f32; 4] {
    [q.w, q.x, q.y, q.z]
}

/// A pose in the render frame with a scalar-last quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPose {
    /// Orientation.
    pub rotation: Quat,
    /// Position.
    pub translation: Vec3,
}

impl Default for RenderPose {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            translation: Vec3::ZERO,
        }
    }
}

impl RenderPose {
    /// Pose with only a rotation.
    #[must_use]
    pub const fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            translation: Vec3::ZERO,
        }
    }

    /// Places a child pose, given relative to `self`, into `self`'s frame.
    #[must_use]
    pub fn compose(self, local: RenderPose) -> RenderPose {
        RenderPose {
            rotation: (self.rotation * local.rotation).normalize(),
            translation: self.translation + self.rotation * local.translation,
        }
    }
}

/// Rotates a world-frame vector into the render frame.
#[must_use]
pub fn world_to_render(v: [f32; 3]) -> Vec3 {
    RENDER_FROM_WORLD * Vec3::from_array(v)
}

/// Rotates a render-frame vector into the world frame.
#[must_use]
pub fn render_to_world(v: Vec3) -> [f32; 3] {
    (WORLD_FROM_RENDER * v).to_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn render_up_is_world_up() {
        let up = WORLD_FROM_RENDER * Vec3::Y;
        assert!(up.abs_diff_eq(Vec3::Z, 1e-6));
        assert!((RENDER_FROM_WORLD * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn constants_are_inverses() {
        assert!((WORLD_FROM_RENDER * RENDER_FROM_WORLD).abs_diff_eq(Quat::IDENTITY, 1e-6));
        let expected = Quat::from_rotation_x(core::f32::consts::FRAC_PI_2);
        assert!(WORLD_FROM_RENDER.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn wxyz_layout_is_scalar_first() {
        let q = quat_from_wxyz([1.0, 0.0, 0.0, 0.0]);
        assert_eq!(q, Quat::IDENTITY);
        assert_eq!(quat_to_wxyz(Quat::from_xyzw(0.1, 0.2, 0.3, 0.9)), [0.9, 0.1, 0.2, 0.3]);
    }

    #[test]
    fn compose_applies_parent_rotation_to_child_offset() {
        let parent = RenderPose {
            rotation: Quat::from_rotation_z(core::f32::consts::FRAC_PI_2),
            translation: Vec3::new(1.0, 0.0, 0.0),
        };
        let child = RenderPose {
            rotation: Quat::IDENTITY,
            translation: Vec3::new(1.0, 0.0, 0.0),
        };
        let global = parent.compose(child);
        assert!(global.translation.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
        assert!(global.rotation.abs_diff_eq(parent.rotation, 1e-6));
    }

    fn same_rotation(a: [f32; 4], b: [f32; 4]) -> bool {
        // q and -q encode the same rotation.
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        (dot.abs() - 1.0).abs() < 1e-4
    }

    proptest! {
        #[test]
        fn wire_pose_survives_render_roundtrip(
            axis in (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
                .prop_filter("non-degenerate axis", |(x, y, z)| x * x + y * y + z * z > 1e-3),
            angle in -3.1f32..3.1,
            p in (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0),
        ) {
            let axis = Vec3::new(axis.0, axis.1, axis.2).normalize();
            let wxyz = quat_to_wxyz(Quat::from_axis_angle(axis, angle));
            let position = [p.0, p.1, p.2];
            let local = RenderPose {
                rotation: quat_from_wxyz(wxyz),
                translation: world_to_render(position),
            };
            let rendered = RenderPose::from_rotation(RENDER_FROM_WORLD).compose(RenderPose {
                rotation: quat_from_wxyz(wxyz),
                translation: Vec3::from_array(position),
            });
            prop_assert!(rendered.translation.abs_diff_eq(local.translation, 1e-3));
            let back = quat_to_wxyz((WORLD_FROM_RENDER * rendered.rotation).normalize());
            prop_assert!(same_rotation(back, wxyz));
            let back_position = render_to_world(rendered.translation);
            for i in 0..3 {
                prop_assert!((back_position[i] - position[i]).abs() < 1e-3);
            }
        }
    }
}
