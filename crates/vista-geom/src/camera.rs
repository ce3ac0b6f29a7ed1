// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewer camera state and its world-frame export.

use glam::{Mat3, Quat, Vec3};

use crate::frames::{quat_to_wxyz, render_to_world, world_to_render, WORLD_FROM_RENDER};

/// Rotation from a render-frame camera (looks down -Z, +Y up) to the
/// OpenCV camera convention reported on the wire (+Z forward, +Y down).
///
/// 180° about X.
pub const CV_FROM_RENDER_CAMERA: Quat = Quat::from_xyzw(1.0, 0.0, 0.0, 0.0);

/// Orbit camera in the render frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// Eye position.
    pub position: Vec3,
    /// Orbit target.
    pub look_at: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport width / height.
    pub aspect: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: world_to_render([3.0, 3.0, 3.0]),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 50f32.to_radians(),
            aspect: 1.0,
        }
    }
}

/// Camera state expressed the way the server expects it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldCamera {
    /// OpenCV-convention orientation, scalar-first.
    pub wxyz: [f32; 4],
    /// Eye position.
    pub position: [f32; 3],
    /// Orbit target.
    pub look_at: [f32; 3],
    /// Up direction.
    pub up_direction: [f32; 3],
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Viewport width / height.
    pub aspect: f32,
}

impl CameraState {
    /// Render-frame camera orientation, built the way an orbit control's
    /// `look_at` does: -Z toward the target, +Y as close to `up` as possible.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        let z = (self.position - self.look_at).try_normalize().unwrap_or(Vec3::Z);
        let x = match self.up.cross(z).try_normalize() {
            Some(x) => x,
            // `up` is parallel to the view axis; nudge like three.js does.
            None => self
                .up
                .cross((z + Vec3::new(1e-4, 0.0, 0.0)).normalize())
                .try_normalize()
                .unwrap_or_else(|| z.any_orthonormal_vector()),
        };
        let y = z.cross(x);
        Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
    }

    /// World-frame export of this camera.
    #[must_use]
    pub fn to_world(&self) -> WorldCamera {
        let q = WORLD_FROM_RENDER * self.orientation() * CV_FROM_RENDER_CAMERA;
        WorldCamera {
            wxyz: quat_to_wxyz(q.normalize()),
            position: render_to_world(self.position),
            look_at: render_to_world(self.look_at),
            up_direction: render_to_world(self.up),
            fov: self.fov_y,
            aspect: self.aspect,
        }
    }

    /// Moves the eye to a world-frame position.
    pub fn set_position_world(&mut self, position: [f32; 3]) {
        self.position = world_to_render(position);
    }

    /// Retargets the camera to a world-frame point.
    pub fn set_look_at_world(&mut self, look_at: [f32; 3]) {
        self.look_at = world_to_render(look_at);
    }

    /// Sets the up direction from a world-frame vector.
    pub fn set_up_world(&mut self, up: [f32; 3]) {
        self.up = world_to_render(up).try_normalize().unwrap_or(Vec3::Y);
    }
}
