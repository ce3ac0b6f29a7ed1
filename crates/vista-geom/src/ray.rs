// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pointer normalization and ray casting.

use glam::{Vec2, Vec3};

use crate::camera::CameraState;
use crate::frames::WORLD_FROM_RENDER;

/// A half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Ray through normalized device coordinates `ndc` of `camera`, in the
    /// render frame.
    #[must_use]
    pub fn from_camera(camera: &CameraState, ndc: Vec2) -> Self {
        let half_h = (camera.fov_y / 2.0).tan();
        let half_w = half_h * camera.aspect;
        let local = Vec3::new(ndc.x * half_w, ndc.y * half_h, -1.0).normalize();
        Self {
            origin: camera.position,
            direction: (camera.orientation() * local).normalize(),
        }
    }

    /// The same ray expressed in the world frame.
    #[must_use]
    pub fn to_world(self) -> Self {
        Self {
            origin: WORLD_FROM_RENDER * self.origin,
            direction: (WORLD_FROM_RENDER * self.direction).normalize(),
        }
    }
}

/// Maps a pointer position in pixels (origin top-left) to normalized device
/// coordinates (x right, y up, both in `[-1, 1]`).
///
/// Returns `None` for a degenerate viewport or a point outside it.
#[must_use]
pub fn normalize_click(x: f32, y: f32, width: f32, height: f32) -> Option<Vec2> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let ndc = Vec2::new(2.0 * x / width - 1.0, 1.0 - 2.0 * y / height);
    let inside = (-1.0..=1.0).contains(&ndc.x) && (-1.0..=1.0).contains(&ndc.y);
    inside.then_some(ndc)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn center_click_is_origin() {
        let ndc = normalize_click(400.0, 300.0, 800.0, 600.0).expect("inside");
        assert_eq!(ndc, Vec2::ZERO);
    }

    #[test]
    fn corners_map_to_unit_square() {
        assert_eq!(normalize_click(0.0, 0.0, 800.0, 600.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(normalize_click(800.0, 600.0, 800.0, 600.0), Some(Vec2::new(1.0, -1.0)));
    }

    #[test]
    fn outside_or_degenerate_is_rejected() {
        assert_eq!(normalize_click(-1.0, 10.0, 800.0, 600.0), None);
        assert_eq!(normalize_click(10.0, 601.0, 800.0, 600.0), None);
        assert_eq!(normalize_click(0.0, 0.0, 0.0, 600.0), None);
    }

    #[test]
    fn center_ray_looks_at_target() {
        let mut cam = CameraState::default();
        cam.set_position_world([0.0, -4.0, 0.0]);
        cam.set_look_at_world([0.0, 0.0, 0.0]);
        cam.set_up_world([0.0, 0.0, 1.0]);
        let ray = Ray::from_camera(&cam, Vec2::ZERO).to_world();
        assert!(ray.origin.abs_diff_eq(Vec3::new(0.0, -4.0, 0.0), 1e-5));
        assert!(ray.direction.abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn top_edge_ray_tilts_by_half_fov() {
        let cam = CameraState {
            position: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 1.0,
            aspect: 1.0,
        };
        let ray = Ray::from_camera(&cam, Vec2::new(0.0, 1.0));
        let angle = ray.direction.angle_between(Vec3::NEG_Z);
        assert_relative_eq!(angle, 0.5, epsilon = 1e-5);
        assert!(ray.direction.y > 0.0);
    }
}
