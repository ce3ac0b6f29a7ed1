// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field-of-view, focal length and frustum geometry.

use glam::Vec3;

/// Horizontal field of view for a vertical one at the given aspect ratio.
#[must_use]
pub fn fov_x_from_fov_y(fov_y: f32, aspect: f32) -> f32 {
    2.0 * ((fov_y / 2.0).tan() * aspect).atan()
}

/// Pixel focal lengths `(fx, fy)` for a viewport of `width` x `height` CSS
/// pixels at the given device pixel ratio.
#[must_use]
pub fn focal_lengths(fov_y: f32, width: f32, height: f32, device_pixel_ratio: f32) -> (f32, f32) {
    let aspect = width / height;
    let fov_x = fov_x_from_fov_y(fov_y, aspect);
    let fy = device_pixel_ratio * height / (2.0 * (fov_y / 2.0).tan());
    let fx = device_pixel_ratio * width / (2.0 * (fov_x / 2.0).tan());
    (fx, fy)
}

/// Line geometry of a camera frustum in the OpenCV camera frame
/// (+Z forward, +Y down), scaled so the image plane sits at `z = scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrustumGeometry {
    /// Image-plane corners: top-left, top-right, bottom-right, bottom-left.
    pub corners: [Vec3; 4],
    /// Line segments: four rays from the origin, the image-plane outline and
    /// a small "up" marker above the top edge.
    pub segments: Vec<(Vec3, Vec3)>,
}

impl FrustumGeometry {
    /// Frustum for a vertical `fov` (radians) and `aspect` ratio.
    #[must_use]
    pub fn new(fov: f32, aspect: f32, scale: f32) -> Self {
        let y = (fov / 2.0).tan();
        let x = y * aspect;
        let corners = [
            Vec3::new(-x, -y, 1.0) * scale,
            Vec3::new(x, -y, 1.0) * scale,
            Vec3::new(x, y, 1.0) * scale,
            Vec3::new(-x, y, 1.0) * scale,
        ];
        let mut segments = Vec::with_capacity(11);
        for c in corners {
            segments.push((Vec3::ZERO, c));
        }
        for i in 0..4 {
            segments.push((corners[i], corners[(i + 1) % 4]));
        }
        // Up marker: a small triangle over the top (-Y) edge.
        let tip = Vec3::new(0.0, -1.3 * y, 1.0) * scale;
        let left = Vec3::new(-0.5 * x, -1.05 * y, 1.0) * scale;
        let right = Vec3::new(0.5 * x, -1.05 * y, 1.0) * scale;
        segments.push((left, tip));
        segments.push((tip, right));
        segments.push((right, left));
        Self { corners, segments }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f32::consts::FRAC_PI_2;

    #[test]
    fn square_aspect_keeps_fov() {
        assert_relative_eq!(fov_x_from_fov_y(1.0, 1.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn wide_aspect_widens_fov() {
        let fov_x = fov_x_from_fov_y(FRAC_PI_2, 2.0);
        assert_relative_eq!(fov_x, 2.0 * 2.0f32.atan(), epsilon = 1e-6);
    }

    #[test]
    fn focal_lengths_match_for_square_pixels() {
        let (fx, fy) = focal_lengths(FRAC_PI_2, 800.0, 600.0, 2.0);
        assert_relative_eq!(fy, 600.0, epsilon = 1e-3);
        assert_relative_eq!(fx, fy, epsilon = 1e-3);
    }

    #[test]
    fn frustum_corners_sit_on_image_plane() {
        let geom = FrustumGeometry::new(FRAC_PI_2, 1.5, 0.3);
        for c in geom.corners {
            assert_relative_eq!(c.z, 0.3, epsilon = 1e-6);
        }
        assert_relative_eq!(geom.corners[1].x, 0.45, epsilon = 1e-5);
        assert_relative_eq!(geom.corners[2].y, 0.3, epsilon = 1e-5);
        assert_eq!(geom.segments.len(), 11);
    }
}
