// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Coordinate conventions for the Vista viewer.

Two frames meet in the client:
- The *world* frame used on the wire: right-handed, +Z up.
  Orientations travel scalar-first (`wxyz`).
- The *render* frame used by the scene graph and camera: right-handed,
  +Y up. Cameras look down -Z with +Y up.

The frames differ by a fixed +90° rotation about X. Everything that crosses
the boundary goes through this crate, so a world pose pushed into the
render frame and back comes out unchanged.

This crate provides:
- Frame conversion (`frames`).
- Viewer camera state and its world-frame export (`camera`).
- Frustum and focal-length helpers (`frustum`).
- Click normalization and pointer rays (`ray`).
"]

pub mod camera;
pub mod frames;
pub mod frustum;
pub mod ray;

pub use camera::{CameraState, WorldCamera};
pub use frames::{
    quat_from_wxyz, quat_to_wxyz, RenderPose, RENDER_FROM_WORLD, WORLD_FROM_RENDER,
};
pub use frustum::{focal_lengths, fov_x_from_fov_y, FrustumGeometry};
pub use ray::{normalize_click, Ray};

pub use glam::{Quat, Vec2, Vec3};
