// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewer camera reporting.

use vista_geom::CameraState;
use vista_proto::{Message, ViewerCameraMessage};

use crate::stores::StoreReader;
use crate::throttle::ThrottledSender;

/// World-frame camera report for `camera`.
pub fn viewer_camera_message(camera: &CameraState) -> ViewerCameraMessage {
    let world = camera.to_world();
    ViewerCameraMessage {
        wxyz: world.wxyz,
        position: world.position,
        aspect: world.aspect,
        fov: world.fov,
        look_at: world.look_at,
        up_direction: world.up_direction,
    }
}

/// Pushes camera changes to the server through a throttled sender.
#[derive(Clone)]
pub struct CameraSync {
    reader: StoreReader,
    sender: ThrottledSender,
}

impl CameraSync {
    /// Sync over `reader`'s camera, sending through `sender`.
    pub fn new(reader: StoreReader, sender: ThrottledSender) -> Self {
        Self { reader, sender }
    }

    /// Apply a local camera change (orbit, zoom) and report it.
    pub fn update(&self, f: impl FnOnce(&mut CameraState)) {
        let camera = self.reader.update_camera(f);
        self.send(&camera);
    }

    /// New viewport size; updates the aspect ratio.
    pub fn resize(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let aspect = width as f32 / height as f32;
        self.update(|c| c.aspect = aspect);
    }

    /// Report the current camera as is.
    pub fn publish(&self) {
        self.send(&self.reader.camera());
    }

    /// Report `camera`.
    pub fn send(&self, camera: &CameraState) {
        self.sender
            .send(Message::ViewerCamera(viewer_camera_message(camera)));
    }
}
