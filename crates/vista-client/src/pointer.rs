// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Click and drag gestures turned into world-frame rays.

use vista_geom::{normalize_click, Ray, Vec2};
use vista_proto::{Message, PointerEventKind, ScenePointerMessage};

use crate::stores::StoreReader;
use crate::throttle::ThrottledSender;

/// Screen-space movement (pixels, per axis) below which a move is noise.
pub const DRAG_THRESHOLD_PX: f32 = 3.0;

#[derive(Debug, Default)]
struct Gesture {
    origins: Vec<[f32; 3]>,
    directions: Vec<[f32; 3]>,
    screen: Vec<Vec2>,
}

impl Gesture {
    fn push(&mut self, ray: Ray, at: Vec2) {
        self.origins.push(ray.origin.to_array());
        self.directions.push(ray.direction.to_array());
        self.screen.push(at);
    }

    fn message(&self, event_type: PointerEventKind) -> ScenePointerMessage {
        ScenePointerMessage {
            event_type,
            ray_origin: self.origins.clone(),
            ray_direction: self.directions.clone(),
        }
    }
}

/// Pointer state machine: idle until a press inside the viewport, dragging
/// until release.
///
/// While dragging, camera controls are off and each move farther than
/// [`DRAG_THRESHOLD_PX`] from the previous sample records one more ray. A
/// second press while dragging is ignored.
pub struct PointerTracker {
    reader: StoreReader,
    sender: ThrottledSender,
    viewport: Vec2,
    drag: Option<Gesture>,
}

impl PointerTracker {
    /// Tracker reading camera and enable flag from `reader`.
    pub fn new(reader: StoreReader, sender: ThrottledSender) -> Self {
        Self {
            reader,
            sender,
            viewport: Vec2::ZERO,
            drag: None,
        }
    }

    /// Canvas size in CSS pixels.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    /// Returns true between an accepted press and its release.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Camera controls must be disabled while a gesture is in progress.
    pub fn camera_controls_enabled(&self) -> bool {
        self.drag.is_none()
    }

    fn ray_at(&self, x: f32, y: f32) -> Option<Ray> {
        let ndc = normalize_click(x, y, self.viewport.x, self.viewport.y)?;
        Some(Ray::from_camera(&self.reader.camera(), ndc).to_world())
    }

    /// Press at pixel `(x, y)`. Returns true if a gesture started.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        if !self.reader.pointer_enabled() || self.drag.is_some() {
            return false;
        }
        let Some(ray) = self.ray_at(x, y) else {
            return false;
        };
        let mut gesture = Gesture::default();
        gesture.push(ray, Vec2::new(x, y));
        self.drag = Some(gesture);
        true
    }

    /// Move to pixel `(x, y)`. Returns true if a sample was recorded.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        if !self.reader.pointer_enabled() || self.drag.is_none() {
            return false;
        }
        let Some(ray) = self.ray_at(x, y) else {
            return false;
        };
        let Some(gesture) = self.drag.as_mut() else {
            return false;
        };
        let at = Vec2::new(x, y);
        if let Some(last) = gesture.screen.last() {
            let delta = (at - *last).abs();
            if delta.x <= DRAG_THRESHOLD_PX && delta.y <= DRAG_THRESHOLD_PX {
                return false;
            }
        }
        gesture.push(ray, at);
        true
    }

    /// Release. Sends a click for a single-sample gesture, then a scribble
    /// with every sample. Returns what was sent.
    pub fn pointer_up(&mut self) -> Vec<ScenePointerMessage> {
        let Some(gesture) = self.drag.take() else {
            return Vec::new();
        };
        if !self.reader.pointer_enabled() || gesture.origins.is_empty() {
            return Vec::new();
        }
        let mut sent = Vec::with_capacity(2);
        if gesture.origins.len() == 1 {
            sent.push(gesture.message(PointerEventKind::Click));
        }
        sent.push(gesture.message(PointerEventKind::Scribble));
        for msg in &sent {
            self.sender.send(Message::ScenePointer(msg.clone()));
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{StoreWriter, Stores};
    use crate::throttle::{make_sender, OutboundTarget};
    use approx::assert_relative_eq;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn tracker() -> (PointerTracker, StoreWriter, mpsc::Receiver<Message>) {
        let (writer, reader) = Stores::new().split();
        writer.set_pointer_enabled(true);
        let target = OutboundTarget::new();
        let (tx, rx) = mpsc::channel(16);
        target.attach(tx);
        let mut t = PointerTracker::new(reader, make_sender(target, Duration::from_millis(20)));
        t.set_viewport(800.0, 600.0);
        (t, writer, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn drag_sends_one_scribble_with_all_samples() {
        let (mut t, _w, mut rx) = tracker();
        assert!(t.pointer_down(100.0, 100.0));
        assert!(!t.camera_controls_enabled());
        assert!(!t.pointer_down(200.0, 200.0), "second press ignored");
        assert!(!t.pointer_move(102.0, 101.0), "jitter ignored");
        for step in 1u8..=3 {
            assert!(t.pointer_move(100.0 + 10.0 * f32::from(step), 100.0));
        }
        let sent = t.pointer_up();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event_type, PointerEventKind::Scribble);
        assert_eq!(sent[0].ray_origin.len(), 4);
        assert!(t.camera_controls_enabled());

        tokio::time::sleep(Duration::from_millis(30)).await;
        let mut wire = Vec::new();
        while let Ok(m) = rx.try_recv() {
            wire.push(m);
        }
        assert_eq!(wire, vec![Message::ScenePointer(sent[0].clone())]);
    }

    #[tokio::test(start_paused = true)]
    async fn tap_sends_click_with_one_sample() {
        let (mut t, _w, mut rx) = tracker();
        assert!(t.pointer_down(400.0, 300.0));
        let sent = t.pointer_up();
        let clicks: Vec<_> = sent
            .iter()
            .filter(|m| m.event_type == PointerEventKind::Click)
            .collect();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].ray_origin.len(), 1);
        // Center of the default camera's view points at the origin.
        let dir = clicks[0].ray_direction[0];
        let origin = clicks[0].ray_origin[0];
        let to_target = vista_geom::Vec3::from(origin) * -1.0;
        let cos = vista_geom::Vec3::from(dir).dot(to_target.normalize());
        assert_relative_eq!(cos, 1.0, epsilon = 1e-4);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let mut kinds = Vec::new();
        while let Ok(Message::ScenePointer(m)) = rx.try_recv() {
            kinds.push(m.event_type);
        }
        assert_eq!(kinds, [PointerEventKind::Click, PointerEventKind::Scribble]);
    }

    #[test]
    fn disabled_or_outside_viewport_does_nothing() {
        let (mut t, writer, _rx) = tracker();
        assert!(!t.pointer_down(900.0, 10.0));
        writer.set_pointer_enabled(false);
        assert!(!t.pointer_down(10.0, 10.0));
        assert!(t.pointer_up().is_empty());
    }
}
