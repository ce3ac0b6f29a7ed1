// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Process-wide scene and GUI state with a single writer.
//!
//! [`Stores::split`] hands out exactly one [`StoreWriter`] (owned by the
//! dispatcher) and a clonable [`StoreReader`] for renderers and panels.
//! Tree and attributes are always locked together, tree first, so a reader
//! never sees one message half applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use tokio::sync::watch;
use vista_app_core::notifications::{NotificationQueue, NotificationView};
use vista_geom::CameraState;
use vista_gui::GuiStore;
use vista_scene::{render_scene, AttributeStore, RenderStats, ScenePort, SceneTree};

const MAX_NOTIFICATIONS: usize = 8;

struct Shared {
    scene: RwLock<SceneTree>,
    attributes: RwLock<AttributeStore>,
    gui: RwLock<GuiStore>,
    camera: RwLock<CameraState>,
    notifications: Mutex<NotificationQueue>,
    pointer_enabled: AtomicBool,
    revision: watch::Sender<u64>,
}

impl Shared {
    fn bump(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }
}

/// Freshly built, not yet split stores.
pub struct Stores {
    shared: Arc<Shared>,
}

impl Default for Stores {
    fn default() -> Self {
        Self::new()
    }
}

impl Stores {
    /// Empty scene, empty GUI, default camera.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                scene: RwLock::new(SceneTree::new()),
                attributes: RwLock::new(AttributeStore::new()),
                gui: RwLock::new(GuiStore::new()),
                camera: RwLock::new(CameraState::default()),
                notifications: Mutex::new(NotificationQueue::new(MAX_NOTIFICATIONS)),
                pointer_enabled: AtomicBool::new(false),
                revision,
            }),
        }
    }

    /// The one writer plus a reader.
    pub fn split(self) -> (StoreWriter, StoreReader) {
        let reader = StoreReader {
            shared: Arc::clone(&self.shared),
        };
        (StoreWriter { shared: self.shared }, reader)
    }
}

/// Mutation handle. Not `Clone`: there is one per [`Stores`].
pub struct StoreWriter {
    shared: Arc<Shared>,
}

impl StoreWriter {
    /// Mutate the scene tree and node attributes together.
    pub fn write_scene<R>(&self, f: impl FnOnce(&mut SceneTree, &mut AttributeStore) -> R) -> R {
        let mut tree = self
            .shared
            .scene
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut attrs = self
            .shared
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut tree, &mut attrs)
    }

    /// Mutate the GUI store.
    pub fn write_gui<R>(&self, f: impl FnOnce(&mut GuiStore) -> R) -> R {
        let mut gui = self.shared.gui.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut gui)
    }

    /// Mutate the camera; returns the updated state.
    pub fn write_camera(&self, f: impl FnOnce(&mut CameraState)) -> CameraState {
        write_camera(&self.shared, f)
    }

    /// Mutate the notification queue.
    pub fn write_notifications<R>(&self, f: impl FnOnce(&mut NotificationQueue) -> R) -> R {
        let mut queue = self
            .shared
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut queue)
    }

    /// Enable or disable pointer capture.
    pub fn set_pointer_enabled(&self, enabled: bool) {
        self.shared.pointer_enabled.store(enabled, Ordering::Release);
    }

    /// Signal readers that one message has been fully applied.
    pub fn bump_revision(&self) {
        self.shared.bump();
    }

    /// A reader over the same state.
    pub fn reader(&self) -> StoreReader {
        StoreReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

fn write_camera(shared: &Shared, f: impl FnOnce(&mut CameraState)) -> CameraState {
    let mut camera = shared.camera.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut camera);
    *camera
}

/// Read handle for renderers and panels.
#[derive(Clone)]
pub struct StoreReader {
    shared: Arc<Shared>,
}

impl StoreReader {
    /// Read the scene tree and node attributes together.
    pub fn read_scene<R>(&self, f: impl FnOnce(&SceneTree, &AttributeStore) -> R) -> R {
        let tree = self.shared.scene.read().unwrap_or_else(PoisonError::into_inner);
        let attrs = self
            .shared
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&tree, &attrs)
    }

    /// Read the GUI store.
    pub fn read_gui<R>(&self, f: impl FnOnce(&GuiStore) -> R) -> R {
        let gui = self.shared.gui.read().unwrap_or_else(PoisonError::into_inner);
        f(&gui)
    }

    /// Current render-frame camera.
    pub fn camera(&self) -> CameraState {
        *self.shared.camera.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the server asked for pointer events.
    pub fn pointer_enabled(&self) -> bool {
        self.shared.pointer_enabled.load(Ordering::Acquire)
    }

    /// Live notifications at `now`.
    pub fn notifications(&self, now: Instant) -> Vec<NotificationView> {
        let mut queue = self
            .shared
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        queue.retain_visible(now);
        queue.visible(now)
    }

    /// Close a notification from the UI.
    pub fn dismiss_notification(&self, id: &str) {
        let mut queue = self
            .shared
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        queue.remove(id);
    }

    /// Local visibility toggle from a scene browser. Wins over the server's
    /// visibility until cleared with `None`.
    pub fn set_override_visibility(&self, path: &str, visible: Option<bool>) {
        {
            let mut attrs = self
                .shared
                .attributes
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            attrs.set_override_visibility(path, visible);
        }
        self.shared.bump();
    }

    /// Revision counter, bumped once per applied message.
    pub fn revision(&self) -> u64 {
        *self.shared.revision.borrow()
    }

    /// Receiver that wakes on every revision bump.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Push camera and scene into `port` and draw one frame.
    pub fn render(&self, port: &mut impl ScenePort) -> RenderStats {
        port.set_camera(&self.camera());
        self.read_scene(|tree, attrs| render_scene(tree, attrs, port))
    }

    pub(crate) fn update_camera(&self, f: impl FnOnce(&mut CameraState)) -> CameraState {
        let camera = write_camera(&self.shared, f);
        self.shared.bump();
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_scene::{MockAdapter, Renderable};

    #[test]
    fn reader_sees_writer_changes() {
        let (writer, reader) = Stores::new().split();
        let synthesized = writer.write_scene(|tree, _| {
            tree.add_node("/a/b", Renderable::Label { text: "hi".into() })
        });
        writer.bump_revision();
        assert_eq!(synthesized, vec!["/a".to_string()]);
        assert_eq!(reader.revision(), 1);
        assert!(reader.read_scene(|tree, _| tree.contains("/a/b")));
    }

    #[test]
    fn override_visibility_hides_node_in_render() {
        let (writer, reader) = Stores::new().split();
        writer.write_scene(|tree, _| {
            tree.add_node("/x", Renderable::Label { text: "x".into() });
        });
        reader.set_override_visibility("/x", Some(false));
        let mut port = MockAdapter::new();
        let stats = reader.render(&mut port);
        assert_eq!(stats.synced, 2);
        assert_eq!(stats.visible, 1);
        assert_eq!(port.camera, reader.camera());
        assert_eq!(port.render_count, 1);
    }

    #[test]
    fn pointer_flag_roundtrip() {
        let (writer, reader) = Stores::new().split();
        assert!(!reader.pointer_enabled());
        writer.set_pointer_enabled(true);
        assert!(reader.pointer_enabled());
    }
}
