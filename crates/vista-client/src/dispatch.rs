// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Applies decoded messages to the stores.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, error, info, trace};
use vista_proto::Message;
use vista_scene::{Background, Renderable, SceneError};

use crate::camera_sync::CameraSync;
use crate::stores::{StoreReader, StoreWriter};

/// A message that could not be applied.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The node payload did not convert into a renderable.
    #[error("scene node {path}: {source}")]
    Scene {
        /// Node path.
        path: String,
        /// Conversion failure.
        #[source]
        source: SceneError,
    },
}

fn scene_err(path: &str) -> impl FnOnce(SceneError) -> DispatchError + '_ {
    move |source| DispatchError::Scene {
        path: path.to_string(),
        source,
    }
}

/// Sole owner of the [`StoreWriter`].
///
/// Every applied message bumps the store revision once, after all of its
/// effects are in place. Handler failures are logged and swallowed so one
/// bad message never stalls the stream.
pub struct Dispatcher {
    writer: StoreWriter,
    generation: u64,
    applied: u64,
    camera_sync: Option<CameraSync>,
}

impl Dispatcher {
    /// Dispatcher writing through `writer`.
    pub fn new(writer: StoreWriter) -> Self {
        Self {
            writer,
            generation: 0,
            applied: 0,
            camera_sync: None,
        }
    }

    /// Echo server-driven camera moves back through `sync`.
    pub fn with_camera_sync(mut self, sync: CameraSync) -> Self {
        self.camera_sync = Some(sync);
        self
    }

    /// A reader over the stores this dispatcher writes.
    pub fn reader(&self) -> StoreReader {
        self.writer.reader()
    }

    /// Current connection generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Messages applied so far (including ones that failed).
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Start a new connection generation; pipelines tagged with an older
    /// generation stop applying.
    pub fn begin_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Record the endpoint shown in the status panel.
    pub fn set_server(&mut self, server: &str) {
        self.writer.write_gui(|gui| gui.set_server(server));
        self.writer.bump_revision();
    }

    /// Connection opened. Stale widgets are cleared since the server resends
    /// its GUI; returns true if any were.
    pub fn on_connected(&mut self, server: &str) -> bool {
        let reset = self.writer.write_gui(|gui| {
            gui.set_server(server);
            gui.set_connected(true);
            let had_widgets = gui.has_widgets();
            if had_widgets {
                gui.reset_gui();
            }
            had_widgets
        });
        if reset {
            info!(server, "cleared GUI from previous connection");
        }
        self.writer.bump_revision();
        reset
    }

    /// Connection lost: drop the scene and mark disconnected. Also retires
    /// the current generation so late results of the closed connection's
    /// pipeline are never applied.
    pub fn on_disconnected(&mut self) {
        self.generation += 1;
        self.writer.write_scene(|tree, attrs| {
            tree.reset();
            attrs.clear();
        });
        self.writer.write_gui(|gui| {
            gui.set_connected(false);
            gui.set_background_available(false);
        });
        self.writer.set_pointer_enabled(false);
        self.writer.bump_revision();
    }

    /// Apply one message. Never fails; errors are logged.
    pub fn dispatch(&mut self, msg: Message) {
        let kind = msg.kind().to_string();
        match self.apply(msg) {
            Ok(()) => trace!(kind, "applied message"),
            Err(err) => error!(kind, %err, "message skipped"),
        }
        self.applied += 1;
        self.writer.bump_revision();
    }

    fn add_node(&self, path: &str, renderable: Renderable) {
        let kind = renderable.kind();
        let synthesized = self
            .writer
            .write_scene(|tree, _| tree.add_node(path, renderable));
        if !synthesized.is_empty() {
            debug!(path, ?synthesized, "synthesized placeholder parents");
        }
        trace!(path, kind, "scene node added");
    }

    fn apply(&mut self, msg: Message) -> Result<(), DispatchError> {
        match msg {
            Message::Frame(m) => {
                self.writer.write_scene(|tree, attrs| {
                    tree.add_node(
                        &m.name,
                        Renderable::Frame {
                            show_axes: m.show_axes,
                            axes_length: m.axes_length,
                            axes_radius: m.axes_radius,
                        },
                    );
                    attrs.set_orientation_wxyz(&m.name, m.wxyz);
                    attrs.set_position(&m.name, m.position);
                });
            }
            Message::PointCloud(m) => {
                let r = Renderable::try_from(&m).map_err(scene_err(&m.name))?;
                self.add_node(&m.name, r);
            }
            Message::Mesh(m) | Message::SkinnedMesh(m) => {
                let r = Renderable::try_from(&m).map_err(scene_err(&m.name))?;
                self.add_node(&m.name, r);
            }
            Message::CameraFrustum(m) => self.add_node(&m.name, Renderable::from(&m)),
            Message::Image(m) => self.add_node(&m.name, Renderable::from(&m)),
            Message::GaussianSplats(m) => {
                let r = Renderable::try_from(&m).map_err(scene_err(&m.name))?;
                self.add_node(&m.name, r);
            }
            Message::Label(m) => self.add_node(&m.name, Renderable::from(&m)),
            Message::BackgroundImage(m) => {
                let background = m.rgb_data.map(|rgb| Background {
                    media_type: m.media_type,
                    rgb,
                    depth: m.depth_data,
                });
                let available = background.is_some();
                self.writer
                    .write_scene(|tree, _| tree.set_background(background));
                self.writer
                    .write_gui(|gui| gui.set_background_available(available));
            }
            Message::RemoveSceneNode(m) => {
                let removed = self.writer.write_scene(|tree, attrs| {
                    let removed = tree.remove_node(&m.name);
                    attrs.remove_paths(removed.as_slice());
                    removed
                });
                debug!(path = %m.name, count = removed.len(), "scene nodes removed");
            }
            Message::SetSceneNodeVisibility(m) => self
                .writer
                .write_scene(|_, attrs| attrs.set_visibility(&m.name, m.visible)),
            Message::SetOrientation(m) => self
                .writer
                .write_scene(|_, attrs| attrs.set_orientation_wxyz(&m.name, m.wxyz)),
            Message::SetPosition(m) => self
                .writer
                .write_scene(|_, attrs| attrs.set_position(&m.name, m.position)),
            Message::ResetScene => {
                self.writer.write_scene(|tree, attrs| {
                    tree.reset();
                    attrs.clear();
                });
                self.writer
                    .write_gui(|gui| gui.set_background_available(false));
            }

            m @ (Message::GuiAddButton(_)
            | Message::GuiAddCheckbox(_)
            | Message::GuiAddDropdown(_)
            | Message::GuiAddFolder(_)
            | Message::GuiAddTabGroup(_)
            | Message::GuiAddNumber(_)
            | Message::GuiAddRgb(_)
            | Message::GuiAddRgba(_)
            | Message::GuiAddSlider(_)
            | Message::GuiAddButtonGroup(_)
            | Message::GuiAddText(_)
            | Message::GuiAddVector2(_)
            | Message::GuiAddVector3(_)
            | Message::GuiAddMarkdown(_)) => {
                if let Some(config) = m.into_gui_config() {
                    self.writer.write_gui(|gui| gui.add_gui(config));
                }
            }
            Message::GuiModal(m) => self.writer.write_gui(|gui| gui.add_modal(m)),
            Message::GuiCloseModal(m) => self.writer.write_gui(|gui| gui.remove_modal(&m.id)),
            Message::GuiSet(m) => self.writer.write_gui(|gui| gui.set_gui_value(&m.id, m.value)),
            Message::GuiUpdate(m) => self.writer.write_gui(|gui| gui.set_gui_value(&m.id, m.value)),
            Message::GuiUpdateConfig(m) => {
                if !self
                    .writer
                    .write_gui(|gui| gui.update_gui_config(&m.id, m.config))
                {
                    debug!(id = %m.id, "config update for unknown widget ignored");
                }
            }
            Message::GuiSetVisible(m) => self
                .writer
                .write_gui(|gui| gui.set_gui_visible(&m.id, m.visible)),
            Message::GuiSetDisabled(m) => self
                .writer
                .write_gui(|gui| gui.set_gui_disabled(&m.id, m.disabled)),
            Message::GuiRemove(m) => self.writer.write_gui(|gui| gui.remove_gui(&m.id)),
            Message::ThemeConfiguration(m) => self.writer.write_gui(|gui| gui.set_theme(m)),
            Message::Notification(m) => {
                self.writer
                    .write_notifications(|q| q.push(&m, Instant::now()));
            }
            Message::RemoveNotification(m) => {
                self.writer.write_notifications(|q| q.remove(&m.id));
            }

            Message::SetCameraPosition(m) => {
                self.move_camera(|c| c.set_position_world(m.position));
            }
            Message::SetCameraLookAt(m) => self.move_camera(|c| c.set_look_at_world(m.look_at)),
            Message::SetCameraUpDirection(m) => self.move_camera(|c| c.set_up_world(m.up_direction)),
            Message::SetCameraFov(m) => self.move_camera(|c| c.fov_y = m.fov),
            Message::ScenePointerEnable(m) => self.writer.set_pointer_enabled(m.enable),

            m @ (Message::ViewerCamera(_) | Message::ScenePointer(_)) => {
                debug!(kind = m.kind(), "ignoring client-to-server message from server");
            }
            Message::Unknown { kind } => trace!(kind, "skipping unknown message"),
        }
        Ok(())
    }

    fn move_camera(&self, f: impl FnOnce(&mut vista_geom::CameraState)) {
        let camera = self.writer.write_camera(f);
        if let Some(sync) = &self.camera_sync {
            sync.send(&camera);
        }
    }
}
