// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the Vista viewer protocol.
//!
//! Every frame exchanged with a scene server is one CBOR map carrying a
//! `type` discriminator plus the fields of that message kind. Scene-tree
//! updates, GUI widget state, camera commands and pointer events all share
//! the single [`Message`] enum; the [`codec`] module turns frames into
//! messages and back.

pub mod buffers;
pub mod codec;
mod gui;
mod scene;
pub mod wire;

pub use buffers::BufferError;
pub use codec::{decode, encode, CodecError};
pub use gui::*;
pub use scene::*;

use serde::{Deserialize, Serialize};

/// Default TCP endpoint a viewer connects to when nothing else is configured.
pub const DEFAULT_SERVER: &str = "127.0.0.1:8080";

/// Default Unix socket path for a local scene server.
///
/// Prefers a per-user runtime dir (`XDG_RUNTIME_DIR`) and falls back to
/// `/tmp` when unavailable.
pub fn default_socket_path() -> std::path::PathBuf {
    let base = std::env::var_os("XDG_RUNTIME_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
    base.join("vista.sock")
}

/// Camera state reported by the viewer, expressed in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerCameraMessage {
    /// Camera orientation (scalar-first), OpenCV convention (+Z forward, +Y down).
    pub wxyz: [f32; 4],
    /// Camera position.
    pub position: [f32; 3],
    /// Viewport width / height.
    pub aspect: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Orbit target.
    pub look_at: [f32; 3],
    /// World-frame up direction.
    pub up_direction: [f32; 3],
}

/// Server request to move the viewer camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetCameraPositionMessage {
    /// New camera position (world frame).
    pub position: [f32; 3],
}

/// Server request to retarget the viewer camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetCameraLookAtMessage {
    /// New orbit target (world frame).
    pub look_at: [f32; 3],
}

/// Server request to change the camera up direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetCameraUpDirectionMessage {
    /// New up direction (world frame).
    pub up_direction: [f32; 3],
}

/// Server request to change the vertical field of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetCameraFovMessage {
    /// Vertical field of view in radians.
    pub fov: f32,
}

/// Pointer gesture reported to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    /// A press and release with no meaningful movement in between.
    Click,
    /// The full polyline of a drag gesture.
    Scribble,
}

/// World-frame rays sampled along a pointer gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePointerMessage {
    /// Gesture kind.
    pub event_type: PointerEventKind,
    /// One ray origin per sample.
    pub ray_origin: Vec<[f32; 3]>,
    /// One unit ray direction per sample.
    pub ray_direction: Vec<[f32; 3]>,
}

/// Server toggle for pointer-event capture in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePointerEnableMessage {
    /// Whether clicks and drags should be captured and reported.
    pub enable: bool,
}

/// Every message kind of the viewer protocol.
///
/// The serde tag is the wire `type` string. [`Message::Unknown`] never comes
/// off the wire as such: the decoder produces it for tags this build does not
/// recognise so the caller can skip them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Add or replace a coordinate frame node.
    #[serde(rename = "frame")]
    Frame(FrameMessage),
    /// Add or replace a point cloud node.
    #[serde(rename = "point_cloud")]
    PointCloud(PointCloudMessage),
    /// Add or replace a triangle mesh node.
    #[serde(rename = "mesh")]
    Mesh(MeshMessage),
    /// Add or replace a skinned triangle mesh node.
    #[serde(rename = "skinned_mesh")]
    SkinnedMesh(MeshMessage),
    /// Add or replace a camera frustum node.
    #[serde(rename = "camera_frustum")]
    CameraFrustum(CameraFrustumMessage),
    /// Add or replace an image plane node.
    #[serde(rename = "image")]
    Image(ImageMessage),
    /// Replace the scene background.
    #[serde(rename = "background_image")]
    BackgroundImage(BackgroundImageMessage),
    /// Add or replace a Gaussian splat node.
    #[serde(rename = "gaussian_splats")]
    GaussianSplats(GaussianSplatsMessage),
    /// Add or replace a text label node.
    #[serde(rename = "label")]
    Label(LabelMessage),
    /// Remove a node and everything under it.
    #[serde(rename = "remove_scene_node")]
    RemoveSceneNode(RemoveSceneNodeMessage),
    /// Set the server-side visibility of a node.
    #[serde(rename = "set_scene_node_visibility")]
    SetSceneNodeVisibility(SetSceneNodeVisibilityMessage),
    /// Set a node orientation.
    #[serde(rename = "set_orientation")]
    SetOrientation(SetOrientationMessage),
    /// Set a node position.
    #[serde(rename = "set_position")]
    SetPosition(SetPositionMessage),
    /// Drop every node except the root.
    #[serde(rename = "reset_scene")]
    ResetScene,

    /// Add a button widget.
    #[serde(rename = "GuiAddButtonMessage")]
    GuiAddButton(GuiAdd<ButtonProps>),
    /// Add a checkbox widget.
    #[serde(rename = "GuiAddCheckboxMessage")]
    GuiAddCheckbox(GuiAdd<CheckboxProps>),
    /// Add a dropdown widget.
    #[serde(rename = "GuiAddDropdownMessage")]
    GuiAddDropdown(GuiAdd<DropdownProps>),
    /// Add a folder container.
    #[serde(rename = "GuiAddFolderMessage")]
    GuiAddFolder(GuiAdd<FolderProps>),
    /// Add a tab group container.
    #[serde(rename = "GuiAddTabGroupMessage")]
    GuiAddTabGroup(GuiAdd<TabGroupProps>),
    /// Add a numeric input.
    #[serde(rename = "GuiAddNumberMessage")]
    GuiAddNumber(GuiAdd<NumberProps>),
    /// Add an RGB color picker.
    #[serde(rename = "GuiAddRgbMessage")]
    GuiAddRgb(GuiAdd<RgbProps>),
    /// Add an RGBA color picker.
    #[serde(rename = "GuiAddRgbaMessage")]
    GuiAddRgba(GuiAdd<RgbaProps>),
    /// Add a slider.
    #[serde(rename = "GuiAddSliderMessage")]
    GuiAddSlider(GuiAdd<SliderProps>),
    /// Add a button group.
    #[serde(rename = "GuiAddButtonGroupMessage")]
    GuiAddButtonGroup(GuiAdd<ButtonGroupProps>),
    /// Add a text input.
    #[serde(rename = "GuiAddTextMessage")]
    GuiAddText(GuiAdd<TextProps>),
    /// Add a 2-vector input.
    #[serde(rename = "GuiAddVector2Message")]
    GuiAddVector2(GuiAdd<Vector2Props>),
    /// Add a 3-vector input.
    #[serde(rename = "GuiAddVector3Message")]
    GuiAddVector3(GuiAdd<Vector3Props>),
    /// Add a markdown block.
    #[serde(rename = "GuiAddMarkdownMessage")]
    GuiAddMarkdown(GuiAdd<MarkdownProps>),
    /// Open a modal.
    #[serde(rename = "GuiModalMessage")]
    GuiModal(GuiModalMessage),
    /// Close a modal.
    #[serde(rename = "GuiCloseModalMessage")]
    GuiCloseModal(GuiCloseModalMessage),
    /// Server-driven widget value change.
    #[serde(rename = "gui_set")]
    GuiSet(GuiSetValueMessage),
    /// Replace the kind-specific configuration of an existing widget.
    #[serde(rename = "gui_update_config")]
    GuiUpdateConfig(GuiUpdateConfigMessage),
    /// Toggle widget visibility.
    #[serde(rename = "gui_set_visible")]
    GuiSetVisible(GuiSetVisibleMessage),
    /// Toggle widget disabled state.
    #[serde(rename = "gui_set_disabled")]
    GuiSetDisabled(GuiSetDisabledMessage),
    /// Remove a widget.
    #[serde(rename = "remove_gui")]
    GuiRemove(GuiRemoveMessage),
    /// Client-driven widget value change.
    #[serde(rename = "gui_update")]
    GuiUpdate(GuiUpdateMessage),
    /// Panel theme and layout.
    #[serde(rename = "ThemeConfigurationMessage")]
    ThemeConfiguration(ThemeConfigurationMessage),
    /// Show or update a notification.
    #[serde(rename = "notification")]
    Notification(NotificationMessage),
    /// Dismiss a notification.
    #[serde(rename = "remove_notification")]
    RemoveNotification(RemoveNotificationMessage),

    /// Move the viewer camera.
    #[serde(rename = "set_camera_position")]
    SetCameraPosition(SetCameraPositionMessage),
    /// Retarget the viewer camera.
    #[serde(rename = "set_camera_look_at")]
    SetCameraLookAt(SetCameraLookAtMessage),
    /// Change the camera up direction.
    #[serde(rename = "set_camera_up_direction")]
    SetCameraUpDirection(SetCameraUpDirectionMessage),
    /// Change the camera field of view.
    #[serde(rename = "set_camera_fov")]
    SetCameraFov(SetCameraFovMessage),
    /// Enable or disable pointer capture.
    #[serde(rename = "scene_pointer_enable")]
    ScenePointerEnable(ScenePointerEnableMessage),

    /// Viewer camera state (client to server).
    #[serde(rename = "ViewerCameraMessage")]
    ViewerCamera(ViewerCameraMessage),
    /// Pointer gesture (client to server).
    #[serde(rename = "ScenePointerMessage")]
    ScenePointer(ScenePointerMessage),

    /// A message whose `type` this build does not know.
    #[serde(skip)]
    Unknown {
        /// The unrecognised `type` string.
        kind: String,
    },
}

/// Every `type` string the decoder maps onto a concrete [`Message`] variant.
pub const KNOWN_KINDS: &[&str] = &[
    "frame",
    "point_cloud",
    "mesh",
    "skinned_mesh",
    "camera_frustum",
    "image",
    "background_image",
    "gaussian_splats",
    "label",
    "remove_scene_node",
    "set_scene_node_visibility",
    "set_orientation",
    "set_position",
    "reset_scene",
    "GuiAddButtonMessage",
    "GuiAddCheckboxMessage",
    "GuiAddDropdownMessage",
    "GuiAddFolderMessage",
    "GuiAddTabGroupMessage",
    "GuiAddNumberMessage",
    "GuiAddRgbMessage",
    "GuiAddRgbaMessage",
    "GuiAddSliderMessage",
    "GuiAddButtonGroupMessage",
    "GuiAddTextMessage",
    "GuiAddVector2Message",
    "GuiAddVector3Message",
    "GuiAddMarkdownMessage",
    "GuiModalMessage",
    "GuiCloseModalMessage",
    "gui_set",
    "gui_update_config",
    "gui_set_visible",
    "gui_set_disabled",
    "remove_gui",
    "gui_update",
    "ThemeConfigurationMessage",
    "notification",
    "remove_notification",
    "set_camera_position",
    "set_camera_look_at",
    "set_camera_up_direction",
    "set_camera_fov",
    "scene_pointer_enable",
    "ViewerCameraMessage",
    "ScenePointerMessage",
];

impl Message {
    /// Wire `type` string of this message.
    pub fn kind(&self) -> &str {
        match self {
            Self::Frame(_) => "frame",
            Self::PointCloud(_) => "point_cloud",
            Self::Mesh(_) => "mesh",
            Self::SkinnedMesh(_) => "skinned_mesh",
            Self::CameraFrustum(_) => "camera_frustum",
            Self::Image(_) => "image",
            Self::BackgroundImage(_) => "background_image",
            Self::GaussianSplats(_) => "gaussian_splats",
            Self::Label(_) => "label",
            Self::RemoveSceneNode(_) => "remove_scene_node",
            Self::SetSceneNodeVisibility(_) => "set_scene_node_visibility",
            Self::SetOrientation(_) => "set_orientation",
            Self::SetPosition(_) => "set_position",
            Self::ResetScene => "reset_scene",
            Self::GuiAddButton(_) => "GuiAddButtonMessage",
            Self::GuiAddCheckbox(_) => "GuiAddCheckboxMessage",
            Self::GuiAddDropdown(_) => "GuiAddDropdownMessage",
            Self::GuiAddFolder(_) => "GuiAddFolderMessage",
            Self::GuiAddTabGroup(_) => "GuiAddTabGroupMessage",
            Self::GuiAddNumber(_) => "GuiAddNumberMessage",
            Self::GuiAddRgb(_) => "GuiAddRgbMessage",
            Self::GuiAddRgba(_) => "GuiAddRgbaMessage",
            Self::GuiAddSlider(_) => "GuiAddSliderMessage",
            Self::GuiAddButtonGroup(_) => "GuiAddButtonGroupMessage",
            Self::GuiAddText(_) => "GuiAddTextMessage",
            Self::GuiAddVector2(_) => "GuiAddVector2Message",
            Self::GuiAddVector3(_) => "GuiAddVector3Message",
            Self::GuiAddMarkdown(_) => "GuiAddMarkdownMessage",
            Self::GuiModal(_) => "GuiModalMessage",
            Self::GuiCloseModal(_) => "GuiCloseModalMessage",
            Self::GuiSet(_) => "gui_set",
            Self::GuiUpdateConfig(_) => "gui_update_config",
            Self::GuiSetVisible(_) => "gui_set_visible",
            Self::GuiSetDisabled(_) => "gui_set_disabled",
            Self::GuiRemove(_) => "remove_gui",
            Self::GuiUpdate(_) => "gui_update",
            Self::ThemeConfiguration(_) => "ThemeConfigurationMessage",
            Self::Notification(_) => "notification",
            Self::RemoveNotification(_) => "remove_notification",
            Self::SetCameraPosition(_) => "set_camera_position",
            Self::SetCameraLookAt(_) => "set_camera_look_at",
            Self::SetCameraUpDirection(_) => "set_camera_up_direction",
            Self::SetCameraFov(_) => "set_camera_fov",
            Self::ScenePointerEnable(_) => "scene_pointer_enable",
            Self::ViewerCamera(_) => "ViewerCameraMessage",
            Self::ScenePointer(_) => "ScenePointerMessage",
            Self::Unknown { kind } => kind,
        }
    }

    /// Returns true if `kind` names a variant this build can decode.
    pub fn is_known_kind(kind: &str) -> bool {
        KNOWN_KINDS.contains(&kind)
    }

    /// Splits a `GuiAdd*` message into the widget configuration record.
    ///
    /// Returns `None` for every other kind.
    pub fn into_gui_config(self) -> Option<GuiConfig> {
        let config = match self {
            Self::GuiAddButton(m) => m.into_config(GuiProps::Button),
            Self::GuiAddCheckbox(m) => m.into_config(GuiProps::Checkbox),
            Self::GuiAddDropdown(m) => m.into_config(GuiProps::Dropdown),
            Self::GuiAddFolder(m) => m.into_config(GuiProps::Folder),
            Self::GuiAddTabGroup(m) => m.into_config(GuiProps::TabGroup),
            Self::GuiAddNumber(m) => m.into_config(GuiProps::Number),
            Self::GuiAddRgb(m) => m.into_config(GuiProps::Rgb),
            Self::GuiAddRgba(m) => m.into_config(GuiProps::Rgba),
            Self::GuiAddSlider(m) => m.into_config(GuiProps::Slider),
            Self::GuiAddButtonGroup(m) => m.into_config(GuiProps::ButtonGroup),
            Self::GuiAddText(m) => m.into_config(GuiProps::Text),
            Self::GuiAddVector2(m) => m.into_config(GuiProps::Vector2),
            Self::GuiAddVector3(m) => m.into_config(GuiProps::Vector3),
            Self::GuiAddMarkdown(m) => m.into_config(GuiProps::Markdown),
            _ => return None,
        };
        Some(config)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_listed_for_concrete_variants() {
        let samples = [
            Message::ResetScene,
            Message::RemoveSceneNode(RemoveSceneNodeMessage { name: "/a".into() }),
            Message::GuiRemove(GuiRemoveMessage { id: "w".into() }),
            Message::SetCameraFov(SetCameraFovMessage { fov: 1.0 }),
            Message::ScenePointerEnable(ScenePointerEnableMessage { enable: true }),
        ];
        for msg in samples {
            assert!(Message::is_known_kind(msg.kind()), "{}", msg.kind());
        }
    }

    #[test]
    fn unknown_reports_its_own_kind() {
        let msg = Message::Unknown { kind: "holo_projector".into() };
        assert_eq!(msg.kind(), "holo_projector");
        assert!(!Message::is_known_kind("holo_projector"));
    }

    #[test]
    fn known_kinds_are_unique() {
        let mut kinds: Vec<&str> = KNOWN_KINDS.to_vec();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), KNOWN_KINDS.len());
    }

    #[test]
    fn gui_add_splits_into_config() {
        let msg = Message::GuiAddCheckbox(GuiAdd {
            order: 1.0,
            id: "cb".into(),
            label: "Enabled".into(),
            container_id: "root".into(),
            hint: None,
            props: CheckboxProps { initial_value: true },
        });
        let config = msg.into_gui_config().expect("gui add");
        assert_eq!(config.id, "cb");
        assert_eq!(config.container_id, "root");
        assert!(matches!(config.props, GuiProps::Checkbox(CheckboxProps { initial_value: true })));
        assert!(Message::ResetScene.into_gui_config().is_none());
    }
}
