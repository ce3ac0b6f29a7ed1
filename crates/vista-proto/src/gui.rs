// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GUI panel message payloads.
//!
//! Every `GuiAdd*Message` shares the [`GuiAdd`] envelope (id, container,
//! order, label, hint) and flattens a kind-specific property struct into the
//! same map. Widget values travel as raw CBOR values so the protocol stays
//! open to new widget kinds.

use ciborium::Value;
use serde::{Deserialize, Serialize};

/// Common widget fields plus the kind-specific properties `P`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiAdd<P> {
    /// Sort key within the container.
    pub order: f64,
    /// Unique widget id.
    pub id: String,
    /// Display label.
    #[serde(default)]
    pub label: String,
    /// Id of the folder, tab or modal holding this widget.
    pub container_id: String,
    /// Tooltip text.
    #[serde(default)]
    pub hint: Option<String>,
    /// Kind-specific properties.
    #[serde(flatten)]
    pub props: P,
}

impl<P> GuiAdd<P> {
    pub(crate) fn into_config(self, wrap: impl FnOnce(P) -> GuiProps) -> GuiConfig {
        GuiConfig {
            id: self.id,
            container_id: self.container_id,
            order: self.order,
            label: self.label,
            hint: self.hint,
            props: wrap(self.props),
        }
    }
}

/// Stored configuration of one widget: the envelope of its add message plus
/// its kind-specific properties.
#[derive(Debug, Clone, PartialEq)]
pub struct GuiConfig {
    /// Unique widget id.
    pub id: String,
    /// Owning container id.
    pub container_id: String,
    /// Sort key within the container.
    pub order: f64,
    /// Display label.
    pub label: String,
    /// Tooltip text.
    pub hint: Option<String>,
    /// Kind-specific properties.
    pub props: GuiProps,
}

impl GuiConfig {
    /// Value a widget starts with before any `gui_set` or user edit.
    ///
    /// Returns `None` for kinds that carry no value (folders, tabs, markdown,
    /// buttons).
    pub fn initial_value(&self) -> Option<Value> {
        let floats = |xs: &[f64]| Value::Array(xs.iter().map(|x| Value::Float(*x)).collect());
        let bytes3 = |xs: &[u8]| Value::Array(xs.iter().map(|x| Value::Integer((*x).into())).collect());
        match &self.props {
            GuiProps::Checkbox(p) => Some(Value::Bool(p.initial_value)),
            GuiProps::Dropdown(p) => p.initial_value.clone().map(Value::Text),
            GuiProps::Number(p) => Some(Value::Float(p.initial_value)),
            GuiProps::Slider(p) => Some(Value::Float(p.initial_value)),
            GuiProps::Text(p) => Some(Value::Text(p.initial_value.clone())),
            GuiProps::Rgb(p) => Some(bytes3(&p.initial_value)),
            GuiProps::Rgba(p) => Some(bytes3(&p.initial_value)),
            GuiProps::Vector2(p) => Some(floats(&p.initial_value)),
            GuiProps::Vector3(p) => Some(floats(&p.initial_value)),
            GuiProps::Button(_)
            | GuiProps::ButtonGroup(_)
            | GuiProps::Folder(_)
            | GuiProps::TabGroup(_)
            | GuiProps::Markdown(_) => None,
        }
    }

    /// Returns true for kinds that hold other widgets.
    pub fn is_container(&self) -> bool {
        matches!(self.props, GuiProps::Folder(_) | GuiProps::TabGroup(_))
    }
}

/// Kind-specific widget properties, tagged by `kind` when sent on their own
/// (e.g. in `gui_update_config`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum GuiProps {
    Button(ButtonProps),
    Checkbox(CheckboxProps),
    Dropdown(DropdownProps),
    Folder(FolderProps),
    TabGroup(TabGroupProps),
    Number(NumberProps),
    Rgb(RgbProps),
    Rgba(RgbaProps),
    Slider(SliderProps),
    ButtonGroup(ButtonGroupProps),
    Text(TextProps),
    Vector2(Vector2Props),
    Vector3(Vector3Props),
    Markdown(MarkdownProps),
}

/// Button properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonProps {
    /// Named color.
    #[serde(default)]
    pub color: Option<String>,
    /// Inline SVG icon.
    #[serde(default)]
    pub icon_html: Option<String>,
}

/// Checkbox properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxProps {
    /// Starting state.
    pub initial_value: bool,
}

/// Dropdown properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownProps {
    /// Selectable options.
    pub options: Vec<String>,
    /// Starting selection.
    #[serde(default)]
    pub initial_value: Option<String>,
}

/// Folder properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderProps {
    /// Whether the folder starts expanded.
    #[serde(default = "expand_default")]
    pub expand_by_default: bool,
}

fn expand_default() -> bool {
    true
}

/// Tab group properties. Each tab is itself a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabGroupProps {
    /// Tab titles.
    pub tab_labels: Vec<String>,
    /// Optional inline SVG icon per tab.
    #[serde(default)]
    pub tab_icons_html: Vec<Option<String>>,
    /// Container id per tab.
    pub tab_container_ids: Vec<String>,
}

/// Numeric input properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct NumberProps {
    pub initial_value: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub step: f64,
    /// Displayed decimal places.
    pub precision: u32,
}

/// RGB color picker properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbProps {
    /// Starting color.
    pub initial_value: [u8; 3],
}

/// RGBA color picker properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbaProps {
    /// Starting color.
    pub initial_value: [u8; 4],
}

/// Slider properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SliderProps {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial_value: f64,
    /// Displayed decimal places.
    pub precision: u32,
    /// Tick marks as `(value, label)` pairs.
    #[serde(default)]
    pub marks: Option<Vec<(f64, Option<String>)>>,
}

/// Button group properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonGroupProps {
    /// Button labels; the clicked label is sent as the value.
    pub options: Vec<String>,
}

/// Text input properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProps {
    /// Starting text.
    pub initial_value: String,
}

/// 2-vector input properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Vector2Props {
    pub initial_value: [f64; 2],
    #[serde(default)]
    pub min: Option<[f64; 2]>,
    #[serde(default)]
    pub max: Option<[f64; 2]>,
    pub step: f64,
    pub precision: u32,
}

/// 3-vector input properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Vector3Props {
    pub initial_value: [f64; 3],
    #[serde(default)]
    pub min: Option<[f64; 3]>,
    #[serde(default)]
    pub max: Option<[f64; 3]>,
    pub step: f64,
    pub precision: u32,
}

/// Markdown block properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownProps {
    /// Markdown source.
    pub markdown: String,
}

/// Opens a modal; its id doubles as a container id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiModalMessage {
    /// Stacking order.
    pub order: f64,
    /// Modal id.
    pub id: String,
    /// Title bar text.
    pub title: String,
}

/// Closes a modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiCloseModalMessage {
    /// Modal id.
    pub id: String,
}

/// Server-driven value change for one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiSetValueMessage {
    /// Widget id.
    pub id: String,
    /// New value.
    pub value: Value,
}

/// Replaces the kind-specific configuration of an existing widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiUpdateConfigMessage {
    /// Widget id.
    pub id: String,
    /// New properties; container and order are kept.
    pub config: GuiProps,
}

/// Shows or hides a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiSetVisibleMessage {
    /// Widget id.
    pub id: String,
    /// New visibility.
    pub visible: bool,
}

/// Enables or disables a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiSetDisabledMessage {
    /// Widget id.
    pub id: String,
    /// New disabled flag.
    pub disabled: bool,
}

/// Removes a widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuiRemoveMessage {
    /// Widget id.
    pub id: String,
}

/// Client-driven value change, sent when the user edits a widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiUpdateMessage {
    /// Widget id.
    pub id: String,
    /// New value.
    pub value: Value,
}

/// Panel layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ControlLayout {
    #[default]
    Floating,
    Collapsible,
    Fixed,
}

/// Panel width preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ControlWidth {
    Small,
    #[default]
    Medium,
    Large,
}

/// Theme and layout for the control panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeConfigurationMessage {
    /// Opaque titlebar description rendered by the panel.
    #[serde(default)]
    pub titlebar_content: Option<Value>,
    /// Panel layout.
    #[serde(default)]
    pub control_layout: ControlLayout,
    /// Panel width preset.
    #[serde(default)]
    pub control_width: ControlWidth,
    /// Dark color scheme.
    #[serde(default)]
    pub dark_mode: bool,
    /// Show the logo in the panel corner.
    #[serde(default)]
    pub show_logo: bool,
    /// Ten-shade primary palette as CSS colors.
    #[serde(default)]
    pub colors: Option<Vec<String>>,
}

impl Default for ThemeConfigurationMessage {
    fn default() -> Self {
        Self {
            titlebar_content: None,
            control_layout: ControlLayout::Floating,
            control_width: ControlWidth::Medium,
            dark_mode: false,
            show_logo: true,
            colors: None,
        }
    }
}

/// Shows or updates a notification toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Notification id; reusing an id updates the toast in place.
    pub id: String,
    /// Title line.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// Show a spinner instead of an icon.
    #[serde(default)]
    pub loading: bool,
    /// Show a close button.
    #[serde(default = "close_default")]
    pub with_close_button: bool,
    /// Auto-close delay in milliseconds; `None` keeps the toast open.
    #[serde(default)]
    pub auto_close: Option<u64>,
}

fn close_default() -> bool {
    true
}

/// Dismisses a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveNotificationMessage {
    /// Notification id.
    pub id: String,
}
