// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GUI state keyed by widget id, plus the modal stack.

use std::collections::{BTreeSet, HashMap};

use ciborium::Value;
use tracing::{debug, trace};
use vista_proto::{GuiConfig, GuiModalMessage, GuiProps, ThemeConfigurationMessage};

/// Container id of the top-level panel.
pub const ROOT_CONTAINER: &str = "root";

/// Per-widget flags set independently of the widget config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuiAttributes {
    /// Widget shown.
    pub visible: bool,
    /// Widget greyed out.
    pub disabled: bool,
}

impl Default for GuiAttributes {
    fn default() -> Self {
        Self {
            visible: true,
            disabled: false,
        }
    }
}

/// Transport state shown in the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Server address being used.
    pub server: String,
    /// Transport currently open.
    pub connected: bool,
    /// A background image is set.
    pub background_available: bool,
}

/// Registered widgets and panel state.
///
/// Every id in the config map appears in exactly one container set, the one
/// named by its config's `container_id`; removed ids appear in neither.
#[derive(Debug, Clone, Default)]
pub struct GuiStore {
    id_set_from_container_id: HashMap<String, BTreeSet<String>>,
    config_from_id: HashMap<String, GuiConfig>,
    value_from_id: HashMap<String, Value>,
    attribute_from_id: HashMap<String, GuiAttributes>,
    modals: Vec<GuiModalMessage>,
    theme: ThemeConfigurationMessage,
    status: ConnectionStatus,
}

impl GuiStore {
    /// Empty store with the default theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a widget.
    ///
    /// Re-adding an id under a different container moves it. A stored value
    /// from an earlier registration is dropped so the new initial value shows.
    pub fn add_gui(&mut self, config: GuiConfig) {
        let id = config.id.clone();
        if let Some(old) = self.config_from_id.get(&id) {
            if old.container_id != config.container_id {
                let old_container = old.container_id.clone();
                self.unlink(&old_container, &id);
            }
        }
        trace!(id = %id, container = %config.container_id, "registering gui widget");
        self.id_set_from_container_id
            .entry(config.container_id.clone())
            .or_default()
            .insert(id.clone());
        self.value_from_id.remove(&id);
        self.config_from_id.insert(id, config);
    }

    fn unlink(&mut self, container: &str, id: &str) {
        if let Some(set) = self.id_set_from_container_id.get_mut(container) {
            set.remove(id);
            if set.is_empty() {
                self.id_set_from_container_id.remove(container);
            }
        }
    }

    /// Deregisters a widget. Unknown ids are a no-op.
    pub fn remove_gui(&mut self, id: &str) {
        let Some(config) = self.config_from_id.remove(id) else {
            debug!(id, "remove for unknown gui widget");
            return;
        };
        self.unlink(&config.container_id, id);
        self.value_from_id.remove(id);
        self.attribute_from_id.remove(id);
    }

    /// Replaces the kind-specific properties of an existing widget.
    ///
    /// Container, order, label and hint are kept. Returns false, changing
    /// nothing, if the id is not registered.
    pub fn update_gui_config(&mut self, id: &str, props: GuiProps) -> bool {
        match self.config_from_id.get_mut(id) {
            Some(config) => {
                config.props = props;
                true
            }
            None => {
                debug!(id, "config update for unknown gui widget");
                false
            }
        }
    }

    /// Sets a widget value.
    pub fn set_gui_value(&mut self, id: &str, value: Value) {
        self.value_from_id.insert(id.to_string(), value);
    }

    /// Current value: the last one set, else the config's initial value.
    pub fn gui_value(&self, id: &str) -> Option<Value> {
        self.value_from_id
            .get(id)
            .cloned()
            .or_else(|| self.config_from_id.get(id).and_then(GuiConfig::initial_value))
    }

    /// Shows or hides a widget.
    pub fn set_gui_visible(&mut self, id: &str, visible: bool) {
        self.attribute_from_id.entry(id.to_string()).or_default().visible = visible;
    }

    /// Enables or disables a widget.
    pub fn set_gui_disabled(&mut self, id: &str, disabled: bool) {
        self.attribute_from_id.entry(id.to_string()).or_default().disabled = disabled;
    }

    /// Flags for a widget (defaults if never set).
    pub fn gui_attributes(&self, id: &str) -> GuiAttributes {
        self.attribute_from_id.get(id).copied().unwrap_or_default()
    }

    /// Pushes a modal; re-adding an id replaces it in place.
    pub fn add_modal(&mut self, modal: GuiModalMessage) {
        match self.modals.iter_mut().find(|m| m.id == modal.id) {
            Some(existing) => *existing = modal,
            None => self.modals.push(modal),
        }
    }

    /// Removes a modal by id.
    pub fn remove_modal(&mut self, id: &str) {
        self.modals.retain(|m| m.id != id);
    }

    /// Open modals, oldest first.
    pub fn modals(&self) -> &[GuiModalMessage] {
        &self.modals
    }

    /// Clears every widget, value, flag, container and modal. Theme and
    /// connection status are kept.
    pub fn reset_gui(&mut self) {
        self.id_set_from_container_id.clear();
        self.config_from_id.clear();
        self.value_from_id.clear();
        self.attribute_from_id.clear();
        self.modals.clear();
    }

    /// Config for `id`.
    pub fn config(&self, id: &str) -> Option<&GuiConfig> {
        self.config_from_id.get(id)
    }

    /// Number of registered widgets.
    pub fn widget_count(&self) -> usize {
        self.config_from_id.len()
    }

    /// Returns true if any widget is registered.
    pub fn has_widgets(&self) -> bool {
        !self.config_from_id.is_empty()
    }

    /// Ids held by `container_id`.
    pub fn container_ids(&self, container_id: &str) -> Option<&BTreeSet<String>> {
        self.id_set_from_container_id.get(container_id)
    }

    /// Widgets of a container sorted by `order`, ties broken by id.
    pub fn container_children(&self, container_id: &str) -> Vec<&GuiConfig> {
        let mut out: Vec<&GuiConfig> = self
            .container_ids(container_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.config_from_id.get(id))
            .collect();
        out.sort_by(|a, b| a.order.total_cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        out
    }

    /// Containers that currently hold at least one widget.
    pub fn container_count(&self) -> usize {
        self.id_set_from_container_id.len()
    }

    /// Checks the membership invariant; used by tests and debug logging.
    pub fn is_consistent(&self) -> bool {
        let memberships: usize = self.id_set_from_container_id.values().map(BTreeSet::len).sum();
        memberships == self.config_from_id.len()
            && self.config_from_id.values().all(|c| {
                self.id_set_from_container_id
                    .get(&c.container_id)
                    .is_some_and(|set| set.contains(&c.id))
            })
    }

    /// Current theme.
    pub fn theme(&self) -> &ThemeConfigurationMessage {
        &self.theme
    }

    /// Replaces the theme.
    pub fn set_theme(&mut self, theme: ThemeConfigurationMessage) {
        self.theme = theme;
    }

    /// Connection indicator.
    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Sets the server address shown in the panel.
    pub fn set_server(&mut self, server: impl Into<String>) {
        self.status.server = server.into();
    }

    /// Flips the connection indicator.
    pub fn set_connected(&mut self, connected: bool) {
        self.status.connected = connected;
    }

    /// Flips the background indicator.
    pub fn set_background_available(&mut self, available: bool) {
        self.status.background_available = available;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vista_proto::{CheckboxProps, FolderProps, MarkdownProps, TextProps};

    fn make_checkbox(id: &str, container: &str, order: f64) -> GuiConfig {
        GuiConfig {
            id: id.into(),
            container_id: container.into(),
            order,
            label: id.into(),
            hint: None,
            props: GuiProps::Checkbox(CheckboxProps { initial_value: true }),
        }
    }

    fn make_modal(id: &str) -> GuiModalMessage {
        GuiModalMessage {
            order: 0.0,
            id: id.into(),
            title: id.into(),
        }
    }

    #[test]
    fn add_indexes_by_container() {
        let mut gui = GuiStore::new();
        gui.add_gui(make_checkbox("a", ROOT_CONTAINER, 2.0));
        gui.add_gui(make_checkbox("b", ROOT_CONTAINER, 1.0));
        let order: Vec<&str> = gui
            .container_children(ROOT_CONTAINER)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(order, ["b", "a"]);
        assert!(gui.is_consistent());
    }

    #[test]
    fn readd_moves_between_containers() {
        let mut gui = GuiStore::new();
        gui.add_gui(make_checkbox("a", ROOT_CONTAINER, 0.0));
        gui.add_gui(make_checkbox("a", "folder", 0.0));
        assert!(gui.container_ids(ROOT_CONTAINER).is_none());
        assert!(gui.container_ids("folder").is_some_and(|s| s.contains("a")));
        assert!(gui.is_consistent());
    }

    #[test]
    fn remove_clears_every_map() {
        let mut gui = GuiStore::new();
        gui.add_gui(make_checkbox("a", ROOT_CONTAINER, 0.0));
        gui.set_gui_value("a", Value::Bool(false));
        gui.set_gui_disabled("a", true);
        gui.remove_gui("a");
        assert!(gui.config("a").is_none());
        assert!(gui.gui_value("a").is_none());
        assert_eq!(gui.gui_attributes("a"), GuiAttributes::default());
        assert_eq!(gui.container_count(), 0);
        gui.remove_gui("a");
        assert!(gui.is_consistent());
    }

    #[test]
    fn value_falls_back_to_initial() {
        let mut gui = GuiStore::new();
        gui.add_gui(make_checkbox("a", ROOT_CONTAINER, 0.0));
        assert_eq!(gui.gui_value("a"), Some(Value::Bool(true)));
        gui.set_gui_value("a", Value::Bool(false));
        assert_eq!(gui.gui_value("a"), Some(Value::Bool(false)));
    }

    #[test]
    fn config_update_only_applies_to_known_ids() {
        let mut gui = GuiStore::new();
        let props = GuiProps::Text(TextProps {
            initial_value: "x".into(),
        });
        assert!(!gui.update_gui_config("ghost", props.clone()));
        assert_eq!(gui.widget_count(), 0);

        gui.add_gui(make_checkbox("a", "folder", 3.0));
        assert!(gui.update_gui_config("a", props.clone()));
        let config = gui.config("a").expect("a");
        assert_eq!(config.props, props);
        assert_eq!(config.container_id, "folder");
        assert!((config.order - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn visibility_is_independent_of_config() {
        let mut gui = GuiStore::new();
        gui.add_gui(make_checkbox("a", ROOT_CONTAINER, 0.0));
        gui.set_gui_visible("a", false);
        gui.update_gui_config(
            "a",
            GuiProps::Markdown(MarkdownProps {
                markdown: "# hi".into(),
            }),
        );
        assert!(!gui.gui_attributes("a").visible);
    }

    #[test]
    fn modals_stack_and_close_by_id() {
        let mut gui = GuiStore::new();
        gui.add_modal(make_modal("m1"));
        gui.add_modal(make_modal("m2"));
        gui.remove_modal("m1");
        let ids: Vec<&str> = gui.modals().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m2"]);
    }

    #[test]
    fn re_adding_a_modal_replaces_it_in_place() {
        let mut gui = GuiStore::new();
        gui.add_modal(make_modal("m1"));
        gui.add_modal(make_modal("m2"));
        gui.add_modal(GuiModalMessage {
            title: "renamed".into(),
            ..make_modal("m1")
        });
        let titles: Vec<&str> = gui.modals().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["renamed", "m2"]);
        gui.remove_modal("m1");
        assert_eq!(gui.modals().len(), 1);
    }

    #[test]
    fn reset_empties_gui_but_keeps_status() {
        let mut gui = GuiStore::new();
        gui.set_connected(true);
        gui.add_gui(GuiConfig {
            id: "f".into(),
            container_id: ROOT_CONTAINER.into(),
            order: 0.0,
            label: "Folder".into(),
            hint: None,
            props: GuiProps::Folder(FolderProps {
                expand_by_default: true,
            }),
        });
        gui.add_gui(make_checkbox("a", "f", 0.0));
        gui.set_gui_value("a", Value::Bool(false));
        gui.add_modal(make_modal("m"));
        gui.reset_gui();
        assert!(!gui.has_widgets());
        assert_eq!(gui.container_count(), 0);
        assert!(gui.modals().is_empty());
        assert!(gui.gui_value("a").is_none());
        assert!(gui.status().connected);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, u8),
        Remove(u8),
        Reset,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (0u8..6, 0u8..3).prop_map(|(id, c)| Op::Add(id, c)),
            3 => (0u8..6).prop_map(Op::Remove),
            1 => Just(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn membership_stays_consistent(ops in prop::collection::vec(op_strategy(), 0..50)) {
            let mut gui = GuiStore::new();
            for op in ops {
                match op {
                    Op::Add(id, c) => gui.add_gui(make_checkbox(&format!("w{id}"), &format!("c{c}"), f64::from(id))),
                    Op::Remove(id) => {
                        let id = format!("w{id}");
                        gui.remove_gui(&id);
                        for c in 0..3 {
                            let container = format!("c{c}");
                            prop_assert!(!gui.container_ids(&container).is_some_and(|s| s.contains(&id)));
                        }
                    }
                    Op::Reset => gui.reset_gui(),
                }
                prop_assert!(gui.is_consistent());
            }
        }
    }
}
