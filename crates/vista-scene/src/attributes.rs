// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-path pose and visibility, kept apart from the tree.

use std::collections::HashMap;

use vista_geom::{quat_from_wxyz, Quat, RenderPose, Vec3};

/// Pose and visibility overrides for one path. Unset fields fall back to
/// defaults (identity pose, visible).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeAttributes {
    /// Parent-relative orientation, scalar-last.
    pub orientation: Option<Quat>,
    /// Parent-relative position.
    pub position: Option<Vec3>,
    /// Visibility set by the server.
    pub visibility: Option<bool>,
    /// Visibility set locally, e.g. from a scene browser toggle.
    pub override_visibility: Option<bool>,
}

impl NodeAttributes {
    /// Local override first, then server visibility, then visible.
    pub fn effective_visibility(&self) -> bool {
        self.override_visibility.or(self.visibility).unwrap_or(true)
    }

    /// Parent-relative pose.
    pub fn local_pose(&self) -> RenderPose {
        RenderPose {
            rotation: self.orientation.unwrap_or(Quat::IDENTITY),
            translation: self.position.unwrap_or(Vec3::ZERO),
        }
    }
}

/// Attribute table keyed by node path.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    by_path: HashMap<String, NodeAttributes>,
}

impl AttributeStore {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes for `path`, if any were set.
    pub fn get(&self, path: &str) -> Option<&NodeAttributes> {
        self.by_path.get(path)
    }

    /// Number of paths with attributes.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// Returns true if no attributes are set.
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    fn entry(&mut self, path: &str) -> &mut NodeAttributes {
        self.by_path.entry(path.to_string()).or_default()
    }

    /// Sets the orientation from a wire-layout (`wxyz`) quaternion.
    pub fn set_orientation_wxyz(&mut self, path: &str, wxyz: [f32; 4]) {
        self.entry(path).orientation = Some(quat_from_wxyz(wxyz).normalize());
    }

    /// Sets the position.
    pub fn set_position(&mut self, path: &str, position: [f32; 3]) {
        self.entry(path).position = Some(Vec3::from_array(position));
    }

    /// Sets the server visibility.
    pub fn set_visibility(&mut self, path: &str, visible: bool) {
        self.entry(path).visibility = Some(visible);
    }

    /// Sets or clears the local override.
    pub fn set_override_visibility(&mut self, path: &str, visible: Option<bool>) {
        self.entry(path).override_visibility = visible;
    }

    /// Clears every local override.
    pub fn clear_visibility_overrides(&mut self) {
        for attrs in self.by_path.values_mut() {
            attrs.override_visibility = None;
        }
    }

    /// Effective visibility of `path` alone (ancestors not considered).
    pub fn effective_visibility(&self, path: &str) -> bool {
        self.get(path).map_or(true, NodeAttributes::effective_visibility)
    }

    /// Parent-relative pose of `path`.
    pub fn local_pose(&self, path: &str) -> RenderPose {
        self.get(path)
            .map_or_else(RenderPose::default, NodeAttributes::local_pose)
    }

    /// Drops attributes for every listed path.
    pub fn remove_paths<S: AsRef<str>>(&mut self, paths: &[S]) {
        for p in paths {
            self.by_path.remove(p.as_ref());
        }
    }

    /// Drops every attribute.
    pub fn clear(&mut self) {
        self.by_path.clear();
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_server_visibility() {
        let mut attrs = AttributeStore::new();
        attrs.set_visibility("/a", false);
        assert!(!attrs.effective_visibility("/a"));
        attrs.set_override_visibility("/a", Some(true));
        assert!(attrs.effective_visibility("/a"));
        attrs.set_visibility("/a", false);
        assert!(attrs.effective_visibility("/a"));
        attrs.clear_visibility_overrides();
        assert!(!attrs.effective_visibility("/a"));
    }

    #[test]
    fn unset_defaults_to_visible_identity() {
        let attrs = AttributeStore::new();
        assert!(attrs.effective_visibility("/nothing"));
        assert_eq!(attrs.local_pose("/nothing"), RenderPose::default());
    }

    #[test]
    fn orientation_is_stored_scalar_last() {
        let mut attrs = AttributeStore::new();
        attrs.set_orientation_wxyz("/a", [0.0, 0.0, 0.0, 1.0]);
        let q = attrs.get("/a").and_then(|a| a.orientation).expect("set");
        assert_eq!(q, Quat::from_xyzw(0.0, 0.0, 1.0, 0.0));
    }

    #[test]
    fn remove_paths_drops_entries() {
        let mut attrs = AttributeStore::new();
        attrs.set_position("/a", [1.0, 2.0, 3.0]);
        attrs.set_position("/b", [0.0; 3]);
        attrs.remove_paths(&["/a".to_string()]);
        assert!(attrs.get("/a").is_none());
        assert_eq!(attrs.len(), 1);
    }
}
