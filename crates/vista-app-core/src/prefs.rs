// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted client preferences (endpoint, reconnect timing, throttles).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Config key the preferences are stored under.
pub const PREFS_KEY: &str = "client";

/// Saved preferences for a viewer client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientPrefs {
    /// TCP address of the scene server.
    pub server: String,
    /// Unix socket to use instead of `server`.
    pub unix_socket: Option<PathBuf>,
    /// Delay before the first connection attempt.
    pub initial_delay_ms: u64,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay_ms: u64,
    /// Minimum interval between camera updates.
    pub camera_throttle_ms: u64,
    /// Minimum interval between pointer events.
    pub pointer_throttle_ms: u64,
    /// Delay before the first camera update on a fresh connection.
    pub camera_on_connect_ms: u64,
    /// Largest accepted frame payload.
    pub max_frame_bytes: usize,
}

impl Default for ClientPrefs {
    fn default() -> Self {
        Self {
            server: vista_proto::DEFAULT_SERVER.to_string(),
            unix_socket: None,
            initial_delay_ms: 500,
            reconnect_delay_ms: 1000,
            camera_throttle_ms: 20,
            pointer_throttle_ms: 20,
            camera_on_connect_ms: 50,
            max_frame_bytes: vista_proto::wire::DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl ClientPrefs {
    /// [`Self::initial_delay_ms`] as a duration.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// [`Self::reconnect_delay_ms`] as a duration.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// [`Self::camera_throttle_ms`] as a duration.
    pub fn camera_throttle(&self) -> Duration {
        Duration::from_millis(self.camera_throttle_ms)
    }

    /// [`Self::pointer_throttle_ms`] as a duration.
    pub fn pointer_throttle(&self) -> Duration {
        Duration::from_millis(self.pointer_throttle_ms)
    }

    /// [`Self::camera_on_connect_ms`] as a duration.
    pub fn camera_on_connect(&self) -> Duration {
        Duration::from_millis(self.camera_on_connect_ms)
    }
}
