// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GUI panel state for the Vista viewer.
//!
//! [`GuiStore`] mirrors the widget set a server has registered: configs by
//! id, a container-membership index, values, per-widget visibility/disabled
//! flags, the modal stack, the panel theme and the connection indicator.
//! Only the message dispatcher mutates it; panels read it.

mod store;

pub use store::{ConnectionStatus, GuiAttributes, GuiStore, ROOT_CONTAINER};
