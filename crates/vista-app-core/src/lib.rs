// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Vista clients (config, prefs,
//! notifications). Keeps transports and renderers free of persistence and
//! panel bookkeeping.

pub mod config;
pub mod notifications;
pub mod prefs;
