// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Application configuration (panel window, key controls, session timing).

use serde::{Deserialize, Serialize};

/// Panel window placement and behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    /// Distance from the top edge of the screen.
    pub top_offset: u32,
    /// Keep the panel above other windows.
    pub keep_above: bool,
    /// Hide the panel when it loses keyboard focus.
    pub hide_on_focus_loss: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 640,
            top_offset: 20,
            keep_above: true,
            hide_on_focus_loss: true,
        }
    }
}

/// Keyboard control settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Slider step for `h`/`l`, as a fraction of 100%.
    pub slider_step: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self { slider_step: 0.1 }
    }
}

/// Audio-server session timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sleep between mainloop passes.
    pub poll_interval_ms: u64,
    /// Upper bound for the initial listing and for draining pending
    /// operations in one-shot command runs.
    pub sync_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5,
            sync_timeout_ms: 3000,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load config from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
