// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Audio-server type definitions for playback streams and operations.

use crate::audio::volume::StreamVolume;

/// Server-assigned identifier of a playback stream (a PulseAudio sink input).
pub type StreamIndex = u32;

/// Label used when the server supplies no application name.
pub const UNTITLED_LABEL: &str = "<untitled>";

/// Icon used when the server supplies no application icon.
pub const DEFAULT_ICON: &str = "application-multimedia";

/// Handle for an in-flight volume-set request.
///
/// Handles are minted by the session and never reused within a run, so a
/// completion can always be matched against the one currently pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub u64);

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Attributes of a playback stream as reported by the audio server.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamAttributes {
    pub index: StreamIndex,
    /// Application name, if the client set one.
    pub label: Option<String>,
    /// Symbolic icon name, if the client set one.
    pub icon_hint: Option<String>,
    pub volume: StreamVolume,
}

impl StreamAttributes {
    pub fn new(index: StreamIndex, volume: StreamVolume) -> Self {
        Self {
            index,
            label: None,
            icon_hint: None,
            volume,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon_hint = Some(icon.into());
        self
    }

    /// Label to display, falling back to [`UNTITLED_LABEL`].
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => UNTITLED_LABEL,
        }
    }

    /// Icon to display, falling back to [`DEFAULT_ICON`].
    pub fn display_icon(&self) -> &str {
        match self.icon_hint.as_deref() {
            Some(icon) if !icon.is_empty() => icon,
            _ => DEFAULT_ICON,
        }
    }
}

/// Connection state of the audio-server session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connecting,
    Authorizing,
    SettingName,
    Ready,
    Failed,
    Terminated,
}

impl SessionState {
    /// True for states after which the session never recovers.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Terminated)
    }
}
