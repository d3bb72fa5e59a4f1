// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Local state of one tracked playback stream.

use crate::audio::types::{OperationId, StreamAttributes, StreamIndex};
use crate::audio::volume::StreamVolume;

/// A playback stream as tracked by the registry.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub index: StreamIndex,
    pub label: String,
    pub icon_hint: String,
    pub volume: StreamVolume,
    /// Set while a server-confirmed volume is being written into the entry.
    /// UI input seen during that window is an echo, not a user edit.
    pub echo_suppressed: bool,
    /// The one volume request in flight for this stream, if any.
    pub pending_operation: Option<OperationId>,
    /// Volume captured when the stream was muted, restored on unmute.
    pub unmute_volume: Option<StreamVolume>,
}

impl StreamEntry {
    pub fn new(attrs: &StreamAttributes) -> Self {
        Self {
            index: attrs.index,
            label: attrs.display_label().to_string(),
            icon_hint: attrs.display_icon().to_string(),
            volume: attrs.volume.clone(),
            echo_suppressed: false,
            pending_operation: None,
            unmute_volume: None,
        }
    }

    /// Representative volume in `[0, 1]` (may exceed 1 for boosted streams).
    pub fn representative_volume(&self) -> f64 {
        self.volume.fraction()
    }

    /// Muted is derived: true iff the loudest channel is silent.
    pub fn is_muted(&self) -> bool {
        self.volume.is_muted()
    }

    pub fn volume_percent(&self) -> u32 {
        self.volume.percent()
    }
}
