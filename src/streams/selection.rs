// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Active stream selection and keyboard navigation.
//!
//! The selection stores an index, never a reference, and is re-validated
//! against the registry before every use. Each change is reported to the
//! display as a highlight transition.

use crate::audio::types::StreamIndex;
use crate::streams::display::DisplaySink;
use crate::streams::registry::StreamRegistry;
use tracing::debug;

/// Navigation direction in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Default)]
pub struct ActiveSelection {
    active: Option<StreamIndex>,
}

impl ActiveSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active index, if it still names a registry entry.
    pub fn active(&self, registry: &StreamRegistry) -> Option<StreamIndex> {
        self.active.filter(|index| registry.contains(*index))
    }

    /// Make sure the selection names a live entry.
    ///
    /// Keeps a valid selection. Otherwise picks the first entry in registry
    /// order, or clears the selection when the registry is empty.
    pub fn ensure_selection(
        &mut self,
        registry: &StreamRegistry,
        display: &mut dyn DisplaySink,
    ) -> Option<StreamIndex> {
        if let Some(active) = self.active(registry) {
            return Some(active);
        }

        let replacement = registry.first().map(|e| e.index);
        self.select(replacement, display);
        replacement
    }

    /// Move one step in `direction`. There is no wraparound: at either end
    /// the selection stays where it is.
    pub fn move_relative(
        &mut self,
        registry: &StreamRegistry,
        direction: Direction,
        display: &mut dyn DisplaySink,
    ) -> Option<StreamIndex> {
        let Some(active) = self.ensure_selection(registry, display) else {
            return None;
        };
        let Some(position) = registry.position(active) else {
            return Some(active);
        };

        let target = match direction {
            Direction::Previous => position.checked_sub(1),
            Direction::Next => Some(position + 1),
        };

        match target.and_then(|p| registry.at(p)) {
            Some(entry) => {
                let index = entry.index;
                self.select(Some(index), display);
                Some(index)
            }
            None => Some(active),
        }
    }

    /// True if the selection currently names `index`, live or not.
    pub fn names(&self, index: StreamIndex) -> bool {
        self.active == Some(index)
    }

    /// The stored index without checking it against a registry.
    #[cfg(test)]
    pub(crate) fn stored(&self) -> Option<StreamIndex> {
        self.active
    }

    fn select(&mut self, new: Option<StreamIndex>, display: &mut dyn DisplaySink) {
        let old = self.active;
        if old == new {
            return;
        }
        debug!("Active stream {:?} -> {:?}", old, new);
        self.active = new;
        display.highlight_changed(new, old);
    }
}
