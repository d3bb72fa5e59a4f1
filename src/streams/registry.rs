// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Ordered collection of tracked streams.
//!
//! Entries keep the order in which they were discovered. That order is the
//! row order on screen and the navigation order for the active selection.

use crate::audio::types::{StreamAttributes, StreamIndex};
use crate::streams::display::DisplaySink;
use crate::streams::entry::StreamEntry;
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct StreamRegistry {
    entries: Vec<StreamEntry>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or refresh the entry for `attrs.index`.
    ///
    /// New entries are appended. Known entries get their label, icon and
    /// volume replaced in place; the volume write and the resulting display
    /// update happen with echo suppression on.
    pub fn upsert(
        &mut self,
        attrs: &StreamAttributes,
        display: &mut dyn DisplaySink,
    ) -> &StreamEntry {
        let position = match self.position(attrs.index) {
            Some(position) => {
                let entry = &mut self.entries[position];
                entry.label = attrs.display_label().to_string();
                entry.icon_hint = attrs.display_icon().to_string();

                entry.echo_suppressed = true;
                entry.volume = attrs.volume.clone();
                display.entry_updated(entry);
                entry.echo_suppressed = false;

                trace!("Updated stream {} ({})", entry.index, entry.label);
                position
            }
            None => {
                let entry = StreamEntry::new(attrs);
                debug!("New stream {} ({})", entry.index, entry.label);
                display.entry_created(&entry);
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };

        &self.entries[position]
    }

    /// Remove the entry for `index`. Unknown indices are ignored.
    pub fn remove(&mut self, index: StreamIndex) -> Option<StreamEntry> {
        match self.position(index) {
            Some(position) => Some(self.entries.remove(position)),
            None => {
                trace!("Ignoring removal of unknown stream {}", index);
                None
            }
        }
    }

    /// Current entries in discovery order.
    pub fn entries(&self) -> impl Iterator<Item = &StreamEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: StreamIndex) -> Option<&StreamEntry> {
        self.entries.iter().find(|e| e.index == index)
    }

    pub fn get_mut(&mut self, index: StreamIndex) -> Option<&mut StreamEntry> {
        self.entries.iter_mut().find(|e| e.index == index)
    }

    pub fn contains(&self, index: StreamIndex) -> bool {
        self.position(index).is_some()
    }

    /// Position of `index` in discovery order.
    pub fn position(&self, index: StreamIndex) -> Option<usize> {
        self.entries.iter().position(|e| e.index == index)
    }

    /// Entry at `position` in discovery order.
    pub fn at(&self, position: usize) -> Option<&StreamEntry> {
        self.entries.get(position)
    }

    pub fn first(&self) -> Option<&StreamEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::testing::{attrs, Notice, RecordingDisplay};

    fn indices(registry: &StreamRegistry) -> Vec<StreamIndex> {
        registry.entries().map(|e| e.index).collect()
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut registry = StreamRegistry::new();
        let mut display = RecordingDisplay::default();
        let music = attrs(7, "Music", 0.5);

        registry.upsert(&music, &mut display);
        let first = registry.get(7).map(|e| (e.label.clone(), e.volume.clone()));
        registry.upsert(&music, &mut display);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(7).map(|e| (e.label.clone(), e.volume.clone())), first);
    }

    #[test]
    fn test_order_follows_discovery() {
        let mut registry = StreamRegistry::new();
        let mut display = RecordingDisplay::default();

        registry.upsert(&attrs(9, "a", 0.1), &mut display);
        registry.upsert(&attrs(2, "b", 0.2), &mut display);
        registry.upsert(&attrs(9, "a2", 0.3), &mut display);
        registry.upsert(&attrs(5, "c", 0.4), &mut display);
        registry.upsert(&attrs(2, "b2", 0.5), &mut display);

        assert_eq!(indices(&registry), vec![9, 2, 5]);
        assert_eq!(registry.get(9).map(|e| e.label.as_str()), Some("a2"));
    }

    #[test]
    fn test_update_runs_with_echo_suppressed() {
        let mut registry = StreamRegistry::new();
        let mut display = RecordingDisplay::default();

        registry.upsert(&attrs(1, "a", 0.5), &mut display);
        let entry = registry.upsert(&attrs(1, "a", 0.8), &mut display);

        assert!(!entry.echo_suppressed);
        assert!((entry.representative_volume() - 0.8).abs() < 1e-4);
        assert_eq!(
            display.notices,
            vec![Notice::Created(1), Notice::Updated(1, true)]
        );
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = StreamRegistry::new();
        let mut display = RecordingDisplay::default();
        registry.upsert(&attrs(1, "a", 0.5), &mut display);

        assert!(registry.remove(42).is_none());
        assert!(registry.remove(1).is_some());
        assert!(registry.remove(1).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_removed_index_can_be_reused() {
        let mut registry = StreamRegistry::new();
        let mut display = RecordingDisplay::default();
        registry.upsert(&attrs(1, "old", 0.5), &mut display);
        registry.upsert(&attrs(2, "b", 0.5), &mut display);
        registry.remove(1);
        registry.upsert(&attrs(1, "new", 0.5), &mut display);

        assert_eq!(indices(&registry), vec![2, 1]);
        assert_eq!(registry.get(1).map(|e| e.label.as_str()), Some("new"));
    }

    #[test]
    fn test_missing_label_uses_sentinel() {
        let mut registry = StreamRegistry::new();
        let mut display = RecordingDisplay::default();
        let mut unnamed = attrs(3, "", 0.5);
        unnamed.label = None;

        let entry = registry.upsert(&unnamed, &mut display);
        assert_eq!(entry.label, crate::audio::types::UNTITLED_LABEL);
        assert_eq!(entry.icon_hint, crate::audio::types::DEFAULT_ICON);
    }
}
