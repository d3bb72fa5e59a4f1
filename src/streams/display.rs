// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Notifications from the stream controller to whatever renders it.
//!
//! Rows cross to the UI thread as snapshots, so the entry's echo flag
//! travels with them: a slider value that only repeats an echoed row must
//! not be sent back as user input.

use crate::audio::types::StreamIndex;
use crate::streams::entry::StreamEntry;
use std::sync::mpsc;
use tracing::trace;

/// Receiver of registry and selection changes.
pub trait DisplaySink {
    fn entry_created(&mut self, entry: &StreamEntry);
    fn entry_updated(&mut self, entry: &StreamEntry);
    fn entry_removed(&mut self, index: StreamIndex);
    /// The active entry moved from `old` to `new`.
    fn highlight_changed(&mut self, new: Option<StreamIndex>, old: Option<StreamIndex>);
}

/// Snapshot of an entry, detached from the registry for the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRow {
    pub index: StreamIndex,
    pub label: String,
    pub icon_hint: String,
    /// Slider position in `[0, 1]`.
    pub fraction: f32,
    pub muted: bool,
    /// The snapshot was taken with echo suppression on.
    pub echo: bool,
}

impl From<&StreamEntry> for StreamRow {
    fn from(entry: &StreamEntry) -> Self {
        Self {
            index: entry.index,
            label: entry.label.clone(),
            icon_hint: entry.icon_hint.clone(),
            fraction: entry.representative_volume().clamp(0.0, 1.0) as f32,
            muted: entry.is_muted(),
            echo: entry.echo_suppressed,
        }
    }
}

/// Events sent from the audio thread to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Created(StreamRow),
    Updated(StreamRow),
    Removed(StreamIndex),
    Highlight {
        new: Option<StreamIndex>,
        old: Option<StreamIndex>,
    },
    /// Another invocation asked for the panel to be shown.
    ShowRequested,
    /// The audio-server session ended and will not recover.
    SessionEnded(String),
}

/// Display sink that forwards events over a channel.
pub struct ChannelDisplay {
    tx: mpsc::Sender<DisplayEvent>,
}

impl ChannelDisplay {
    pub fn new(tx: mpsc::Sender<DisplayEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: DisplayEvent) {
        // The UI may already be gone during shutdown.
        if self.tx.send(event).is_err() {
            trace!("Display channel closed, dropping event");
        }
    }
}

impl DisplaySink for ChannelDisplay {
    fn entry_created(&mut self, entry: &StreamEntry) {
        self.send(DisplayEvent::Created(entry.into()));
    }

    fn entry_updated(&mut self, entry: &StreamEntry) {
        self.send(DisplayEvent::Updated(entry.into()));
    }

    fn entry_removed(&mut self, index: StreamIndex) {
        self.send(DisplayEvent::Removed(index));
    }

    fn highlight_changed(&mut self, new: Option<StreamIndex>, old: Option<StreamIndex>) {
        self.send(DisplayEvent::Highlight { new, old });
    }
}

/// Display sink for headless runs.
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn entry_created(&mut self, _entry: &StreamEntry) {}
    fn entry_updated(&mut self, _entry: &StreamEntry) {}
    fn entry_removed(&mut self, _index: StreamIndex) {}
    fn highlight_changed(&mut self, _new: Option<StreamIndex>, _old: Option<StreamIndex>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::types::StreamAttributes;
    use crate::audio::volume::StreamVolume;

    #[test]
    fn test_channel_display_forwards_rows() {
        let (tx, rx) = mpsc::channel();
        let mut display = ChannelDisplay::new(tx);

        let attrs = StreamAttributes::new(4, StreamVolume::uniform(2, StreamVolume::NORMAL / 2))
            .with_label("mpv");
        let entry = StreamEntry::new(&attrs);
        display.entry_created(&entry);
        display.highlight_changed(Some(4), None);

        match rx.try_recv() {
            Ok(DisplayEvent::Created(row)) => {
                assert_eq!(row.index, 4);
                assert_eq!(row.label, "mpv");
                assert!((row.fraction - 0.5).abs() < 1e-6);
                assert!(!row.muted);
                assert!(!row.echo);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(
            rx.try_recv().ok(),
            Some(DisplayEvent::Highlight {
                new: Some(4),
                old: None
            })
        );
    }

    #[test]
    fn test_server_refresh_reaches_ui_as_echo() {
        use crate::streams::registry::StreamRegistry;
        use crate::streams::testing::attrs;

        let (tx, rx) = mpsc::channel();
        let mut display = ChannelDisplay::new(tx);
        let mut registry = StreamRegistry::new();

        registry.upsert(&attrs(2, "mpv", 0.5), &mut display);
        registry.upsert(&attrs(2, "mpv", 0.7), &mut display);

        let rows: Vec<_> = rx.try_iter().collect();
        match rows.as_slice() {
            [DisplayEvent::Created(created), DisplayEvent::Updated(updated)] => {
                assert!(!created.echo);
                assert!(updated.echo);
                assert!((updated.fraction - 0.7).abs() < 1e-4);
            }
            other => panic!("unexpected events: {:?}", other),
        }
        assert!(!registry.get(2).unwrap().echo_suppressed);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut display = ChannelDisplay::new(tx);
        display.entry_removed(1);
    }
}
