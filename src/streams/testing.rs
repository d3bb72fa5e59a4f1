// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recording fakes for the session and display contracts.

use crate::audio::types::{OperationId, StreamAttributes, StreamIndex};
use crate::audio::volume::StreamVolume;
use crate::streams::display::DisplaySink;
use crate::streams::entry::StreamEntry;
use crate::streams::session::AudioSession;

/// A request the controller made of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Subscribe,
    List,
    Detail(StreamIndex),
    SetVolume(OperationId, StreamIndex, StreamVolume),
    Cancel(OperationId),
}

#[derive(Default)]
pub struct RecordingSession {
    pub requests: Vec<Request>,
    next_id: u64,
}

impl RecordingSession {
    pub fn cancelled(&self) -> Vec<OperationId> {
        self.requests
            .iter()
            .filter_map(|r| match r {
                Request::Cancel(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn last_volume_set(&self) -> Option<(OperationId, StreamIndex, StreamVolume)> {
        self.requests.iter().rev().find_map(|r| match r {
            Request::SetVolume(id, index, volume) => Some((*id, *index, volume.clone())),
            _ => None,
        })
    }

    pub fn volume_sets(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| matches!(r, Request::SetVolume(..)))
            .count()
    }
}

impl AudioSession for RecordingSession {
    fn subscribe_streams(&mut self) {
        self.requests.push(Request::Subscribe);
    }

    fn request_stream_list(&mut self) {
        self.requests.push(Request::List);
    }

    fn request_stream_detail(&mut self, index: StreamIndex) {
        self.requests.push(Request::Detail(index));
    }

    fn set_stream_volume(&mut self, index: StreamIndex, volume: &StreamVolume) -> OperationId {
        self.next_id += 1;
        let id = OperationId(self.next_id);
        self.requests
            .push(Request::SetVolume(id, index, volume.clone()));
        id
    }

    fn cancel_operation(&mut self, id: OperationId) {
        self.requests.push(Request::Cancel(id));
    }
}

/// A notification the controller sent to the display.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Created(StreamIndex),
    /// Updated entry and whether echo suppression was on while notifying.
    Updated(StreamIndex, bool),
    Removed(StreamIndex),
    Highlight(Option<StreamIndex>, Option<StreamIndex>),
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub notices: Vec<Notice>,
}

impl RecordingDisplay {
    pub fn highlights(&self) -> Vec<(Option<StreamIndex>, Option<StreamIndex>)> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Highlight(new, old) => Some((*new, *old)),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySink for RecordingDisplay {
    fn entry_created(&mut self, entry: &StreamEntry) {
        self.notices.push(Notice::Created(entry.index));
    }

    fn entry_updated(&mut self, entry: &StreamEntry) {
        self.notices
            .push(Notice::Updated(entry.index, entry.echo_suppressed));
    }

    fn entry_removed(&mut self, index: StreamIndex) {
        self.notices.push(Notice::Removed(index));
    }

    fn highlight_changed(&mut self, new: Option<StreamIndex>, old: Option<StreamIndex>) {
        self.notices.push(Notice::Highlight(new, old));
    }
}

/// Stereo stream attributes at `fraction` volume.
pub fn attrs(index: StreamIndex, label: &str, fraction: f64) -> StreamAttributes {
    let mut volume = StreamVolume::uniform(2, StreamVolume::NORMAL);
    volume.scale_to_fraction(fraction);
    StreamAttributes::new(index, volume).with_label(label)
}
