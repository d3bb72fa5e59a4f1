// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contract between the stream controller and the audio-server session.
//!
//! Every request is fire-and-forget. Results come back later as
//! [`SessionEvent`]s, delivered in order on the thread that owns the
//! controller.

use crate::audio::types::{OperationId, SessionState, StreamAttributes, StreamIndex};
use crate::audio::volume::StreamVolume;
use thiserror::Error;

/// Requests the controller issues against the audio server.
pub trait AudioSession {
    /// Start delivering `StreamNew`/`StreamChanged`/`StreamRemoved` events.
    fn subscribe_streams(&mut self);

    /// Ask for every current stream, answered by `ListItem`s and a `ListEnd`.
    fn request_stream_list(&mut self);

    /// Ask for one stream, answered by `DetailArrived` or `DetailUnavailable`.
    fn request_stream_detail(&mut self, index: StreamIndex);

    /// Push a new volume, answered by `OperationCompleted` unless cancelled.
    fn set_stream_volume(&mut self, index: StreamIndex, volume: &StreamVolume) -> OperationId;

    /// Cancel an in-flight volume request. Its completion is never delivered.
    fn cancel_operation(&mut self, id: OperationId);
}

/// Everything the session reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    State(SessionState),
    StreamNew(StreamIndex),
    StreamChanged(StreamIndex),
    StreamRemoved(StreamIndex),
    DetailArrived(StreamAttributes),
    DetailUnavailable(StreamIndex),
    ListItem(StreamAttributes),
    ListEnd,
    OperationCompleted(OperationId, bool),
}

/// Terminal session conditions surfaced past the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Audio server connection failed")]
    Failed,
    #[error("Audio server connection terminated")]
    Terminated,
}
