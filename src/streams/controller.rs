// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Synchronization between the audio-server session and the local registry.
//!
//! The controller is an owned context: it holds the registry, the active
//! selection and the bookkeeping for outstanding requests. All session
//! events go through [`StreamController::dispatch`], all UI input through
//! [`StreamController::handle_input`], both on the thread that owns it.

use crate::audio::types::{OperationId, SessionState, StreamAttributes, StreamIndex};
use crate::streams::display::DisplaySink;
use crate::streams::entry::StreamEntry;
use crate::streams::executor;
use crate::streams::registry::StreamRegistry;
use crate::streams::selection::{ActiveSelection, Direction};
use crate::streams::session::{AudioSession, SessionError, SessionEvent};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, trace, warn};

/// Connection lifecycle as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    Failed,
    Terminated,
}

/// Input coming from the display layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiInput {
    /// The user dragged the slider of `index` to `fraction`.
    SliderMoved { index: StreamIndex, fraction: f64 },
    Navigate(Direction),
    /// Toggle mute on the active stream.
    ToggleMute,
    /// Nudge the active stream's volume by `delta` (fraction of 100%).
    StepActive(f64),
}

/// Progress of the snapshot listing requested on `Ready`.
#[derive(Debug, Default)]
enum Listing {
    #[default]
    Idle,
    /// Listing in flight; indices removed meanwhile are skipped.
    InFlight { removed: HashSet<StreamIndex> },
    Done,
}

#[derive(Debug)]
pub struct StreamController {
    state: ConnectionState,
    registry: StreamRegistry,
    selection: ActiveSelection,
    /// Outstanding detail requests per index.
    awaiting_detail: HashMap<StreamIndex, u32>,
    listing: Listing,
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamController {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            registry: StreamRegistry::new(),
            selection: ActiveSelection::new(),
            awaiting_detail: HashMap::new(),
            listing: Listing::Idle,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// Index of the active stream, re-validated against the registry.
    pub fn active_index(&self) -> Option<StreamIndex> {
        self.selection.active(&self.registry)
    }

    pub fn active(&self) -> Option<&StreamEntry> {
        self.active_index().and_then(|i| self.registry.get(i))
    }

    /// True once the first snapshot listing after `Ready` has been applied.
    pub fn is_synchronized(&self) -> bool {
        self.state == ConnectionState::Ready && matches!(self.listing, Listing::Done)
    }

    pub fn has_pending_operations(&self) -> bool {
        self.registry
            .entries()
            .any(|e| e.pending_operation.is_some())
    }

    /// Apply one session event.
    ///
    /// Per-stream inconsistencies are absorbed here. Only terminal
    /// connection states come back as errors.
    pub fn dispatch(
        &mut self,
        event: SessionEvent,
        session: &mut dyn AudioSession,
        display: &mut dyn DisplaySink,
    ) -> Result<(), SessionError> {
        match event {
            SessionEvent::State(state) => return self.on_state(state, session),
            SessionEvent::OperationCompleted(id, success) => self.on_completed(id, success),
            _ if self.state != ConnectionState::Ready => {
                trace!("Ignoring {:?} while {:?}", event, self.state);
            }
            SessionEvent::StreamNew(index) | SessionEvent::StreamChanged(index) => {
                *self.awaiting_detail.entry(index).or_insert(0) += 1;
                session.request_stream_detail(index);
            }
            SessionEvent::StreamRemoved(index) => {
                self.remove_stream(index, session, display);
            }
            SessionEvent::DetailArrived(attrs) => {
                if self.take_detail_request(attrs.index) {
                    self.reconcile(&attrs, display);
                } else {
                    debug!("Discarding late detail for stream {}", attrs.index);
                }
            }
            SessionEvent::DetailUnavailable(index) => {
                self.take_detail_request(index);
                trace!("Detail for stream {} unavailable", index);
            }
            SessionEvent::ListItem(attrs) => match &self.listing {
                Listing::InFlight { removed } if removed.contains(&attrs.index) => {
                    debug!("Skipping listed stream {} removed meanwhile", attrs.index);
                }
                _ => self.reconcile(&attrs, display),
            },
            SessionEvent::ListEnd => {
                info!("Stream listing complete: {} streams", self.registry.len());
                self.listing = Listing::Done;
                self.selection.ensure_selection(&self.registry, display);
            }
        }

        Ok(())
    }

    /// Apply one UI input.
    pub fn handle_input(
        &mut self,
        input: UiInput,
        session: &mut dyn AudioSession,
        display: &mut dyn DisplaySink,
    ) {
        match input {
            UiInput::SliderMoved { index, fraction } => {
                let Some(entry) = self.registry.get_mut(index) else {
                    trace!("Slider input for unknown stream {}", index);
                    return;
                };
                if executor::apply_user_input(entry, fraction, session).is_some() {
                    notify_updated(entry, display);
                }
            }
            UiInput::Navigate(direction) => {
                self.navigate(direction, display);
            }
            UiInput::ToggleMute => {
                if let Some(index) = self.active_index() {
                    let muted = self.registry.get(index).is_some_and(|e| e.is_muted());
                    self.set_muted(index, !muted, session, display);
                }
            }
            UiInput::StepActive(delta) => {
                let Some(entry) = self.active_index().and_then(|i| self.registry.get_mut(i)) else {
                    return;
                };
                let fraction = (entry.representative_volume() + delta).clamp(0.0, 1.0);
                if executor::apply_user_input(entry, fraction, session).is_some() {
                    notify_updated(entry, display);
                }
            }
        }
    }

    /// Move the active selection one step.
    pub fn navigate(
        &mut self,
        direction: Direction,
        display: &mut dyn DisplaySink,
    ) -> Option<StreamIndex> {
        self.selection.move_relative(&self.registry, direction, display)
    }

    /// Set the volume of stream `index` to `fraction` of 100%.
    pub fn set_volume(
        &mut self,
        index: StreamIndex,
        fraction: f64,
        session: &mut dyn AudioSession,
        display: &mut dyn DisplaySink,
    ) -> Option<OperationId> {
        let entry = self.registry.get_mut(index)?;
        let id = executor::set_volume(entry, fraction, session);
        notify_updated(entry, display);
        Some(id)
    }

    /// Mute or unmute stream `index`.
    pub fn set_muted(
        &mut self,
        index: StreamIndex,
        muted: bool,
        session: &mut dyn AudioSession,
        display: &mut dyn DisplaySink,
    ) -> Option<OperationId> {
        let entry = self.registry.get_mut(index)?;
        let id = executor::set_muted(entry, muted, session);
        notify_updated(entry, display);
        Some(id)
    }

    /// Drop stream `index`. Returns whether it was the active one; if so a
    /// replacement is selected (or the selection cleared).
    pub fn remove_stream(
        &mut self,
        index: StreamIndex,
        session: &mut dyn AudioSession,
        display: &mut dyn DisplaySink,
    ) -> bool {
        self.awaiting_detail.remove(&index);
        if let Listing::InFlight { removed } = &mut self.listing {
            removed.insert(index);
        }

        let Some(entry) = self.registry.remove(index) else {
            return false;
        };
        debug!("Stream {} ({}) removed", index, entry.label);

        if let Some(pending) = entry.pending_operation {
            session.cancel_operation(pending);
        }
        display.entry_removed(index);

        let was_active = self.selection.names(index);
        if was_active {
            self.selection.ensure_selection(&self.registry, display);
        }
        was_active
    }

    fn on_state(
        &mut self,
        state: SessionState,
        session: &mut dyn AudioSession,
    ) -> Result<(), SessionError> {
        match state {
            SessionState::Connecting => {
                debug!("Connecting to audio server");
                self.state = ConnectionState::Connecting;
            }
            SessionState::Ready => {
                info!("Audio server session ready");
                self.state = ConnectionState::Ready;
                self.listing = Listing::InFlight {
                    removed: HashSet::new(),
                };
                session.subscribe_streams();
                session.request_stream_list();
            }
            SessionState::Failed => {
                warn!("Audio server session failed");
                self.state = ConnectionState::Failed;
                return Err(SessionError::Failed);
            }
            SessionState::Terminated => {
                info!("Audio server session terminated");
                self.state = ConnectionState::Terminated;
                return Err(SessionError::Terminated);
            }
            SessionState::Unconnected | SessionState::Authorizing | SessionState::SettingName => {
                trace!("Session state {:?}", state);
            }
        }
        Ok(())
    }

    fn on_completed(&mut self, id: OperationId, success: bool) {
        let owner = self
            .registry
            .entries()
            .find(|e| e.pending_operation == Some(id))
            .map(|e| e.index);

        match owner.and_then(|index| self.registry.get_mut(index)) {
            Some(entry) => {
                executor::complete(entry, id, success);
            }
            None => trace!("Completion {} has no pending owner", id),
        }
    }

    fn reconcile(&mut self, attrs: &StreamAttributes, display: &mut dyn DisplaySink) {
        self.registry.upsert(attrs, display);
        self.selection.ensure_selection(&self.registry, display);
    }

    fn take_detail_request(&mut self, index: StreamIndex) -> bool {
        match self.awaiting_detail.get_mut(&index) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.awaiting_detail.remove(&index);
                true
            }
            None => false,
        }
    }
}

/// Report a locally initiated volume change with echo suppression on.
fn notify_updated(entry: &mut StreamEntry, display: &mut dyn DisplaySink) {
    entry.echo_suppressed = true;
    display.entry_updated(entry);
    entry.echo_suppressed = false;
}
