// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! PulseAudio session and the thread that drives it.
//!
//! libpulse objects are not Send, so the mainloop, the context and the
//! stream controller all live on one dedicated thread. Callbacks only queue
//! [`SessionEvent`]s; the loop drains that queue into the controller after
//! every mainloop pass, so dispatch never runs inside a libpulse callback.
//! The same driver is used in-process for one-shot command runs.

use crate::audio::types::{OperationId, SessionState, StreamAttributes, StreamIndex};
use crate::audio::volume::StreamVolume;
use crate::command::{self, Command, CommandOutcome};
use crate::config::SessionConfig;
use crate::streams::{
    AudioSession, ChannelDisplay, DisplayEvent, DisplaySink, NullDisplay, SessionError,
    SessionEvent, StreamController, UiInput,
};
use appvol_ipc::CommandReply;
use libpulse_binding::callbacks::ListResult;
use libpulse_binding::context::introspect::SinkInputInfo;
use libpulse_binding::context::subscribe::{Facility, InterestMaskSet, Operation as SubscribeOp};
use libpulse_binding::context::{Context, FlagSet as ContextFlagSet, State as ContextState};
use libpulse_binding::mainloop::standard::{IterateResult, Mainloop};
use libpulse_binding::operation::Operation;
use libpulse_binding::proplist::properties;
use libpulse_binding::volume::{ChannelVolumes, Volume};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// Client name announced to the server.
const CLIENT_NAME: &str = "appvol";

/// Upper bound on channels in a PulseAudio channel volume.
const MAX_CHANNELS: usize = 32;

/// Requests sent from the UI and IPC side to the PulseAudio thread.
#[derive(Debug)]
pub enum PulseRequest {
    /// Input from the panel.
    Input(UiInput),
    /// A command line forwarded from another invocation.
    Command {
        args: Vec<String>,
        reply: tokio::sync::oneshot::Sender<CommandReply>,
    },
    /// Stop the thread.
    Shutdown,
}

#[derive(Debug, Error)]
pub enum PulseError {
    #[error("PulseAudio initialization failed: {0}")]
    InitFailed(String),
    #[error("Failed to connect to PulseAudio: {0}")]
    ConnectionFailed(String),
    #[error("PulseAudio mainloop error: {0}")]
    Mainloop(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Timed out waiting for the audio server")]
    Timeout,
    #[error("PulseAudio thread error: {0}")]
    ThreadError(String),
}

type EventQueue = Rc<RefCell<VecDeque<SessionEvent>>>;

/// [`AudioSession`] backed by a libpulse context.
pub struct PulseSession {
    context: Context,
    events: EventQueue,
    /// In-flight volume writes, kept so they can be cancelled.
    operations: HashMap<OperationId, Operation<dyn FnMut(bool)>>,
    next_operation: u64,
    last_state: Option<SessionState>,
}

impl PulseSession {
    /// Create a context on `mainloop` and start connecting to the default
    /// server. Progress shows up through [`PulseSession::poll_state`].
    pub fn connect(mainloop: &Mainloop) -> Result<Self, PulseError> {
        let mut context = Context::new(mainloop, CLIENT_NAME)
            .ok_or_else(|| PulseError::InitFailed("Failed to create context".to_string()))?;

        context
            .connect(None, ContextFlagSet::NOFAIL, None)
            .map_err(|e| PulseError::ConnectionFailed(ToString::to_string(&e)))?;
        debug!("PulseAudio context connecting");

        Ok(Self {
            context,
            events: Rc::new(RefCell::new(VecDeque::new())),
            operations: HashMap::new(),
            next_operation: 0,
            last_state: None,
        })
    }

    /// Queue a `State` event if the context state moved since the last poll.
    ///
    /// Polled rather than delivered from a state callback, which may fire
    /// while the context is still being connected.
    pub fn poll_state(&mut self) {
        let state = session_state(self.context.get_state());
        if self.last_state != Some(state) {
            trace!("Context state {:?}", state);
            self.last_state = Some(state);
            self.push(SessionEvent::State(state));
        }
    }

    /// Next queued event, if any.
    pub fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.events.borrow_mut().pop_front();
        if let Some(SessionEvent::OperationCompleted(id, _)) = &event {
            self.operations.remove(id);
        }
        event
    }

    fn push(&self, event: SessionEvent) {
        self.events.borrow_mut().push_back(event);
    }
}

impl AudioSession for PulseSession {
    fn subscribe_streams(&mut self) {
        let events = Rc::clone(&self.events);
        self.context
            .set_subscribe_callback(Some(Box::new(move |facility, operation, index| {
                if !matches!(facility, Some(Facility::SinkInput)) {
                    return;
                }
                let event = match operation {
                    Some(SubscribeOp::New) => SessionEvent::StreamNew(index),
                    Some(SubscribeOp::Changed) => SessionEvent::StreamChanged(index),
                    Some(SubscribeOp::Removed) => SessionEvent::StreamRemoved(index),
                    None => return,
                };
                events.borrow_mut().push_back(event);
            })));

        self.context.subscribe(InterestMaskSet::SINK_INPUT, |success| {
            if !success {
                warn!("Sink input subscription was rejected");
            }
        });
    }

    fn request_stream_list(&mut self) {
        let events = Rc::clone(&self.events);
        self.context
            .introspect()
            .get_sink_input_info_list(move |result| {
                let event = match result {
                    ListResult::Item(info) => SessionEvent::ListItem(attributes_of(info)),
                    ListResult::End => SessionEvent::ListEnd,
                    ListResult::Error => {
                        warn!("Sink input listing failed");
                        SessionEvent::ListEnd
                    }
                };
                events.borrow_mut().push_back(event);
            });
    }

    fn request_stream_detail(&mut self, index: StreamIndex) {
        let events = Rc::clone(&self.events);
        let mut found = false;
        self.context
            .introspect()
            .get_sink_input_info(index, move |result| {
                let event = match result {
                    ListResult::Item(info) => {
                        found = true;
                        SessionEvent::DetailArrived(attributes_of(info))
                    }
                    ListResult::End if found => return,
                    ListResult::End | ListResult::Error => SessionEvent::DetailUnavailable(index),
                };
                events.borrow_mut().push_back(event);
            });
    }

    fn set_stream_volume(&mut self, index: StreamIndex, volume: &StreamVolume) -> OperationId {
        self.next_operation += 1;
        let id = OperationId(self.next_operation);

        let events = Rc::clone(&self.events);
        let operation = self.context.introspect().set_sink_input_volume(
            index,
            &to_channel_volumes(volume),
            Some(Box::new(move |success| {
                events
                    .borrow_mut()
                    .push_back(SessionEvent::OperationCompleted(id, success));
            })),
        );
        self.operations.insert(id, operation);
        id
    }

    fn cancel_operation(&mut self, id: OperationId) {
        if let Some(mut operation) = self.operations.remove(&id) {
            operation.cancel();
        }
    }
}

impl Drop for PulseSession {
    fn drop(&mut self) {
        for (_, mut operation) in self.operations.drain() {
            operation.cancel();
        }
        self.context.disconnect();
    }
}

/// Mainloop, session and controller, owned by one thread.
///
/// Field order matters: the context must go before its mainloop.
struct PulseDriver {
    controller: StreamController,
    session: PulseSession,
    mainloop: Mainloop,
}

impl PulseDriver {
    fn connect() -> Result<Self, PulseError> {
        let mainloop = Mainloop::new()
            .ok_or_else(|| PulseError::InitFailed("Failed to create mainloop".to_string()))?;
        let session = PulseSession::connect(&mainloop)?;

        Ok(Self {
            controller: StreamController::new(),
            session,
            mainloop,
        })
    }

    /// One non-blocking mainloop pass, then dispatch whatever it produced.
    fn pump(&mut self, display: &mut dyn DisplaySink) -> Result<(), PulseError> {
        match self.mainloop.iterate(false) {
            IterateResult::Success(_) => {}
            IterateResult::Quit(retval) => {
                return Err(PulseError::Mainloop(format!("quit with {:?}", retval)));
            }
            IterateResult::Err(e) => return Err(PulseError::Mainloop(ToString::to_string(&e))),
        }

        self.session.poll_state();
        while let Some(event) = self.session.next_event() {
            self.controller
                .dispatch(event, &mut self.session, display)?;
        }
        Ok(())
    }

    /// Pump until `done` holds or `timeout` passes. Returns whether `done`
    /// was reached.
    fn pump_until(
        &mut self,
        display: &mut dyn DisplaySink,
        poll: Duration,
        timeout: Duration,
        done: impl Fn(&StreamController) -> bool,
    ) -> Result<bool, PulseError> {
        let start = Instant::now();
        loop {
            self.pump(display)?;
            if done(&self.controller) {
                return Ok(true);
            }
            if start.elapsed() > timeout {
                return Ok(false);
            }
            thread::sleep(poll);
        }
    }

    fn handle_request(&mut self, request: PulseRequest, display: &mut ChannelDisplay) {
        match request {
            PulseRequest::Input(input) => {
                self.controller
                    .handle_input(input, &mut self.session, display);
            }
            PulseRequest::Command { args, reply } => {
                let (outcome, response) =
                    command::run_args(&args, &mut self.controller, &mut self.session, display);
                if outcome == Some(CommandOutcome::Show) {
                    display.send(DisplayEvent::ShowRequested);
                }
                if reply.send(response).is_err() {
                    debug!("Command caller went away before the reply");
                }
            }
            PulseRequest::Shutdown => {}
        }
    }
}

/// Handle to the PulseAudio thread.
pub struct PulseThread {
    /// Channel to send requests to the PulseAudio thread.
    request_tx: mpsc::Sender<PulseRequest>,
    /// Handle to the spawned thread.
    handle: Option<JoinHandle<()>>,
}

impl PulseThread {
    /// Spawn the PulseAudio thread. Display events go to `display_tx`.
    pub fn spawn(
        display_tx: mpsc::Sender<DisplayEvent>,
        config: SessionConfig,
    ) -> Result<Self, PulseError> {
        let (request_tx, request_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("pulseaudio".to_string())
            .spawn(move || {
                let mut display = ChannelDisplay::new(display_tx);
                if let Err(e) = run_pulse_loop(request_rx, &mut display, &config) {
                    error!("PulseAudio thread error: {}", e);
                    display.send(DisplayEvent::SessionEnded(e.to_string()));
                }
            })
            .map_err(|e| PulseError::ThreadError(e.to_string()))?;

        Ok(Self {
            request_tx,
            handle: Some(handle),
        })
    }

    /// Send a request to the PulseAudio thread.
    pub fn send(&self, request: PulseRequest) -> Result<(), PulseError> {
        self.request_tx
            .send(request)
            .map_err(|_| PulseError::ThreadError("Channel closed".to_string()))
    }

    /// A sender for other threads (the IPC listener).
    pub fn sender(&self) -> mpsc::Sender<PulseRequest> {
        self.request_tx.clone()
    }
}

impl Drop for PulseThread {
    fn drop(&mut self) {
        let _ = self.request_tx.send(PulseRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Main loop of the PulseAudio thread.
fn run_pulse_loop(
    requests: mpsc::Receiver<PulseRequest>,
    display: &mut ChannelDisplay,
    config: &SessionConfig,
) -> Result<(), PulseError> {
    let mut driver = PulseDriver::connect()?;
    let poll = Duration::from_millis(config.poll_interval_ms);
    info!("PulseAudio thread started");

    loop {
        driver.pump(display)?;

        loop {
            match requests.try_recv() {
                Ok(PulseRequest::Shutdown) | Err(TryRecvError::Disconnected) => {
                    info!("PulseAudio thread shutting down");
                    return Ok(());
                }
                Ok(request) => driver.handle_request(request, display),
                Err(TryRecvError::Empty) => break,
            }
        }

        thread::sleep(poll);
    }
}

/// Run one command line against a private connection and return the reply.
///
/// Used when no panel instance is running. Waits for the first stream
/// listing before executing, then for the resulting volume write to be
/// acknowledged, each bounded by `sync_timeout_ms`.
pub fn run_headless(args: &[String], config: &SessionConfig) -> CommandReply {
    // Usage errors do not need a server connection.
    if let Err(e) = Command::parse(args) {
        return CommandReply {
            exit_code: e.exit_code(),
            output: e.to_string(),
        };
    }

    match headless(args, config) {
        Ok(reply) => reply,
        Err(e) => {
            error!("One-shot command failed: {}", e);
            CommandReply::failure(e.to_string())
        }
    }
}

fn headless(args: &[String], config: &SessionConfig) -> Result<CommandReply, PulseError> {
    let mut driver = PulseDriver::connect()?;
    let mut display = NullDisplay;
    let poll = Duration::from_millis(config.poll_interval_ms);
    let timeout = Duration::from_millis(config.sync_timeout_ms);

    if !driver.pump_until(&mut display, poll, timeout, |c| c.is_synchronized())? {
        return Err(PulseError::Timeout);
    }

    let (_, reply) = command::run_args(
        args,
        &mut driver.controller,
        &mut driver.session,
        &mut display,
    );

    if !driver.pump_until(&mut display, poll, timeout, |c| !c.has_pending_operations())? {
        warn!("Volume change was not acknowledged in time");
    }
    Ok(reply)
}

fn session_state(state: ContextState) -> SessionState {
    match state {
        ContextState::Unconnected => SessionState::Unconnected,
        ContextState::Connecting => SessionState::Connecting,
        ContextState::Authorizing => SessionState::Authorizing,
        ContextState::SettingName => SessionState::SettingName,
        ContextState::Ready => SessionState::Ready,
        ContextState::Failed => SessionState::Failed,
        ContextState::Terminated => SessionState::Terminated,
    }
}

fn attributes_of(info: &SinkInputInfo) -> StreamAttributes {
    let mut attrs = StreamAttributes::new(info.index, from_channel_volumes(&info.volume));
    attrs.label = info.proplist.get_str(properties::APPLICATION_NAME);
    attrs.icon_hint = info.proplist.get_str(properties::APPLICATION_ICON_NAME);
    attrs
}

fn to_channel_volumes(volume: &StreamVolume) -> ChannelVolumes {
    let levels = volume.channels();
    let count = levels.len().min(MAX_CHANNELS);

    let mut channels = ChannelVolumes::default();
    channels.set_len(count as u8);
    for (slot, level) in channels.get_mut().iter_mut().zip(levels) {
        *slot = Volume(*level);
    }
    channels
}

fn from_channel_volumes(channels: &ChannelVolumes) -> StreamVolume {
    StreamVolume::new(channels.get().iter().map(|v| v.0).collect())
}
