// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line protocol against the active stream.
//!
//! ```text
//! appvol                 show the panel
//! appvol active          print the active stream and its volume
//! appvol active mute     toggle mute on the active stream
//! appvol active +10%     nudge the active stream's volume
//! ```

use crate::streams::{AudioSession, DisplaySink, StreamController};
use appvol_ipc::{CommandReply, EXIT_FAILURE};
use thiserror::Error;
use tracing::{debug, info};

/// The only subject commands can act on.
pub const ACTIVE_SUBJECT: &str = "active";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the panel.
    Show,
    /// Report label and volume of the active stream.
    ReportActive,
    ToggleMute,
    /// Change the active stream's volume by this many percentage points.
    Adjust(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("No active stream")]
    NoActiveStream,
    #[error("Only actions on the active stream are supported, got '{0}'")]
    UnsupportedSubject(String),
    #[error("Invalid volume change '{0}', expected e.g. +10% or -5%")]
    InvalidAdjustment(String),
    #[error("Too many arguments")]
    TooManyArguments,
}

impl CommandError {
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }
}

/// What a successfully executed command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The panel should be shown.
    Show,
    /// Text for stdout.
    Report(String),
    /// A change was issued to the audio server.
    Applied,
}

impl Command {
    /// Parse the arguments following the program name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, CommandError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        match args.as_slice() {
            [] => Ok(Command::Show),
            [subject, ..] if *subject != ACTIVE_SUBJECT => {
                Err(CommandError::UnsupportedSubject(subject.to_string()))
            }
            [_] => Ok(Command::ReportActive),
            [_, "mute"] => Ok(Command::ToggleMute),
            [_, change] => parse_adjustment(change).map(Command::Adjust),
            _ => Err(CommandError::TooManyArguments),
        }
    }
}

/// Parse `+N%`, `-N%` or `N%`; the percent sign is optional.
fn parse_adjustment(text: &str) -> Result<i32, CommandError> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    number
        .parse::<i32>()
        .map_err(|_| CommandError::InvalidAdjustment(text.to_string()))
}

/// Run `command` against the controller's active stream.
pub fn execute(
    command: &Command,
    controller: &mut StreamController,
    session: &mut dyn AudioSession,
    display: &mut dyn DisplaySink,
) -> Result<CommandOutcome, CommandError> {
    if *command == Command::Show {
        return Ok(CommandOutcome::Show);
    }

    let entry = controller.active().ok_or(CommandError::NoActiveStream)?;
    let index = entry.index;

    match command {
        Command::Show => Ok(CommandOutcome::Show),
        Command::ReportActive => Ok(CommandOutcome::Report(format!(
            "Active app is '{}', Volume: {}%",
            entry.label,
            entry.volume_percent()
        ))),
        Command::ToggleMute => {
            let muted = !entry.is_muted();
            info!("Command: mute stream {} -> {}", index, muted);
            controller.set_muted(index, muted, session, display);
            Ok(CommandOutcome::Applied)
        }
        Command::Adjust(change) => {
            let fraction =
                (entry.representative_volume() + f64::from(*change) / 100.0).clamp(0.0, 1.0);
            info!("Command: volume of stream {} -> {:.2}", index, fraction);
            controller.set_volume(index, fraction, session, display);
            Ok(CommandOutcome::Applied)
        }
    }
}

/// Parse and run `args`, folding the result into a reply for the caller.
pub fn run_args(
    args: &[String],
    controller: &mut StreamController,
    session: &mut dyn AudioSession,
    display: &mut dyn DisplaySink,
) -> (Option<CommandOutcome>, CommandReply) {
    let result = Command::parse(args).and_then(|command| {
        debug!("Executing {:?}", command);
        execute(&command, controller, session, display)
    });

    match result {
        Ok(CommandOutcome::Report(text)) => (
            Some(CommandOutcome::Report(text.clone())),
            CommandReply::success(text),
        ),
        Ok(outcome) => (Some(outcome), CommandReply::success("")),
        Err(e) => (
            None,
            CommandReply {
                exit_code: e.exit_code(),
                output: e.to_string(),
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::types::SessionState;
    use crate::streams::testing::{attrs, RecordingDisplay, RecordingSession};
    use crate::streams::SessionEvent;

    fn controller_with(streams: &[(u32, &str, f64)]) -> (StreamController, RecordingSession) {
        let mut controller = StreamController::new();
        let mut session = RecordingSession::default();
        let mut display = RecordingDisplay::default();
        let mut events = vec![SessionEvent::State(SessionState::Ready)];
        for &(index, label, fraction) in streams {
            events.push(SessionEvent::ListItem(attrs(index, label, fraction)));
        }
        events.push(SessionEvent::ListEnd);
        for event in events {
            controller.dispatch(event, &mut session, &mut display).unwrap();
        }
        (controller, session)
    }

    fn run(
        controller: &mut StreamController,
        session: &mut RecordingSession,
        args: &[&str],
    ) -> Result<CommandOutcome, CommandError> {
        let command = Command::parse(args)?;
        execute(&command, controller, session, &mut RecordingDisplay::default())
    }

    #[test]
    fn test_parse_forms() {
        let none: [&str; 0] = [];
        assert_eq!(Command::parse(&none), Ok(Command::Show));
        assert_eq!(Command::parse(&["active"]), Ok(Command::ReportActive));
        assert_eq!(Command::parse(&["active", "mute"]), Ok(Command::ToggleMute));
        assert_eq!(Command::parse(&["active", "+10%"]), Ok(Command::Adjust(10)));
        assert_eq!(Command::parse(&["active", "-5%"]), Ok(Command::Adjust(-5)));
        assert_eq!(Command::parse(&["active", "15"]), Ok(Command::Adjust(15)));
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(
            Command::parse(&["firefox"]),
            Err(CommandError::UnsupportedSubject("firefox".into()))
        );
        assert_eq!(
            Command::parse(&["active", "loud"]),
            Err(CommandError::InvalidAdjustment("loud".into()))
        );
        assert_eq!(
            Command::parse(&["active", "+10%", "extra"]),
            Err(CommandError::TooManyArguments)
        );
    }

    #[test]
    fn test_mute_without_streams_fails() {
        let (mut controller, mut session) = controller_with(&[]);
        let result = run(&mut controller, &mut session, &["active", "mute"]);

        assert_eq!(result, Err(CommandError::NoActiveStream));
        assert_ne!(CommandError::NoActiveStream.exit_code(), 0);
        assert_eq!(session.volume_sets(), 0);
    }

    #[test]
    fn test_report_without_streams_fails() {
        let (mut controller, mut session) = controller_with(&[]);
        assert_eq!(
            run(&mut controller, &mut session, &["active"]),
            Err(CommandError::NoActiveStream)
        );
    }

    #[test]
    fn test_show_tolerates_empty_registry() {
        let (mut controller, mut session) = controller_with(&[]);
        let none: [&str; 0] = [];
        assert_eq!(run(&mut controller, &mut session, &none), Ok(CommandOutcome::Show));
    }

    #[test]
    fn test_report_active() {
        let (mut controller, mut session) =
            controller_with(&[(7, "Music", 0.5), (8, "Video", 0.2)]);
        assert_eq!(
            run(&mut controller, &mut session, &["active"]),
            Ok(CommandOutcome::Report(
                "Active app is 'Music', Volume: 50%".to_string()
            ))
        );
    }

    #[test]
    fn test_increase_clamps_at_full() {
        let (mut controller, mut session) = controller_with(&[(7, "Music", 0.95)]);
        run(&mut controller, &mut session, &["active", "+10%"]).unwrap();

        let (_, index, volume) = session.last_volume_set().unwrap();
        assert_eq!(index, 7);
        assert_eq!(volume.max(), crate::audio::volume::StreamVolume::NORMAL);
        assert_eq!(controller.active().unwrap().volume_percent(), 100);
    }

    #[test]
    fn test_decrease_clamps_at_zero() {
        let (mut controller, mut session) = controller_with(&[(7, "Music", 0.05)]);
        run(&mut controller, &mut session, &["active", "-20%"]).unwrap();
        assert!(controller.active().unwrap().is_muted());
    }

    #[test]
    fn test_mute_toggles() {
        let (mut controller, mut session) = controller_with(&[(7, "Music", 0.4)]);

        run(&mut controller, &mut session, &["active", "mute"]).unwrap();
        assert!(controller.active().unwrap().is_muted());

        run(&mut controller, &mut session, &["active", "mute"]).unwrap();
        assert_eq!(controller.active().unwrap().volume_percent(), 40);
    }

    #[test]
    fn test_run_args_builds_reply() {
        let (mut controller, mut session) = controller_with(&[]);
        let args = vec!["active".to_string()];
        let (outcome, reply) = run_args(
            &args,
            &mut controller,
            &mut session,
            &mut RecordingDisplay::default(),
        );

        assert_eq!(outcome, None);
        assert!(!reply.is_success());
        assert_eq!(reply.output, "No active stream");
    }
}
