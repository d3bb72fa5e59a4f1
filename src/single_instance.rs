// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Single-instance mechanism using D-Bus.
//!
//! The panel instance owns [`DBUS_NAME`] and runs every command line it is
//! handed. A later invocation forwards its arguments there, prints the reply
//! and exits with the reply's code instead of starting a second panel.

use crate::audio::PulseRequest;
use appvol_ipc::{CommandReply, DBUS_INTERFACE, DBUS_NAME, DBUS_PATH};
use std::sync::mpsc;
use tracing::{debug, error, info, warn};
use zbus::blocking;

/// Forward `args` to a running instance.
///
/// Returns the instance's reply, or `None` if no instance is running (the
/// caller should handle the command itself).
pub fn try_forward(args: &[String]) -> Option<CommandReply> {
    let conn = match blocking::Connection::session() {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not connect to session D-Bus: {}", e);
            return None;
        }
    };

    let owned = conn
        .call_method(
            Some("org.freedesktop.DBus"),
            "/org/freedesktop/DBus",
            Some("org.freedesktop.DBus"),
            "NameHasOwner",
            &(DBUS_NAME,),
        )
        .and_then(|msg| msg.body().deserialize::<bool>())
        .unwrap_or(false);

    if !owned {
        debug!("No running instance owns {}", DBUS_NAME);
        return None;
    }

    info!("Forwarding {:?} to the running instance", args);
    let reply = conn
        .call_method(
            Some(DBUS_NAME),
            DBUS_PATH,
            Some(DBUS_INTERFACE),
            "Run",
            &(args,),
        )
        .and_then(|msg| msg.body().deserialize::<CommandReply>());

    match reply {
        Ok(reply) => Some(reply),
        Err(e) => {
            // The owner may have exited between the two calls.
            warn!("Forwarding to running instance failed: {}", e);
            None
        }
    }
}

/// D-Bus interface served by the panel instance.
struct CommandService {
    tx: mpsc::Sender<PulseRequest>,
}

#[zbus::interface(name = "com.appvol.Manager")]
impl CommandService {
    /// Run a forwarded command line and return its exit code and output.
    async fn run(&self, args: Vec<String>) -> CommandReply {
        info!("Received command {:?} from another instance", args);
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();

        let request = PulseRequest::Command {
            args,
            reply: reply_tx,
        };
        if self.tx.send(request).is_err() {
            return CommandReply::failure("Audio session is not running");
        }

        match reply_rx.await {
            Ok(reply) => reply,
            Err(_) => CommandReply::failure("Audio session ended before replying"),
        }
    }
}

/// Serve the command interface from a background thread.
///
/// Forwarded command lines are turned into [`PulseRequest::Command`]s on
/// `tx`.
pub fn start_command_listener(tx: mpsc::Sender<PulseRequest>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create runtime for command listener: {}", e);
                return;
            }
        };

        rt.block_on(async {
            let service = CommandService { tx };

            let builder = match zbus::connection::Builder::session() {
                Ok(b) => b,
                Err(e) => {
                    warn!("Failed to create D-Bus session builder: {}", e);
                    return;
                }
            };

            let builder = match builder.name(DBUS_NAME) {
                Ok(b) => b,
                Err(e) => {
                    warn!("Failed to request D-Bus name {}: {}", DBUS_NAME, e);
                    return;
                }
            };

            let builder = match builder.serve_at(DBUS_PATH, service) {
                Ok(b) => b,
                Err(e) => {
                    warn!("Failed to serve at {}: {}", DBUS_PATH, e);
                    return;
                }
            };

            match builder.build().await {
                Ok(_conn) => {
                    info!("Command listener registered on D-Bus as {}", DBUS_NAME);
                    std::future::pending::<()>().await;
                }
                Err(e) => {
                    warn!("Failed to register on D-Bus: {}", e);
                }
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_relays_through_pulse_thread() {
        let (tx, rx) = mpsc::channel();
        let service = CommandService { tx };

        let responder = std::thread::spawn(move || match rx.recv() {
            Ok(PulseRequest::Command { args, reply }) => {
                let _ = reply.send(CommandReply::success(args.join(" ")));
            }
            other => panic!("unexpected request: {:?}", other),
        });

        let reply = service.run(vec!["active".into(), "mute".into()]).await;
        responder.join().unwrap();

        assert!(reply.is_success());
        assert_eq!(reply.output, "active mute");
    }

    #[tokio::test]
    async fn test_run_without_pulse_thread_fails() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let service = CommandService { tx };

        let reply = service.run(vec!["active".into()]).await;
        assert!(!reply.is_success());
    }
}
