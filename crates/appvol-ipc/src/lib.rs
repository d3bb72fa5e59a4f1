// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Shared IPC types for AppVol.
//!
//! A running AppVol instance owns the well-known D-Bus name below. Later
//! invocations forward their command-line arguments to it and print the
//! reply instead of starting a second panel.

use serde::{Deserialize, Serialize};
use zbus::zvariant::Type;

/// D-Bus service name owned by the running instance.
pub const DBUS_NAME: &str = "com.appvol.Manager";

/// D-Bus object path for the command interface.
pub const DBUS_PATH: &str = "/com/appvol/Manager";

/// D-Bus interface name.
pub const DBUS_INTERFACE: &str = "com.appvol.Manager";

/// Exit code for a command that succeeded.
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for a command that was rejected.
pub const EXIT_FAILURE: i32 = 1;

/// Reply to a forwarded command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Type)]
pub struct CommandReply {
    /// Process exit code the forwarding instance should use.
    pub exit_code: i32,
    /// Text to print (stdout on success, stderr otherwise). May be empty.
    pub output: String,
}

impl CommandReply {
    /// Successful reply with optional output.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
            output: output.into(),
        }
    }

    /// Failed reply carrying an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            exit_code: EXIT_FAILURE,
            output: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }
}
