// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stream tracking: registry, selection, volume commands and the
//! controller that keeps them in sync with the audio server.

pub mod controller;
pub mod display;
pub mod entry;
pub mod executor;
pub mod registry;
pub mod selection;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{ConnectionState, StreamController, UiInput};
pub use display::{ChannelDisplay, DisplayEvent, DisplaySink, NullDisplay, StreamRow};
pub use entry::StreamEntry;
pub use selection::Direction;
pub use session::{AudioSession, SessionError, SessionEvent};
