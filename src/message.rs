// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Message types for the panel.

use crate::audio::types::StreamIndex;
use iced::keyboard::Key;
use iced::{window, Size};

/// All messages in the application.
#[derive(Debug, Clone)]
pub enum Message {
    /// Poll the PulseAudio thread for display events.
    Tick,
    /// A key was pressed while the panel had focus.
    KeyPressed(Key),
    /// A stream slider moved (index, fraction).
    SliderMoved(StreamIndex, f32),

    /// The panel window finished opening.
    WindowOpened(window::Id),
    /// Monitor size became known for placing the window.
    MonitorSize(window::Id, Option<Size>),
    /// The panel lost keyboard focus.
    WindowUnfocused(window::Id),
    /// The panel window was closed.
    WindowClosed(window::Id),
}
