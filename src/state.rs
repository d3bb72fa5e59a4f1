// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Panel state on the UI thread.
//!
//! A mirror of the registry built from [`DisplayEvent`]s. The audio thread
//! owns the real registry; this copy only exists to render it.

use crate::audio::types::StreamIndex;
use crate::streams::{DisplayEvent, StreamRow};
use tracing::{debug, trace};

/// Slider values closer than this to an echoed row are the same value.
const ECHO_TOLERANCE: f32 = 1e-3;

/// What the shell has to do after applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEffect {
    None,
    /// The number of rows changed.
    Resize,
    /// Another invocation asked for the panel.
    Show,
}

#[derive(Debug, Default)]
pub struct PanelState {
    /// Rows in registry order.
    pub rows: Vec<StreamRow>,
    pub highlighted: Option<StreamIndex>,
    /// Set once the audio session has ended for good.
    pub session_error: Option<String>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: DisplayEvent) -> PanelEffect {
        match event {
            DisplayEvent::Created(row) => {
                // Indices are unique in the registry; replace rather than
                // duplicate if a row somehow survived.
                match self.position(row.index) {
                    Some(position) => self.rows[position] = row,
                    None => self.rows.push(row),
                }
                PanelEffect::Resize
            }
            DisplayEvent::Updated(row) => {
                if let Some(position) = self.position(row.index) {
                    self.rows[position] = row;
                }
                PanelEffect::None
            }
            DisplayEvent::Removed(index) => {
                self.rows.retain(|r| r.index != index);
                if self.highlighted == Some(index) {
                    self.highlighted = None;
                }
                PanelEffect::Resize
            }
            DisplayEvent::Highlight { new, .. } => {
                self.highlighted = new;
                PanelEffect::None
            }
            DisplayEvent::ShowRequested => PanelEffect::Show,
            DisplayEvent::SessionEnded(reason) => {
                debug!("Audio session ended: {}", reason);
                self.session_error = Some(reason);
                PanelEffect::Resize
            }
        }
    }

    /// Whether a slider value for `index` is a user edit.
    ///
    /// A value that repeats the row's echoed fraction is dropped; anything
    /// else is accepted and ends the echo.
    pub fn accept_slider(&mut self, index: StreamIndex, fraction: f32) -> bool {
        let Some(position) = self.position(index) else {
            return false;
        };
        let row = &mut self.rows[position];
        if row.echo && (row.fraction - fraction).abs() < ECHO_TOLERANCE {
            trace!("Dropping echoed slider value {} for stream {}", fraction, index);
            return false;
        }
        row.echo = false;
        true
    }

    /// Move a slider locally ahead of the server's confirmation.
    pub fn set_fraction(&mut self, index: StreamIndex, fraction: f32) {
        if let Some(position) = self.position(index) {
            let row = &mut self.rows[position];
            row.fraction = fraction.clamp(0.0, 1.0);
            row.muted = row.fraction <= 0.0;
        }
    }

    pub fn is_highlighted(&self, index: StreamIndex) -> bool {
        self.highlighted == Some(index)
    }

    fn position(&self, index: StreamIndex) -> Option<usize> {
        self.rows.iter().position(|r| r.index == index)
    }
}
