// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Iced daemon implementation for the panel.

use crate::audio::{PulseRequest, PulseThread};
use crate::config::{self, AppConfig};
use crate::message::Message;
use crate::single_instance;
use crate::state::{PanelEffect, PanelState};
use crate::streams::{DisplayEvent, Direction, UiInput};
use crate::ui::{stream_row, IconCache};
use crate::ui::theme::{self, *};
use iced::keyboard::{self, key::Named, Key};
use iced::widget::{column, container, text, Column};
use iced::{event, window, Background, Element, Event, Fill, Point, Size, Subscription, Task, Theme};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info};

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Input(UiInput),
    Hide,
}

/// Map a key press to a panel action. `step` is the slider step for
/// `h`/`l`.
pub fn key_action(key: &Key, step: f64) -> Option<KeyAction> {
    let action = match key.as_ref() {
        Key::Named(Named::ArrowUp) | Key::Character("j") => {
            KeyAction::Input(UiInput::Navigate(Direction::Previous))
        }
        Key::Named(Named::ArrowDown) | Key::Character("k") => {
            KeyAction::Input(UiInput::Navigate(Direction::Next))
        }
        Key::Character("h") => KeyAction::Input(UiInput::StepActive(-step)),
        Key::Character("l") => KeyAction::Input(UiInput::StepActive(step)),
        Key::Character("m") | Key::Character("x") => KeyAction::Input(UiInput::ToggleMute),
        Key::Named(Named::Escape) | Key::Character("q") => KeyAction::Hide,
        _ => return None,
    };
    Some(action)
}

/// Main application state.
pub struct AppVol {
    config: AppConfig,
    panel: PanelState,
    /// The panel window, while it is open.
    window: Option<window::Id>,
    pulse_thread: Option<PulseThread>,
    display_rx: mpsc::Receiver<DisplayEvent>,
    icons: IconCache,
}

impl AppVol {
    /// Create the application and open the panel.
    pub fn new() -> (Self, Task<Message>) {
        let config = config::load_or_default();
        let (display_tx, display_rx) = mpsc::channel();

        let pulse_thread = match PulseThread::spawn(display_tx, config.session.clone()) {
            Ok(thread) => {
                info!("PulseAudio thread started");
                single_instance::start_command_listener(thread.sender());
                Some(thread)
            }
            Err(e) => {
                error!("Failed to start PulseAudio thread: {}", e);
                None
            }
        };

        let mut app = Self {
            config,
            panel: PanelState::new(),
            window: None,
            pulse_thread,
            display_rx,
            icons: IconCache::new(),
        };
        if app.pulse_thread.is_none() {
            app.panel.session_error = Some("Audio session could not be started".to_string());
        }

        let open = app.open_window();
        (app, open)
    }

    pub fn title(&self, _window: window::Id) -> String {
        "appvol".to_string()
    }

    /// Handle messages.
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => self.poll_display_events(),
            Message::KeyPressed(key) => {
                match key_action(&key, self.config.controls.slider_step) {
                    Some(KeyAction::Input(input)) => self.send_input(input),
                    Some(KeyAction::Hide) => return self.hide_window(),
                    None => {}
                }
                Task::none()
            }
            Message::SliderMoved(index, fraction) => {
                if !self.panel.accept_slider(index, fraction) {
                    return Task::none();
                }
                self.panel.set_fraction(index, fraction);
                self.send_input(UiInput::SliderMoved {
                    index,
                    fraction: f64::from(fraction),
                });
                Task::none()
            }
            Message::WindowOpened(id) => {
                debug!("Panel window {:?} opened", id);
                window::monitor_size(id).map(move |size| Message::MonitorSize(id, size))
            }
            Message::MonitorSize(id, Some(monitor)) => {
                let width = self.config.window.width as f32;
                let x = ((monitor.width - width) / 2.0).max(0.0);
                let y = self.config.window.top_offset as f32;
                window::move_to(id, Point::new(x, y))
            }
            Message::MonitorSize(_, None) => Task::none(),
            Message::WindowUnfocused(id) => {
                if self.window == Some(id) && self.config.window.hide_on_focus_loss {
                    return self.hide_window();
                }
                Task::none()
            }
            Message::WindowClosed(id) => {
                if self.window == Some(id) {
                    debug!("Panel window closed");
                    self.window = None;
                }
                Task::none()
            }
        }
    }

    /// Render the panel.
    pub fn view(&self, _window: window::Id) -> Element<'_, Message> {
        let mut rows: Column<Message> = column![].spacing(SPACING / 2.0);

        if let Some(err) = &self.panel.session_error {
            rows = rows.push(text(err.as_str()).size(13).color(MUTED_COLOR));
        }

        if self.panel.rows.is_empty() {
            rows = rows.push(
                container(text("No applications are playing audio").size(13).color(TEXT_DIM))
                    .center_x(Fill)
                    .center_y(ROW_HEIGHT),
            );
        } else {
            for stream in &self.panel.rows {
                let highlighted = self.panel.is_highlighted(stream.index);
                let icon = self.icons.get(&stream.icon_hint);
                rows = rows.push(stream_row(stream, highlighted, icon));
            }
        }

        container(rows)
            .padding(PADDING)
            .width(Fill)
            .height(Fill)
            .style(|_theme| container::Style {
                background: Some(Background::Color(BACKGROUND)),
                ..container::Style::default()
            })
            .into()
    }

    pub fn theme(&self, _window: window::Id) -> Theme {
        theme::appvol_theme()
    }

    /// Subscription for external events.
    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            // Tick every 50ms to poll the PulseAudio thread
            iced::time::every(Duration::from_millis(50)).map(|_| Message::Tick),
            event::listen_with(|event, _status, id| match event {
                Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => {
                    Some(Message::KeyPressed(key))
                }
                Event::Window(window::Event::Unfocused) => Some(Message::WindowUnfocused(id)),
                _ => None,
            }),
            window::close_events().map(Message::WindowClosed),
        ])
    }

    fn window_size(&self) -> Size {
        let rows = self.panel.rows.len().max(1) + usize::from(self.panel.session_error.is_some());
        let height = rows as f32 * (ROW_HEIGHT + SPACING / 2.0) + 2.0 * PADDING;
        Size::new(self.config.window.width as f32, height)
    }

    fn open_window(&mut self) -> Task<Message> {
        if let Some(id) = self.window {
            return window::gain_focus(id);
        }

        let settings = window::Settings {
            size: self.window_size(),
            position: window::Position::Centered,
            resizable: false,
            decorations: false,
            level: if self.config.window.keep_above {
                window::Level::AlwaysOnTop
            } else {
                window::Level::Normal
            },
            ..window::Settings::default()
        };

        let (id, open) = window::open(settings);
        self.window = Some(id);
        open.map(Message::WindowOpened)
    }

    fn hide_window(&mut self) -> Task<Message> {
        match self.window.take() {
            Some(id) => window::close(id),
            None => Task::none(),
        }
    }

    fn send_input(&self, input: UiInput) {
        if let Some(ref thread) = self.pulse_thread {
            if let Err(e) = thread.send(PulseRequest::Input(input)) {
                error!("Failed to send input to PulseAudio thread: {}", e);
            }
        }
    }

    /// Apply pending display events from the PulseAudio thread.
    fn poll_display_events(&mut self) -> Task<Message> {
        // Collect events first to avoid borrow conflict
        let events: Vec<DisplayEvent> = self.display_rx.try_iter().collect();

        let mut resize = false;
        let mut show = false;
        for event in events {
            if let DisplayEvent::Created(row) | DisplayEvent::Updated(row) = &event {
                self.icons.resolve(&row.icon_hint);
            }
            match self.panel.apply(event) {
                PanelEffect::Resize => resize = true,
                PanelEffect::Show => show = true,
                PanelEffect::None => {}
            }
        }

        if show {
            return self.open_window();
        }
        match self.window {
            Some(id) if resize => window::resize(id, self.window_size()),
            _ => Task::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(c: &str) -> Key {
        Key::Character(c.into())
    }

    #[test]
    fn test_navigation_keys() {
        let previous = Some(KeyAction::Input(UiInput::Navigate(Direction::Previous)));
        let next = Some(KeyAction::Input(UiInput::Navigate(Direction::Next)));

        assert_eq!(key_action(&Key::Named(Named::ArrowUp), 0.1), previous);
        assert_eq!(key_action(&character("j"), 0.1), previous);
        assert_eq!(key_action(&Key::Named(Named::ArrowDown), 0.1), next);
        assert_eq!(key_action(&character("k"), 0.1), next);
    }

    #[test]
    fn test_volume_and_mute_keys() {
        assert_eq!(
            key_action(&character("h"), 0.05),
            Some(KeyAction::Input(UiInput::StepActive(-0.05)))
        );
        assert_eq!(
            key_action(&character("l"), 0.05),
            Some(KeyAction::Input(UiInput::StepActive(0.05)))
        );
        assert_eq!(
            key_action(&character("x"), 0.1),
            Some(KeyAction::Input(UiInput::ToggleMute))
        );
        assert_eq!(
            key_action(&character("m"), 0.1),
            Some(KeyAction::Input(UiInput::ToggleMute))
        );
    }

    #[test]
    fn test_hide_and_unbound_keys() {
        assert_eq!(key_action(&Key::Named(Named::Escape), 0.1), Some(KeyAction::Hide));
        assert_eq!(key_action(&character("q"), 0.1), Some(KeyAction::Hide));
        assert_eq!(key_action(&character("z"), 0.1), None);
        assert_eq!(key_action(&Key::Named(Named::Enter), 0.1), None);
    }
}
