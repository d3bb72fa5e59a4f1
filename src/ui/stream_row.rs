// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One panel row: icon, label, volume slider and mute marker.

use crate::message::Message;
use crate::streams::StreamRow;
use crate::ui::theme::{self, *};
use iced::widget::{container, image, row, slider, text, Space};
use iced::{Alignment, Background, Border, Color, Element, Fill, Theme};

/// Render one stream row. Without an icon the icon slot stays empty so
/// labels line up.
pub fn stream_row<'a>(
    stream: &'a StreamRow,
    highlighted: bool,
    icon: Option<&image::Handle>,
) -> Element<'a, Message> {
    let index = stream.index;
    let muted = stream.muted;

    let icon: Element<'a, Message> = match icon {
        Some(handle) => image(handle.clone())
            .width(ICON_SIZE)
            .height(ICON_SIZE)
            .into(),
        None => Space::new().width(ICON_SIZE).height(ICON_SIZE).into(),
    };

    let label = text(theme::ellipsize(&stream.label, LABEL_MAX_CHARS))
        .size(14)
        .color(if highlighted { TEXT } else { TEXT_DIM })
        .width(LABEL_COLUMN_WIDTH);

    let volume_slider = slider(0.0..=1.0, stream.fraction, move |v| {
        Message::SliderMoved(index, v)
    })
    .step(0.01)
    .width(Fill)
    .style(move |_theme: &Theme, _status| slider::Style {
        rail: slider::Rail {
            backgrounds: (
                Background::Color(if muted { MUTED_COLOR } else { SLIDER_FILL }),
                Background::Color(SLIDER_TRACK),
            ),
            width: 6.0,
            border: Border::default().rounded(3.0),
        },
        handle: slider::Handle {
            shape: slider::HandleShape::Circle { radius: 7.0 },
            background: Background::Color(if highlighted { PRIMARY } else { TEXT }),
            border_width: 0.0,
            border_color: Color::TRANSPARENT,
        },
    });

    let level = if muted {
        text("muted").size(12).color(MUTED_COLOR)
    } else {
        text(theme::format_percent(stream.fraction))
            .size(12)
            .color(TEXT_DIM)
    };

    let content = row![icon, label, volume_slider, container(level).width(50)]
        .spacing(SPACING)
        .align_y(Alignment::Center);

    container(content)
        .padding([6, 10])
        .width(Fill)
        .center_y(ROW_HEIGHT)
        .style(move |_theme| container::Style {
            background: Some(Background::Color(SURFACE)),
            border: row_border(highlighted),
            ..container::Style::default()
        })
        .into()
}
