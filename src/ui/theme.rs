// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Theme constants and styling for the panel.

use iced::theme::Palette;
use iced::{Border, Color, Theme};

// ============================================================================
// Color Constants (Dark Theme)
// ============================================================================

/// Main background color.
pub const BACKGROUND: Color = Color::from_rgb(0.12, 0.12, 0.14);

/// Surface color for rows.
pub const SURFACE: Color = Color::from_rgb(0.18, 0.18, 0.20);

/// Lighter surface for borders.
pub const SURFACE_LIGHT: Color = Color::from_rgb(0.24, 0.24, 0.26);

/// Primary accent color (blue), used for the active row.
pub const PRIMARY: Color = Color::from_rgb(0.40, 0.65, 0.95);

/// Main text color.
pub const TEXT: Color = Color::from_rgb(0.90, 0.90, 0.92);

/// Dimmed text color.
pub const TEXT_DIM: Color = Color::from_rgb(0.60, 0.60, 0.65);

/// Muted/error indicator (red).
pub const MUTED_COLOR: Color = Color::from_rgb(0.85, 0.30, 0.30);

/// Success indicator (green).
pub const SUCCESS: Color = Color::from_rgb(0.40, 0.75, 0.40);

/// Warning indicator (yellow).
pub const WARNING: Color = Color::from_rgb(0.90, 0.75, 0.20);

/// Slider track background.
pub const SLIDER_TRACK: Color = Color::from_rgb(0.30, 0.30, 0.32);

/// Slider fill color.
pub const SLIDER_FILL: Color = Color::from_rgb(0.40, 0.75, 0.40);

// ============================================================================
// Theme Palette
// ============================================================================

pub const THEME_PALETTE: Palette = Palette {
    background: BACKGROUND,
    text: TEXT,
    primary: PRIMARY,
    success: SUCCESS,
    danger: MUTED_COLOR,
    warning: WARNING,
};

pub fn appvol_theme() -> Theme {
    Theme::custom("AppVol Dark".to_string(), THEME_PALETTE)
}

// ============================================================================
// Style Helpers
// ============================================================================

pub const BORDER_RADIUS: f32 = 6.0;

pub const SPACING: f32 = 10.0;

pub const PADDING: f32 = 10.0;

/// Height of one stream row, padding included.
pub const ROW_HEIGHT: f32 = 44.0;

/// Application icon edge length.
pub const ICON_SIZE: f32 = 24.0;

/// Width reserved for the label column.
pub const LABEL_COLUMN_WIDTH: f32 = 200.0;

/// Longest label shown before it is cut with an ellipsis.
pub const LABEL_MAX_CHARS: usize = 28;

/// Row border; the active row gets an accent outline.
pub fn row_border(highlighted: bool) -> Border {
    let border = Border::default().rounded(BORDER_RADIUS);
    if highlighted {
        border.color(PRIMARY).width(2.0)
    } else {
        border.color(SURFACE_LIGHT).width(1.0)
    }
}

/// Format a slider fraction as a percentage.
pub fn format_percent(fraction: f32) -> String {
    format!("{:.0}%", fraction.clamp(0.0, 1.0) * 100.0)
}

/// Cut `label` to `max_chars` characters, ending in an ellipsis if cut.
pub fn ellipsize(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.5), "50%");
        assert_eq!(format_percent(1.3), "100%");
        assert_eq!(format_percent(0.0), "0%");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("mpv", 10), "mpv");
        assert_eq!(ellipsize("Firefox Developer Edition", 8), "Firefox…");
        assert_eq!(ellipsize("ééééé", 3).chars().count(), 3);
    }
}
