//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::Tone;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color of domestic-currency rates.
    pub domestic: Color,
    /// Color of foreign-currency rates.
    pub foreign: Color,
    /// Color for a calm status.
    pub ok: Color,
    /// Color for a stressed status.
    pub stressed: Color,
    /// Color for placeholder and stale text.
    pub muted: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Panel background while its horizon is stressed.
    pub stress_panel_bg: Color,
    /// Screen background while the market is stressed.
    pub stress_screen_bg: Color,
    /// Style for panel titles.
    pub header: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            domestic: Color::Cyan,
            foreign: Color::Rgb(255, 165, 0),
            ok: Color::LightGreen,
            stressed: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            stress_panel_bg: Color::Rgb(0x2b, 0x00, 0x00),
            stress_screen_bg: Color::Rgb(0x22, 0x00, 0x00),
            header: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            domestic: Color::Blue,
            foreign: Color::Rgb(200, 100, 0),
            ok: Color::Green,
            stressed: Color::Red,
            muted: Color::Gray,
            border: Color::DarkGray,
            stress_panel_bg: Color::Rgb(0xff, 0xd6, 0xd6),
            stress_screen_bg: Color::Rgb(0xff, 0xe8, 0xe8),
            header: Style::default().fg(Color::Black).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a cell tone
    pub fn tone_style(&self, tone: Tone) -> Style {
        match tone {
            Tone::Neutral => Style::default(),
            Tone::Domestic => Style::default().fg(self.domestic).add_modifier(Modifier::BOLD),
            Tone::Foreign => Style::default().fg(self.foreign).add_modifier(Modifier::BOLD),
            Tone::Ok => Style::default().fg(self.ok),
            Tone::Stressed => Style::default().fg(self.stressed).add_modifier(Modifier::BOLD),
            Tone::Muted => Style::default().fg(self.muted),
        }
    }

    /// Background for a panel, tinted when stressed.
    pub fn panel_style(&self, stressed: bool) -> Style {
        if stressed {
            Style::default().bg(self.stress_panel_bg)
        } else {
            Style::default()
        }
    }

    /// Background for the whole screen, tinted when the market is stressed.
    pub fn screen_style(&self, stressed: bool) -> Style {
        if stressed {
            Style::default().bg(self.stress_screen_bg)
        } else {
            Style::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stressed_tone_is_bold_red() {
        let theme = Theme::dark();
        let style = theme.tone_style(Tone::Stressed);
        assert_eq!(style.fg, Some(Color::Red));
        assert!(style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_panel_tint_only_when_stressed() {
        let theme = Theme::light();
        assert_eq!(theme.panel_style(false).bg, None);
        assert_eq!(theme.panel_style(true).bg, Some(theme.stress_panel_bg));
    }
}
