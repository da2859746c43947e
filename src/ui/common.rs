//! Common UI components.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::{Slot, Tone};

/// Render the header bar.
///
/// Displays: overall state dot, thresholds, page source and mute state.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let board = &app.board;
    let dot_tone = if board.stopped || board.stale {
        Tone::Muted
    } else {
        board.tone(Slot::Overall)
    };

    let mut spans = vec![
        Span::styled(" ● ", app.theme.tone_style(dot_tone)),
        Span::styled("RATE ALARM ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            format!("dom ≥ {:.2} %", app.thresholds.domestic),
            app.theme.tone_style(Tone::Domestic),
        ),
        Span::raw("  "),
        Span::styled(
            format!("fx ≥ {:.2} %", app.thresholds.foreign),
            app.theme.tone_style(Tone::Foreign),
        ),
        Span::raw(" │ "),
        Span::styled(
            app.source_description().to_string(),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ];
    if app.muted {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            "MUTED",
            Style::default().fg(app.theme.stressed).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Text of the status bar when no temporary message is showing.
pub fn status_text(app: &App) -> String {
    let board = &app.board;
    if board.stopped {
        return " Worker stopped | q:quit".to_string();
    }

    let updated = match board.sample_age() {
        Some(age) => format!("Updated {} ago", format_duration(age)),
        None => "Waiting for first sample".to_string(),
    };
    let next = board
        .next_refresh_in()
        .map(|d| format!(" | next in {}", format_duration(d)))
        .unwrap_or_default();
    let failures = if board.consecutive_failures > 0 {
        let err = board.last_error.as_deref().unwrap_or("unknown error");
        format!(" | {} failed: {}", board.consecutive_failures, err)
    } else {
        String::new()
    };

    format!(
        " {}{}{} | r:refresh m:mute e:export ?:help q:quit",
        updated, next, failures
    )
}

/// Render the status bar at the bottom.
///
/// Shows: time since last sample, next refresh, failures, available controls.
/// Also displays temporary status messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let style = if app.board.consecutive_failures > 0 || app.board.stopped {
        Style::default().fg(app.theme.stressed)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    frame.render_widget(Paragraph::new(status_text(app)).style(style), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from("  r         Refresh now"),
        Line::from("  m         Mute/unmute alerts"),
        Line::from("  e         Export to JSON"),
        Line::from("  ?         Toggle help"),
        Line::from("  q  Esc    Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Thresholds",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(format!(
            "  Stress when domestic ≥ {:.2} %",
            app.thresholds.domestic
        )),
        Line::from(format!(
            "  or foreign ≥ {:.2} %",
            app.thresholds.foreign
        )),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 40u16.min(area.width.saturating_sub(4));
    let help_height = 15u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::{watch, Notify};

    use super::*;
    use crate::alert::AlertConfig;
    use crate::data::{Board, CurrencyCodes, Thresholds};
    use crate::ui::Theme;

    fn app() -> (App, watch::Sender<Board>) {
        let (tx, rx) = watch::channel(Board::new(&CurrencyCodes::default()));
        let app = App::new(
            rx,
            Arc::new(Notify::new()),
            Thresholds::default(),
            AlertConfig::default(),
            "test",
            Theme::dark(),
        );
        (app, tx)
    }

    #[test]
    fn test_status_before_first_sample() {
        let (app, _tx) = app();
        let text = status_text(&app);
        assert!(text.starts_with(" Waiting for first sample"));
        assert!(text.ends_with("q:quit"));
    }

    #[test]
    fn test_status_shows_failures() {
        let (mut app, tx) = app();
        tx.send_modify(|b| {
            b.consecutive_failures = 3;
            b.last_error = Some("Request timed out".to_string());
        });
        app.poll_board();
        assert!(status_text(&app).contains("3 failed: Request timed out"));
    }

    #[test]
    fn test_status_when_stopped() {
        let (mut app, tx) = app();
        drop(tx);
        app.poll_board();
        assert_eq!(status_text(&app), " Worker stopped | q:quit");
    }
}
