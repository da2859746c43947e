//! The main dashboard: one panel per horizon and the overall market line.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{Currency, Horizon, RateKey, Slot, Tone};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Number of samples drawn per sparkline.
const SPARKLINE_WIDTH: usize = 20;

/// Width of the rate label column.
const LABEL_WIDTH: usize = 16;

/// Rows needed by [`render`].
pub const HEIGHT: u16 = 13;

/// Text shown in place of the overall status once the worker is gone.
const STOPPED_TEXT: &str = "Monitor stopped";

/// Render both horizon panels and the overall status.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(5), // 1-day panel
        Constraint::Length(5), // 7-day panel
        Constraint::Length(3), // Overall
        Constraint::Min(0),
    ])
    .split(area);

    render_horizon(frame, app, Horizon::OneDay, chunks[0]);
    render_horizon(frame, app, Horizon::SevenDay, chunks[1]);
    render_overall(frame, app, chunks[2]);
}

fn render_horizon(frame: &mut Frame, app: &App, horizon: Horizon, area: Rect) {
    let stressed = app.board.horizon_stressed(horizon);
    let border = if stressed {
        app.theme.stressed
    } else {
        app.theme.border
    };

    let block = Block::default()
        .title(Span::styled(format!(" {} ", horizon.label()), app.theme.header))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(border))
        .style(app.theme.panel_style(stressed));

    let status = Slot::Status(horizon);
    let lines = vec![
        rate_line(app, RateKey::new(horizon, Currency::Domestic)),
        rate_line(app, RateKey::new(horizon, Currency::Foreign)),
        Line::from(Span::styled(
            app.board.text(status).to_string(),
            app.theme.tone_style(app.board.tone(status)),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// One rate: label, sparkline, window range and last change.
fn rate_line(app: &App, key: RateKey) -> Line<'static> {
    let slot = Slot::Rate(key);
    let label_style = if app.board.stale || app.board.stopped {
        app.theme.tone_style(Tone::Muted)
    } else {
        app.theme.tone_style(app.board.tone(slot))
    };
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut spans = vec![
        Span::styled(
            format!("{:<width$}", app.board.text(slot), width = LABEL_WIDTH),
            label_style,
        ),
        Span::raw(" "),
        Span::styled(render_sparkline(&app.history.sparkline(key)), dim),
    ];
    if let Some((low, high)) = app.history.range(key) {
        spans.push(Span::styled(format!("  {:.2}-{:.2}", low, high), dim));
    }
    if let Some(change) = app.history.change(key) {
        spans.push(Span::styled(format!("  {:+.2}", change), dim));
    }
    Line::from(spans)
}

fn render_overall(frame: &mut Frame, app: &App, area: Rect) {
    let (text, tone) = if app.board.stopped {
        (STOPPED_TEXT, Tone::Muted)
    } else {
        (app.board.text(Slot::Overall), app.board.tone(Slot::Overall))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        app.theme.tone_style(tone),
    )))
    .alignment(Alignment::Center)
    .block(block);

    frame.render_widget(paragraph, area);
}

fn render_sparkline(data: &[u8]) -> String {
    if data.is_empty() {
        return " ".repeat(SPARKLINE_WIDTH);
    }

    let skip = data.len().saturating_sub(SPARKLINE_WIDTH);
    let line: String = data[skip..]
        .iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect();
    format!("{:<width$}", line, width = SPARKLINE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_placeholder() {
        assert_eq!(render_sparkline(&[]), " ".repeat(SPARKLINE_WIDTH));
    }

    #[test]
    fn test_sparkline_keeps_latest_values() {
        let data: Vec<u8> = (0..30).map(|i| (i % 8) as u8).collect();
        let line = render_sparkline(&data);
        assert_eq!(line.chars().count(), SPARKLINE_WIDTH);
        assert_eq!(line.chars().last(), Some(SPARKLINE_CHARS[29 % 8]));
    }

    #[test]
    fn test_sparkline_pads_short_series() {
        let line = render_sparkline(&[0, 7]);
        assert!(line.starts_with("▁█"));
        assert_eq!(line.chars().count(), SPARKLINE_WIDTH);
    }
}
