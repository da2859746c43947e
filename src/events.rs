use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// File written by the export key.
pub const EXPORT_FILE: &str = "rate_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    // Raw mode swallows SIGINT
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('r') => app.request_refresh(),
        KeyCode::Char('m') => app.toggle_mute(),
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::{watch, Notify};

    use super::*;
    use crate::alert::AlertConfig;
    use crate::data::{Board, CurrencyCodes, Thresholds};
    use crate::ui::Theme;

    fn app() -> App {
        let (_tx, rx) = watch::channel(Board::new(&CurrencyCodes::default()));
        App::new(
            rx,
            Arc::new(Notify::new()),
            Thresholds::default(),
            AlertConfig::default(),
            "test",
            Theme::dark(),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_quit_keys() {
        let mut a = app();
        press(&mut a, KeyCode::Char('q'));
        assert!(!a.running);

        let mut a = app();
        handle_key_event(
            &mut a,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(!a.running);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut a = app();
        press(&mut a, KeyCode::Char('?'));
        assert!(a.show_help);

        // 'q' only closes the overlay
        press(&mut a, KeyCode::Char('q'));
        assert!(!a.show_help);
        assert!(a.running);
    }

    #[test]
    fn test_mute_toggle() {
        let mut a = app();
        press(&mut a, KeyCode::Char('m'));
        assert!(a.muted);
        press(&mut a, KeyCode::Char('m'));
        assert!(!a.muted);
    }

    #[test]
    fn test_refresh_on_stopped_worker() {
        // The sender in app() is already dropped
        let mut a = app();
        a.poll_board();
        press(&mut a, KeyCode::Char('r'));
        assert_eq!(
            a.get_status_message(),
            Some("Worker stopped, cannot refresh")
        );
    }

    #[test]
    fn test_export_without_data_reports_failure() {
        let mut a = app();
        press(&mut a, KeyCode::Char('e'));
        assert_eq!(
            a.get_status_message(),
            Some("Export failed: No data to export")
        );
    }
}
