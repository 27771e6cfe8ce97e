// SPDX-License-Identifier: GPL-3.0-only

//! Terminal camera viewer
//!
//! Draws the live preview, grid and shutter overlay, error panel and device
//! picker for a [`CaptureSessionController`]. All capture changes go through
//! controller commands; the UI only reads published state.

use crate::app::device_picker::DevicePicker;
use crate::app::error_panel::ErrorPanel;
use crate::app::overlay::{GridOverlay, ShutterButton};
use crate::app::preview::{PreviewWidget, fit_frame};
use crate::app::{PresentationAction, Screen};
use crate::config::Config;
use crate::constants::ui;
use crate::session::{CaptureSessionController, CaptureStatus};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Instant;
use tracing::{error, info};

/// Run the terminal viewer until the user quits
pub fn run(
    controller: &CaptureSessionController,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, controller, config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Transient status bar message
struct Notice {
    text: String,
    shown_at: Instant,
}

/// UI-only state
struct ViewState {
    picker: DevicePicker,
    message: Option<Notice>,
    last_status: CaptureStatus,
}

impl ViewState {
    fn new() -> Self {
        Self {
            picker: DevicePicker::default(),
            message: None,
            last_status: CaptureStatus::default(),
        }
    }

    fn notify(&mut self, text: impl Into<String>) {
        self.message = Some(Notice {
            text: text.into(),
            shown_at: Instant::now(),
        });
    }

    /// Drop the message once the status moves on or it has been up long enough
    fn expire_message(&mut self, status: CaptureStatus, now: Instant) {
        let status_changed = status != self.last_status;
        self.last_status = status;
        let timed_out = self
            .message
            .as_ref()
            .is_some_and(|notice| now.duration_since(notice.shown_at) >= ui::MESSAGE_TIMEOUT);
        if status_changed || timed_out {
            self.message = None;
        }
    }
}

enum KeyOutcome {
    Continue,
    Quit,
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &CaptureSessionController,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.check_permission();

    let mut view = ViewState::new();

    loop {
        let status = controller.status();
        view.expire_message(status, Instant::now());
        let screen = Screen::for_status(status);

        terminal.draw(|f| draw(f, controller, config, &screen, &mut view))?;

        if event::poll(ui::POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let KeyOutcome::Quit = handle_key(key, controller, config, &screen, &mut view)
        {
            break;
        }
    }

    controller.stop();
    Ok(())
}

fn handle_key(
    key: KeyEvent,
    controller: &CaptureSessionController,
    config: &Config,
    screen: &Screen,
    view: &mut ViewState,
) -> KeyOutcome {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyOutcome::Quit;
    }

    if view.picker.is_open() {
        let devices = controller.available_input_devices();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => view.picker.previous(devices.len()),
            KeyCode::Down | KeyCode::Char('j') => view.picker.next(devices.len()),
            KeyCode::Enter => {
                if let Some(device) = view.picker.confirm(&devices) {
                    info!(device = %device.unique_id, "Switching camera from picker");
                    view.notify(format!("Switching to {}", device.display_name));
                    controller.switch_input(device);
                }
            }
            KeyCode::Esc | KeyCode::Char('d') => view.picker.close(),
            _ => {}
        }
        return KeyOutcome::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return KeyOutcome::Quit,
        KeyCode::Char('d') => {
            let devices = controller.available_input_devices();
            let current = controller.current_input();
            view.picker.open(&devices, current.as_ref());
        }
        KeyCode::Char('r') => {
            view.notify("Retrying camera setup");
            controller.check_permission();
        }
        KeyCode::Char('o') if screen.action() == Some(PresentationAction::OpenSettings) => {
            match open::that(&config.settings_uri) {
                Ok(()) => view.notify(format!("Opened {}", config.settings_uri)),
                Err(e) => {
                    error!(error = %e, uri = %config.settings_uri, "Failed to open settings");
                    view.notify(format!("Error: {}", e));
                }
            }
        }
        _ => {}
    }
    KeyOutcome::Continue
}

fn draw(
    f: &mut Frame,
    controller: &CaptureSessionController,
    config: &Config,
    screen: &Screen,
    view: &mut ViewState,
) {
    let area = f.area();

    // Reserve bottom line for status
    let main_area = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let status_area = Rect {
        y: area.bottom().saturating_sub(1),
        height: area.height.min(1),
        ..area
    };

    match screen {
        Screen::Connecting => {
            let msg = "Connecting to camera...";
            let x = main_area.x + main_area.width.saturating_sub(msg.len() as u16) / 2;
            let y = main_area.y + main_area.height / 2;
            f.buffer_mut().set_string(x, y, msg, Style::default());
        }
        Screen::Preview => {
            let frame = controller.preview().and_then(|p| p.latest());
            f.render_widget(
                PreviewWidget {
                    frame: frame.as_ref(),
                    mirror: config.mirror_preview,
                },
                main_area,
            );
            // Overlay follows the picture, not the whole screen
            let overlay_area = frame
                .as_ref()
                .map(|fr| fit_frame(main_area, fr.width, fr.height))
                .filter(|r| r.area() > 0)
                .unwrap_or(main_area);
            if config.show_grid {
                f.render_widget(GridOverlay, overlay_area);
            }
            f.render_widget(ShutterButton, overlay_area);
        }
        Screen::Error { info, action, .. } => {
            f.render_widget(
                ErrorPanel {
                    info: *info,
                    action: *action,
                },
                main_area,
            );
        }
    }

    if view.picker.is_open() {
        let devices = controller.available_input_devices();
        let current = controller.current_input();
        view.picker
            .render(main_area, f.buffer_mut(), &devices, current.as_ref());
    }

    let message = view
        .message
        .as_ref()
        .map(|notice| notice.text.clone())
        .unwrap_or_else(|| build_status_message(controller, screen));
    f.render_widget(StatusBar { message: &message }, status_area);
}

fn build_status_message(controller: &CaptureSessionController, screen: &Screen) -> String {
    let mut msg = match controller.current_input() {
        Some(device) => format!("{} | ", device.display_name),
        None => String::new(),
    };
    msg.push_str("'d' devices | 'r' retry");
    if screen.action().is_some() {
        msg.push_str(" | 'o' settings");
    }
    msg.push_str(" | 'q' quit");
    msg
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);

        // Fill background
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bar_truncates_to_width() {
        let area = Rect::new(0, 0, 5, 1);
        let mut buf = Buffer::empty(area);
        StatusBar {
            message: "abcdefgh",
        }
        .render(area, &mut buf);
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert_eq!(text, "abcde");
    }

    #[test]
    fn message_clears_on_status_change() {
        let mut view = ViewState::new();
        view.notify("Retrying camera setup");

        let now = Instant::now();
        view.expire_message(CaptureStatus::Unconfigured, now);
        assert!(view.message.is_some(), "Same status keeps the message");

        view.expire_message(CaptureStatus::Configured, now);
        assert!(view.message.is_none());
    }

    #[test]
    fn message_clears_after_timeout() {
        let mut view = ViewState::new();
        view.notify("Switching to Back Dual Camera");
        let shown_at = view.message.as_ref().map(|n| n.shown_at).unwrap();

        view.expire_message(CaptureStatus::Unconfigured, shown_at + ui::MESSAGE_TIMEOUT);
        assert!(view.message.is_none());
    }
}
