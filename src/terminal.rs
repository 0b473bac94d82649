// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based point cloud viewer
//!
//! Renders the point cloud offscreen and draws the readback to the terminal
//! using Unicode half-block characters for improved vertical resolution.
//! Mouse drags orbit the view.

use crate::backends::StreamAcquisition;
use crate::config::Config;
use crate::errors::RenderError;
use crate::constants::terminal::{CELL_HEIGHT_PIXELS, CELL_WIDTH_PIXELS};
use crate::renderer::{FrameOutcome, SessionStatus, ViewerSession};
use crate::shaders::{PointCloudProcessor, RenderedFrame};
use crate::snapshot;
use crate::view::PointerEvent;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use glam::Vec2;
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{error, info};

/// Run the terminal point cloud viewer
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let processor = pollster::block_on(PointCloudProcessor::new(config.clear_color))?;
    let acquisition = StreamAcquisition::spawn(runtime.handle(), config.source.clone());
    let mut session = ViewerSession::new(processor, acquisition);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut session, config.frame_interval());

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

/// Key presses the viewer reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Quit,
    Snapshot,
    ToggleHelp,
}

fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Quit)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Char('s') => Some(KeyAction::Snapshot),
        KeyCode::Char('h') => Some(KeyAction::ToggleHelp),
        _ => None,
    }
}

/// Map a terminal mouse event to a pointer event in approximate pixels
fn pointer_event(mouse: MouseEvent) -> Option<PointerEvent> {
    let position = Vec2::new(
        mouse.column as f32 * CELL_WIDTH_PIXELS,
        mouse.row as f32 * CELL_HEIGHT_PIXELS,
    );
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerEvent::Down(position)),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(PointerEvent::Move(position))
        }
        MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::Up(position)),
        _ => None,
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut ViewerSession<PointCloudProcessor>,
    frame_interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frame_widget = FrameWidget::new();
    let mut show_help = false;
    let mut notices = Notices::default();

    loop {
        let outcome = session.tick();
        if let Err(e) = &outcome {
            error!(error = %e, "Render iteration failed");
        }
        notices.record_tick(&outcome);

        match pollster::block_on(session.renderer().target().read_frame()) {
            Ok(frame) => frame_widget.frame = frame,
            Err(e) => error!(error = %e, "Readback failed"),
        }
        frame_widget.placeholder = placeholder_message(session.status());

        let status_message = if show_help {
            build_help_message()
        } else {
            notices
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| build_status_message(session))
        };

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let view_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            f.render_widget(&frame_widget, view_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };

            let status = StatusBar {
                message: &status_message,
            };
            f.render_widget(status, status_area);
        })?;

        // Handle input with timeout for frame updates, then drain the rest
        let mut timeout = frame_interval;
        while event::poll(timeout)? {
            timeout = Duration::ZERO;
            match event::read()? {
                Event::Key(key) => match key_action(key) {
                    Some(KeyAction::Quit) => return Ok(()),
                    Some(KeyAction::Snapshot) => {
                        show_help = false;
                        notices.action = Some(save_snapshot(frame_widget.frame.as_ref()));
                    }
                    Some(KeyAction::ToggleHelp) => {
                        show_help = !show_help;
                        notices.action = None;
                    }
                    None => {}
                },
                Event::Mouse(mouse) => {
                    if let Some(pointer) = pointer_event(mouse) {
                        session.handle_pointer(pointer);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Messages that override the status line
///
/// A key action's message stays until the next action. A render error stays
/// until a later tick draws a frame.
#[derive(Debug, Default)]
struct Notices {
    action: Option<String>,
    render_error: Option<String>,
}

impl Notices {
    fn record_tick(&mut self, outcome: &Result<FrameOutcome, RenderError>) {
        match outcome {
            Ok(FrameOutcome::Drawn { .. }) => self.render_error = None,
            Ok(FrameOutcome::UploadFailed(e)) | Err(e) => {
                self.render_error = Some(format!("Error: {}", e));
            }
            Ok(FrameOutcome::Cleared) => {}
        }
    }

    fn message(&self) -> Option<&str> {
        self.action.as_deref().or(self.render_error.as_deref())
    }
}

fn save_snapshot(frame: Option<&RenderedFrame>) -> String {
    let Some(frame) = frame else {
        return "Nothing rendered yet".to_string();
    };
    let path = snapshot::timestamped_path(&snapshot::default_snapshot_dir());
    match snapshot::save_png(frame, &path) {
        Ok(()) => {
            info!(path = %path.display(), "Snapshot taken");
            format!("Saved: {}", path.display())
        }
        Err(e) => {
            error!("Failed to save snapshot: {}", e);
            format!("Error: {}", e)
        }
    }
}

fn placeholder_message(status: &SessionStatus) -> String {
    match status {
        SessionStatus::Waiting => "Waiting for camera...".to_string(),
        SessionStatus::Streaming { .. } => "Waiting for frames...".to_string(),
        SessionStatus::Failed(msg) => format!("No camera: {}", msg),
    }
}

fn build_status_message(session: &ViewerSession<PointCloudProcessor>) -> String {
    let state = session.controller().state();
    let source = match session.status() {
        SessionStatus::Waiting => "connecting".to_string(),
        SessionStatus::Streaming {
            identity,
            calibrated: true,
        } => identity.clone(),
        SessionStatus::Streaming {
            identity,
            calibrated: false,
        } => format!("{} (uncalibrated)", identity),
        SessionStatus::Failed(_) => "no camera".to_string(),
    };
    format!(
        "{} | yaw {:.0} pitch {:.0} | drag to orbit | 'h' help | 'q' quit",
        source, state.yaw, state.pitch
    )
}

fn build_help_message() -> String {
    "drag: Orbit | s: Snapshot | h: Toggle help | q/Ctrl+C: Quit".to_string()
}

/// Widget that renders a point cloud frame using half-block characters
struct FrameWidget {
    frame: Option<RenderedFrame>,
    placeholder: String,
}

impl FrameWidget {
    fn new() -> Self {
        Self {
            frame: None,
            placeholder: String::new(),
        }
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.as_ref().filter(|f| f.width > 0 && f.height > 0) else {
            let msg = self.placeholder.as_str();
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };

        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let Some(cell) = buf.cell_mut((term_x, term_y)) else {
                    continue;
                };
                cell.set_char('▀');
                cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
            }
        }
    }
}

fn sample_pixel(frame: &RenderedFrame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let idx = ((y * frame.width + x) * 4) as usize;
    match frame.rgba.get(idx..idx + 3) {
        Some(&[r, g, b]) => Color::Rgb(r, g, b),
        _ => Color::Black,
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
