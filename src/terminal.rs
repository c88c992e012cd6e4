// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photobooth kiosk
//!
//! Renders the booth to the terminal. Camera pixels use Unicode half-block
//! characters for improved vertical resolution.

use crate::app::{
    CoinVisual, KioskAction, Screen, SessionController, SessionEvent, SessionState, map_key,
};
use crate::backends::camera::CameraBackend;
use crate::backends::feedback::Feedback;
use crate::config::Config;
use crate::constants::ui::{COIN_SPIN, COIN_SPIN_DIVISOR, FRAME_INTERVAL, TOAST_WIDTH};
use crate::errors::{CaptureError, ExportError};
use crate::filters::FilterId;
use crate::fl;
use crate::pipelines::photo::{CaptureOutcome, CountdownDisplay};

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Run the kiosk until the operator quits
pub fn run(
    config: Config,
    backend: Arc<dyn CameraBackend>,
    feedback: Arc<dyn Feedback>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    // Run the app
    let result = runtime.block_on(run_app(&mut terminal, &config, backend, feedback));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Work the loop hands off so input stays responsive
enum Task {
    Activation(Result<(u32, u32), CaptureError>),
    Capture(CaptureOutcome),
    Download(Result<PathBuf, ExportError>),
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    backend: Arc<dyn CameraBackend>,
    feedback: Arc<dyn Feedback>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut controller, mut events) = SessionController::new(config, backend, feedback);
    let mut tasks: JoinSet<Task> = JoinSet::new();
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut tick: u64 = 0;

    info!(export_dir = %controller.export_dir().display(), "Kiosk started");

    loop {
        ticker.tick().await;
        tick = tick.wrapping_add(1);

        while let Some(done) = tasks.try_join_next() {
            match done {
                Ok(Task::Activation(result)) => controller.finish_activation(result),
                Ok(Task::Capture(outcome)) => debug!(outcome = ?outcome, "Capture task done"),
                Ok(Task::Download(result)) => debug!(ok = result.is_ok(), "Download task done"),
                Err(e) => error!(error = %e, "Kiosk task failed"),
            }
        }

        while let Some(event) = events.try_next() {
            match event {
                SessionEvent::PaymentAccepted => {
                    if let Some(activation) = controller.begin_session() {
                        tasks.spawn(async move { Task::Activation(activation.await) });
                    }
                }
            }
        }

        terminal.draw(|f| draw(f, &controller, tick))?;

        // Drain input without blocking the redraw
        while event::poll(Duration::ZERO)? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            let Some(action) = map_key(controller.input_context(), key) else {
                continue;
            };
            match action {
                KioskAction::InsertCoin => {
                    controller.insert_coin();
                }
                KioskAction::Capture => {
                    let capture = controller.capture();
                    tasks.spawn(async move { Task::Capture(capture.await) });
                }
                KioskAction::SelectFilter(filter) => {
                    controller.select_filter(filter);
                }
                KioskAction::Retake => {
                    controller.retake();
                }
                KioskAction::Download => {
                    let download = controller.download();
                    tasks.spawn(async move { Task::Download(download.await) });
                }
                KioskAction::NewSession => controller.end_session(),
                KioskAction::DismissAlert => {
                    controller.dismiss_alert();
                }
                KioskAction::Quit => {
                    controller.end_session();
                    tasks.shutdown().await;
                    return Ok(());
                }
            }
        }
    }
}

fn draw(f: &mut Frame, controller: &SessionController, tick: u64) {
    let area = f.area();

    // Reserve bottom line for status
    let body = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let status_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    match controller.screen() {
        Screen::Coin => draw_coin_screen(f, body, controller.coin_visual(), tick),
        Screen::Camera => draw_camera_screen(f, body, controller),
    }

    draw_toasts(f, body, controller);

    if let Some(alert) = controller.alert() {
        draw_alert(f, body, alert);
    }

    let message = status_message(controller);
    f.render_widget(StatusBar { message: &message }, status_area);
}

fn draw_coin_screen(f: &mut Frame, area: Rect, visual: CoinVisual, tick: u64) {
    let title = Line::from(Span::styled(
        fl!("coin-title"),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));

    let lines = match visual {
        CoinVisual::Waiting => {
            let spin = COIN_SPIN[((tick / COIN_SPIN_DIVISOR) % COIN_SPIN.len() as u64) as usize];
            vec![
                title,
                Line::default(),
                Line::from(Span::styled(spin, Style::default().fg(Color::Yellow))),
                Line::default(),
                Line::from(fl!("coin-prompt")),
            ]
        }
        CoinVisual::Inserted => vec![
            title,
            Line::default(),
            Line::from(Span::styled(
                fl!("coin-inserted"),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
        ],
    };

    let height = lines.len() as u16;
    let centered = Rect {
        y: area.y + area.height.saturating_sub(height) / 2,
        height: height.min(area.height),
        ..area
    };
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered,
    );
}

fn draw_camera_screen(f: &mut Frame, area: Rect, controller: &SessionController) {
    let stage = controller.stage();

    // Bottom line of the body lists the filters
    let frame_area = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let filter_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    };

    let image = stage.render_surface(frame_area.width as u32, frame_area.height as u32 * 2);
    f.render_widget(&FrameWidget { image }, frame_area);

    if let Some(countdown) = stage.countdown() {
        let progress = countdown.pulse_progress(stage.countdown_step(), tokio::time::Instant::now());
        draw_countdown(f, frame_area, &countdown, progress);
    }

    f.render_widget(
        FilterBar {
            active: controller.session().active_filter,
        },
        filter_area,
    );
}

/// Countdown label in a box that shrinks over the step
fn draw_countdown(f: &mut Frame, area: Rect, countdown: &CountdownDisplay, progress: f32) {
    let pad = ((1.0 - progress) * 3.0).round() as u16;
    let width = (7 + pad * 2).min(area.width);
    let height = (3 + pad).min(area.height);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let color = if countdown.pulse % 2 == 0 {
        Color::Yellow
    } else {
        Color::White
    };
    let inner_pad = height.saturating_sub(3) / 2;
    let mut lines = vec![Line::default(); inner_pad as usize];
    lines.push(Line::from(Span::styled(
        countdown.step.label(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )));

    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color))),
        rect,
    );
}

fn draw_toasts(f: &mut Frame, area: Rect, controller: &SessionController) {
    let now = tokio::time::Instant::now();
    let width = TOAST_WIDTH.min(area.width);

    for (row, toast) in controller.toasts().visible().iter().enumerate() {
        let y = area.y + 1 + row as u16 * 3;
        if y + 3 > area.y + area.height {
            break;
        }
        // Slide in from the right edge
        let shown = (width as f32 * toast.visibility(now)).round() as u16;
        if shown == 0 {
            continue;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(shown),
            y,
            width: shown,
            height: 3,
        };
        f.render_widget(Clear, rect);
        f.render_widget(
            Paragraph::new(toast.text.as_str())
                .style(Style::default().fg(Color::White).bg(Color::Black))
                .block(Block::default().borders(Borders::ALL)),
            rect,
        );
    }
}

fn draw_alert(f: &mut Frame, area: Rect, message: &str) {
    let width = (area.width * 2 / 3).max(20).min(area.width);
    let height = 7.min(area.height);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let text = vec![
        Line::from(message.to_string()),
        Line::default(),
        Line::from(Span::styled(
            fl!("alert-dismiss"),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            ),
        rect,
    );
}

fn status_message(controller: &SessionController) -> String {
    match controller.screen() {
        Screen::Coin => fl!("status-coin"),
        Screen::Camera => match controller.session().state {
            SessionState::Capturing => fl!("status-countdown"),
            SessionState::Captured => fl!("status-captured"),
            SessionState::Idle | SessionState::CameraActive => fl!("status-live"),
        },
    }
}

/// Widget that renders a camera image using half-block characters
struct FrameWidget {
    image: Option<RgbaImage>,
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.image.as_ref().filter(|i| i.width() > 0 && i.height() > 0) else {
            // No frame yet - show placeholder
            let msg = fl!("waiting-for-camera");
            let x = area.x + (area.width.saturating_sub(msg.chars().count() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Calculate display dimensions maintaining aspect ratio
        // Each terminal cell displays 2 vertical pixels using half-block characters
        let image_aspect = image.width() as f64 / image.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > image_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * image_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / image_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = image.width() as f64 / display_width as f64;
        let y_scale = image.height() as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(image, src_x, src_y_top));
                    cell.set_bg(sample_pixel(image, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(image: &RgbaImage, x: u32, y: u32) -> Color {
    let x = x.min(image.width() - 1);
    let y = y.min(image.height() - 1);
    let [r, g, b, _] = image.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// One line listing every filter with its shortcut
struct FilterBar {
    active: FilterId,
}

impl Widget for FilterBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::with_capacity(FilterId::ALL.len() * 2);
        for filter in FilterId::ALL {
            let label = format!(" {} {} ", filter.shortcut(), filter.display_name());
            let style = if filter == self.active {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
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
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
