use std::io::stdout;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use emr_viewer_core::model::{Advance, InterfaceSession};
use emr_viewer_core::sync::ContinueState;
use emr_viewer_protocol::{ChartId, EpochMillis, SeriesConfig, ThemeToken, TimeWindow};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph},
};

use crate::chart::{TermChart, TermView};

pub type Session = InterfaceSession<TermChart, TermView>;

const HEADER_ROWS: u16 = 2;
const ROW_HEIGHT: u16 = 2;
const MIN_SPAN_MS: i64 = 60_000;
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::MarkerLine => Color::White,
        ThemeToken::DayBand => Color::Rgb(70, 70, 70),
        ThemeToken::RecentBand => Color::Rgb(80, 55, 30),
        ThemeToken::NormalRange => Color::Rgb(30, 60, 80),
        ThemeToken::ZeroLine => Color::Gray,
        ThemeToken::BelowNormal => Color::Cyan,
        ThemeToken::WithinNormal => Color::Green,
        ThemeToken::AboveNormal => Color::Red,
        ThemeToken::Unranged => Color::White,
        ThemeToken::DiscreteValue => Color::White,
        ThemeToken::Systolic => Color::LightBlue,
        ThemeToken::Diastolic => Color::Gray,
        ThemeToken::Intake => Color::Green,
        ThemeToken::Output => Color::Red,
        ThemeToken::Dose => Color::LightBlue,
        ThemeToken::RowHighlight => Color::Rgb(255, 195, 0),
        ThemeToken::RowBackground => Color::Black,
        ThemeToken::ContinueReady => Color::Green,
        ThemeToken::ContinueBlocked => Color::Rgb(237, 29, 29),
        ThemeToken::MarkerIndicatorActive => Color::White,
        ThemeToken::MarkerIndicatorIdle => Color::DarkGray,
    }
}

/// Terminal color for a CSS color string from a chart configuration.
/// Black is drawn white so it shows on the dark background.
fn css_color(css: &str) -> Color {
    match css {
        "black" | "#000000" => return Color::White,
        "white" => return Color::White,
        "green" => return Color::Green,
        _ => {}
    }
    if let Some(hex) = css.strip_prefix('#') {
        if hex.len() == 6 {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
                return Color::Rgb(r, g, b);
            }
        }
    }
    Color::Gray
}

/// Column of `t` in a `width`-column strip spanning `window`.
fn column_of(t: EpochMillis, window: TimeWindow, width: u16) -> Option<u16> {
    if !window.contains(t) || width == 0 {
        return None;
    }
    let span = window.span().max(1) as i128;
    let offset = i128::from(t - window.min());
    Some((offset * i128::from(width - 1) / span) as u16)
}

fn pan(window: TimeWindow, delta: i64) -> TimeWindow {
    TimeWindow::new(
        window.min().saturating_add(delta),
        window.max().saturating_add(delta),
    )
    .unwrap_or(window)
}

/// Scale the span around the window center, never below one minute.
fn zoom(window: TimeWindow, factor: f64) -> TimeWindow {
    let center = window.min() + window.span() / 2;
    let half = ((window.span() as f64 * factor) as i64 / 2).max(MIN_SPAN_MS / 2);
    TimeWindow::new(center - half, center + half).unwrap_or(window)
}

fn zone_color(series: &SeriesConfig, y: f64) -> Color {
    let zone = series
        .zones
        .iter()
        .find(|z| z.value.is_none_or(|limit| y < limit));
    match (zone, &series.color) {
        (Some(z), _) => css_color(&z.color),
        (None, Some(c)) => css_color(c),
        (None, None) => Color::White,
    }
}

/// Draw one chart's plot strip: bands as background, points as level glyphs,
/// the point marker as a vertical bar.
fn draw_plot(buf: &mut Buffer, area: Rect, chart: &TermChart, window: TimeWindow) {
    for band in &chart.bands {
        let color = band.token.map_or(Color::DarkGray, theme_to_color);
        let from = (band.from as EpochMillis).max(window.min());
        let to = (band.to as EpochMillis).min(window.max());
        let (Some(a), Some(b)) = (
            column_of(from, window, area.width),
            column_of(to, window, area.width),
        ) else {
            continue;
        };
        for col in a..=b {
            buf[(area.x + col, area.y)].set_bg(color);
        }
    }

    let (lo, hi) = chart
        .config
        .series
        .iter()
        .flat_map(|s| &s.data)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    let range = (hi - lo).max(f64::EPSILON);
    for series in &chart.config.series {
        for p in &series.data {
            let Some(col) = column_of(p.x, window, area.width) else {
                continue;
            };
            let level = (((p.y - lo) / range) * (LEVELS.len() - 1) as f64).round() as usize;
            buf[(area.x + col, area.y)]
                .set_char(LEVELS[level.min(LEVELS.len() - 1)])
                .set_fg(zone_color(series, p.y));
        }
    }

    for line in &chart.lines {
        if let Some(col) = column_of(line.value as EpochMillis, window, area.width) {
            let color = line.token.map_or(Color::White, theme_to_color);
            buf[(area.x + col, area.y)].set_char('│').set_fg(color);
        }
    }
}

fn continue_label(state: Option<ContinueState>) -> (&'static str, Color) {
    match state {
        Some(ContinueState::Ready) => ("continue: ready", theme_to_color(ThemeToken::ContinueReady)),
        Some(ContinueState::Blocked) => (
            "continue: select at least one row",
            theme_to_color(ThemeToken::ContinueBlocked),
        ),
        _ => ("continue", Color::Gray),
    }
}

fn draw(frame: &mut Frame<'_>, session: &Session, rows: &[ChartId], cursor: usize, status: &str) {
    let area = frame.area();
    let view = session.view();

    let header = format!(
        " case {} | step {}/{} | {} | marker {}{}",
        session.case().case_id,
        session.step() + 1,
        session.step_count(),
        view.range_label,
        if view.marker_active { "● " } else { "○ " },
        view.marker_label,
    );
    frame.render_widget(
        Paragraph::new(header).style(Style::default().fg(Color::White).bg(Color::DarkGray)),
        Rect::new(0, 0, area.width, 1),
    );
    let (label, color) = continue_label(view.continue_state);
    let help = format!(
        " ←→ pan  +/- zoom  ↑↓ row  space select  m mark  b day  c clear  h filter  n next  q quit | {label} {status}"
    );
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(color)),
        Rect::new(0, 1, area.width, 1),
    );

    let content = Rect::new(
        0,
        HEADER_ROWS,
        area.width,
        area.height.saturating_sub(HEADER_ROWS),
    );
    frame.render_widget(Block::default().style(Style::default().bg(Color::Black)), content);

    let per_page = usize::from((content.height / ROW_HEIGHT).max(1));
    let first = cursor.saturating_sub(per_page - 1);
    let selected_window = session.selected_window();

    for (slot, id) in rows.iter().enumerate().skip(first).take(per_page) {
        let Some(chart) = session.charts().chart(id.as_str()) else {
            continue;
        };
        let y = content.y + ((slot - first) as u16) * ROW_HEIGHT;
        let mut title_style = Style::default().fg(if chart.visible {
            Color::White
        } else {
            Color::DarkGray
        });
        if view.highlighted.contains(id) {
            title_style = title_style
                .fg(Color::Black)
                .bg(theme_to_color(ThemeToken::RowHighlight));
        }
        if slot == cursor {
            title_style = title_style.add_modifier(Modifier::BOLD);
        }
        let pointer = if slot == cursor { "▶" } else { " " };
        let credits = chart.config.credits.as_deref().unwrap_or_default();
        let title = format!("{pointer} {}  {credits}", chart.config.title);
        frame.render_widget(
            Paragraph::new(title).style(title_style),
            Rect::new(content.x, y, content.width, 1),
        );

        if chart.visible {
            let plot = Rect::new(content.x, y + 1, content.width, 1);
            let window = chart.extremes.unwrap_or(selected_window);
            draw_plot(frame.buffer_mut(), plot, chart, window);
        }
    }
}

/// Every registered row, hidden ones included, so a row can be selected while
/// the highlight filter hides it.
fn cursor_rows(session: &Session) -> Vec<ChartId> {
    session.charts().ids().cloned().collect()
}

/// Runs its closure when dropped, on every exit path including `?`.
struct OnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(
        stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        crossterm::cursor::Show
    );
}

/// Raw mode and the alternate screen, undone when the guard drops so an error
/// inside the event loop still leaves a usable terminal.
fn enter_terminal() -> Result<OnDrop<fn()>> {
    enable_raw_mode()?;
    let guard = OnDrop(restore_terminal as fn());
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(guard)
}

pub fn render_tui(session: &mut Session) -> Result<()> {
    let _terminal_guard = enter_terminal()?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut cursor: usize = 0;
    let mut status = String::new();
    // Column and window where a mouse drag started.
    let mut drag: Option<(u16, TimeWindow)> = None;

    loop {
        let rows = cursor_rows(session);
        cursor = cursor.min(rows.len().saturating_sub(1));
        terminal.draw(|frame| draw(frame, session, &rows, cursor, &status))?;

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }
        let window = session.selected_window();
        let width = i64::from(terminal.size()?.width.max(1));
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Left => {
                    session.on_range_changed(pan(window, -window.span() / 10));
                }
                KeyCode::Right => {
                    session.on_range_changed(pan(window, window.span() / 10));
                }
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    session.on_range_changed(zoom(window, 1.0 / 1.3));
                }
                KeyCode::Char('-') => {
                    session.on_range_changed(zoom(window, 1.3));
                }
                KeyCode::Up => cursor = cursor.saturating_sub(1),
                KeyCode::Down => cursor += 1,
                KeyCode::Char(' ') => {
                    if let Some(id) = rows.get(cursor) {
                        session.on_row_clicked(id);
                    }
                }
                KeyCode::Char('m') => {
                    session.on_point_clicked(window.min() + window.span() / 2);
                }
                KeyCode::Char('b') => {
                    session.on_band_requested(window.min() + window.span() / 2);
                }
                KeyCode::Char('c') => session.clear_marker(true),
                KeyCode::Char('h') => {
                    let active = !session.highlight_filter_active();
                    session.set_highlight_filter(active);
                }
                KeyCode::Char('n') => {
                    status = match session.advance() {
                        Ok(Advance::NextStep(step)) => format!("| step {}", step + 1),
                        Ok(Advance::CaseComplete) => match session.save_request() {
                            Ok(request) => format!(
                                "| case complete, would POST {} {}",
                                request.path,
                                request.body.unwrap_or_default()
                            ),
                            Err(e) => format!("| {e}"),
                        },
                        Err(e) => format!("| {e}"),
                    };
                }
                _ => {}
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    session.on_pointer_down();
                    drag = Some((mouse.column, window));
                }
                MouseEventKind::Drag(MouseButton::Left) => {
                    if let Some((start_col, start)) = drag {
                        let cols = i64::from(start_col) - i64::from(mouse.column);
                        session.on_range_changed(pan(start, cols * start.span() / width));
                    }
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    drag = None;
                    session.on_pointer_up();
                }
                MouseEventKind::ScrollUp => {
                    session.on_range_changed(zoom(window, 1.0 / 1.3));
                }
                MouseEventKind::ScrollDown => {
                    session.on_range_changed(zoom(window, 1.3));
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(())
}
