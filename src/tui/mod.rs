//! Ratatui-based terminal dashboard.
//!
//! The dashboard provides a file prompt for loading pricing sheets, two
//! multi-select filters (rental duration, ACRISS code), a per-competitor
//! price chart, and two summary tables: the filtered observation grid with
//! an editable price column, and a per-competitor roll-up.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::session::Session;
use crate::domain::{ACRISS_CODES, DashboardConfig, PricePoint, RENTAL_DAYS, Selection};
use crate::error::AppError;
use crate::io::decode::Upload;
use crate::normalize::filter_points;
use crate::report::{CompetitorSummary, summarize_competitors};

mod plotters_chart;

use plotters_chart::{PriceChart, series_color};

/// The one user-visible notice for any failed upload attempt. Decode and
/// schema failures are deliberately not distinguished here.
const FAILURE_NOTICE: &str = "There was an error processing this file.";

const FIELD_FILE: usize = 0;
const FIELD_DAYS: usize = 1;
const FIELD_ACRISS: usize = 2;
const FIELD_GRID: usize = 3;

/// Start the dashboard.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    session: Session,
    selection: Selection,
    file_path: Option<PathBuf>,
    selected_field: usize,
    day_cursor: usize,
    acriss_cursor: usize,
    grid_row: usize,
    editing_path: bool,
    path_input: String,
    editing_price: bool,
    price_input: String,
    status: String,
}

impl App {
    fn new(config: DashboardConfig) -> Self {
        let mut app = Self {
            session: Session::new(),
            selection: config.selection.clone(),
            file_path: None,
            selected_field: FIELD_FILE,
            day_cursor: 0,
            acriss_cursor: 0,
            grid_row: 0,
            editing_path: false,
            path_input: String::new(),
            editing_price: false,
            price_input: String::new(),
            status: "Enter a file path to load pricing data.".to_string(),
        };
        if let Some(path) = &config.file {
            app.load_path(&path.clone());
        }
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns true when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_path {
            self.handle_path_edit(code);
            return false;
        }
        if self.editing_price {
            self.handle_price_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field == FIELD_GRID && self.grid_row > 0 {
                    self.grid_row -= 1;
                } else if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELD_GRID {
                    self.selected_field += 1;
                } else {
                    let last = self.filtered().len().saturating_sub(1);
                    if self.grid_row < last {
                        self.grid_row += 1;
                    }
                }
            }
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Char(' ') => self.toggle_selection(),
            KeyCode::Enter => match self.selected_field {
                FIELD_FILE => {
                    self.editing_path = true;
                    self.path_input = self
                        .file_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    self.status =
                        "Editing file path. Enter to load, Esc to cancel.".to_string();
                }
                FIELD_GRID => self.begin_price_edit(),
                _ => {}
            },
            KeyCode::Char('r') => {
                if let Some(path) = self.file_path.clone() {
                    self.load_path(&path);
                } else {
                    self.status = "No file loaded yet.".to_string();
                }
            }
            _ => {}
        }

        false
    }

    fn handle_path_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_path = false;
                self.status = "File edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing_path = false;
                let trimmed = self.path_input.trim().to_string();
                if trimmed.is_empty() {
                    self.status = "No file path given.".to_string();
                } else {
                    self.load_path(Path::new(&trimmed));
                }
            }
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            KeyCode::Char(c) => self.path_input.push(c),
            _ => {}
        }
    }

    fn handle_price_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_price = false;
                self.status = "Price edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing_price = false;
                self.apply_price_input();
            }
            KeyCode::Backspace => {
                self.price_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '.' {
                    self.price_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: i32) {
        let step = |cursor: usize, len: usize| -> usize {
            if delta >= 0 {
                (cursor + 1).min(len - 1)
            } else {
                cursor.saturating_sub(1)
            }
        };
        match self.selected_field {
            FIELD_DAYS => self.day_cursor = step(self.day_cursor, RENTAL_DAYS.len()),
            FIELD_ACRISS => self.acriss_cursor = step(self.acriss_cursor, ACRISS_CODES.len()),
            _ => {}
        }
    }

    fn toggle_selection(&mut self) {
        match self.selected_field {
            FIELD_DAYS => {
                let day = RENTAL_DAYS[self.day_cursor];
                self.selection.toggle_day(day);
                self.grid_row = 0;
                self.status = format!("days: {:?}", self.selection.days);
            }
            FIELD_ACRISS => {
                let code = ACRISS_CODES[self.acriss_cursor];
                self.selection.toggle_acriss(code);
                self.grid_row = 0;
                self.status = format!("acriss: {:?}", self.selection.acriss);
            }
            _ => {}
        }
    }

    fn begin_price_edit(&mut self) {
        let filtered = self.filtered();
        let Some(point) = filtered.get(self.grid_row) else {
            self.status = "No row selected.".to_string();
            return;
        };
        self.editing_price = true;
        self.price_input = format!("{}", point.price);
        self.status = "Editing price. Enter to apply, Esc to cancel.".to_string();
    }

    fn apply_price_input(&mut self) {
        let Ok(price) = self.price_input.trim().parse::<f64>() else {
            self.status = format!("Invalid price '{}'.", self.price_input.trim());
            return;
        };
        let filtered = self.filtered();
        let Some(key) = filtered.get(self.grid_row) else {
            self.status = "No row selected.".to_string();
            return;
        };
        if self.session.set_price(key, price) {
            self.status = format!("{} {} -> {price:.2}", key.competitor, key.date);
        } else {
            self.status = "Row no longer present.".to_string();
        }
    }

    fn load_path(&mut self, path: &Path) {
        let upload = match Upload::from_path(path) {
            Ok(u) => u,
            Err(e) => {
                self.status = e.to_string();
                return;
            }
        };
        match self.session.load(&upload) {
            Ok(()) => {
                self.file_path = Some(path.to_path_buf());
                self.grid_row = 0;
                let problems = if self.session.row_errors.is_empty() {
                    String::new()
                } else {
                    format!(" ({} rows skipped)", self.session.row_errors.len())
                };
                self.status = format!(
                    "Loaded {}: {} points{problems}.",
                    upload.filename,
                    self.session.points.len()
                );
            }
            Err(e) => {
                // Previously loaded data stays in the session untouched.
                tracing::warn!(file = %path.display(), error = %e, "upload failed");
                self.status = FAILURE_NOTICE.to_string();
            }
        }
    }

    fn filtered(&self) -> Vec<PricePoint> {
        filter_points(&self.session.points, &self.selection)
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(12),
                Constraint::Length(3),
            ])
            .split(size);

        let filtered = self.filtered();
        self.grid_row = self.grid_row.min(filtered.len().saturating_sub(1));
        let summaries = summarize_competitors(&filtered);

        self.draw_header(frame, chunks[0], &filtered, &summaries);
        self.draw_chart(frame, chunks[1], &filtered);
        self.draw_tables(frame, chunks[2], &filtered, &summaries);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        filtered: &[PricePoint],
        summaries: &[CompetitorSummary],
    ) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("rbench", Style::default().fg(Color::Cyan)),
            Span::raw(" — competitor car-rental pricing"),
        ]));

        let source = self
            .session
            .source
            .as_deref()
            .unwrap_or("placeholder data");
        let days: Vec<String> = self.selection.days.iter().map(|d| d.to_string()).collect();
        let acriss: Vec<String> = self.selection.acriss.iter().cloned().collect();
        lines.push(Line::from(Span::styled(
            format!(
                "source: {source} | points: {} shown / {} total | days: {} | acriss: {}",
                filtered.len(),
                self.session.points.len(),
                days.join(","),
                acriss.join(","),
            ),
            Style::default().fg(Color::Gray),
        )));

        // Legend: competitor names in their series colors.
        let mut legend: Vec<Span> = Vec::new();
        for (idx, s) in summaries.iter().enumerate() {
            if idx > 0 {
                legend.push(Span::raw("  "));
            }
            let (r, g, b) = series_color(idx);
            legend.push(Span::styled(
                format!("● {}", s.competitor),
                Style::default().fg(Color::Rgb(r, g, b)),
            ));
        }
        lines.push(Line::from(legend));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, filtered: &[PricePoint]) {
        let block = Block::default().title("Price over time").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some((series, x_bounds, y_bounds, epoch)) = chart_series(filtered) else {
            let msg = Paragraph::new("No data for the current selection.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let widget = PriceChart {
            series: &series,
            x_bounds,
            y_bounds,
            epoch,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_tables(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        filtered: &[PricePoint],
        summaries: &[CompetitorSummary],
    ) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(30),
                Constraint::Min(0),
                Constraint::Length(40),
            ])
            .split(area);

        self.draw_settings(frame, chunks[0]);
        self.draw_grid(frame, chunks[1], filtered);
        self.draw_summary(frame, chunks[2], summaries);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let file_label = if self.editing_path {
            format!("File: {}_", self.path_input)
        } else {
            format!(
                "File: {}",
                self.file_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string())
            )
        };

        let items = vec![
            ListItem::new(file_label),
            ListItem::new(format!(
                "Days:   {}",
                selector_line(&RENTAL_DAYS.map(|d| d.to_string()), self.day_cursor, |v| {
                    self.selection.days.contains(&v.parse::<u32>().unwrap_or(0))
                })
            )),
            ListItem::new(format!(
                "Acriss: {}",
                selector_line(
                    &ACRISS_CODES.map(|c| c.to_string()),
                    self.acriss_cursor,
                    |v| self.selection.acriss.contains(v)
                )
            )),
        ];

        let list = List::new(items)
            .block(Block::default().title("Filters").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        if self.selected_field < FIELD_GRID {
            state.select(Some(self.selected_field));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_grid(&self, frame: &mut ratatui::Frame<'_>, area: Rect, filtered: &[PricePoint]) {
        let mut items: Vec<ListItem> = Vec::with_capacity(filtered.len() + 1);
        items.push(ListItem::new(Span::styled(
            format!(
                "{:<16} {:>4} {:>11} {:>6} {:>9}",
                "competitor", "days", "date", "acriss", "price"
            ),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for p in filtered {
            items.push(ListItem::new(format!(
                "{:<16} {:>4} {:>11} {:>6} {:>9.2}",
                p.competitor, p.days, p.date.to_string(), p.acriss, p.price
            )));
        }

        let title = if self.editing_price {
            format!("Observations — price: {}_", self.price_input)
        } else {
            "Observations (Enter edits price)".to_string()
        };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White));

        let mut state = ratatui::widgets::ListState::default();
        if self.selected_field == FIELD_GRID && !filtered.is_empty() {
            // +1 skips the header item.
            state.select(Some(self.grid_row + 1));
            *state.offset_mut() = self.grid_row.saturating_sub(area.height.saturating_sub(3) as usize);
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_summary(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        summaries: &[CompetitorSummary],
    ) {
        let mut items: Vec<ListItem> = Vec::with_capacity(summaries.len() + 1);
        items.push(ListItem::new(Span::styled(
            format!("{:<16} {:>3} {:>7} {:>7} {:>10}", "competitor", "n", "min", "mean", "latest"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (idx, s) in summaries.iter().enumerate() {
            let (r, g, b) = series_color(idx);
            items.push(ListItem::new(Span::styled(
                format!(
                    "{:<16} {:>3} {:>7.2} {:>7.2} {:>10}",
                    s.competitor,
                    s.n,
                    s.min_price,
                    s.mean_price,
                    s.latest.to_string()
                ),
                Style::default().fg(Color::Rgb(r, g, b)),
            )));
        }

        let list = List::new(items)
            .block(Block::default().title("Per competitor").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ move  Space toggle  Enter edit/load  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Render one selector row: every domain value, `+` marking selected values
/// and parentheses marking the cursor position.
fn selector_line(values: &[String], cursor: usize, selected: impl Fn(&str) -> bool) -> String {
    let mut parts = Vec::with_capacity(values.len());
    for (idx, v) in values.iter().enumerate() {
        let mark = if selected(v) { "+" } else { "" };
        if idx == cursor {
            parts.push(format!("({mark}{v})"));
        } else {
            parts.push(format!("{mark}{v}"));
        }
    }
    parts.join(" ")
}

/// Build per-competitor chart series from the filtered points.
///
/// X is the day offset from the earliest date so the axis stays numeric;
/// returns `None` when there is nothing to draw.
fn chart_series(
    points: &[PricePoint],
) -> Option<(Vec<(String, Vec<(f64, f64)>)>, [f64; 2], [f64; 2], chrono::NaiveDate)> {
    if points.is_empty() {
        return None;
    }

    let epoch = points.iter().map(|p| p.date).min()?;
    let last = points.iter().map(|p| p.date).max()?;

    let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        let x = (p.date - epoch).num_days() as f64;
        y_min = y_min.min(p.price);
        y_max = y_max.max(p.price);
        match series.last_mut() {
            // Points arrive sorted by (competitor, date), so each series'
            // x values are already ascending.
            Some((name, data)) if *name == p.competitor => data.push((x, p.price)),
            _ => series.push((p.competitor.clone(), vec![(x, p.price)])),
        }
    }

    let mut x1 = (last - epoch).num_days() as f64;
    if x1 <= 0.0 {
        x1 = 1.0;
    }
    let x_bounds = [0.0, x1];

    if !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    Some((series, x_bounds, y_bounds, epoch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(competitor: &str, day: u32, price: f64) -> PricePoint {
        PricePoint {
            competitor: competitor.to_string(),
            days: 7,
            date: NaiveDate::from_ymd_opt(2021, 1, day).unwrap(),
            acriss: "MBMR".to_string(),
            price,
        }
    }

    #[test]
    fn chart_series_groups_by_competitor() {
        let points = vec![
            point("Avis", 1, 30.0),
            point("Avis", 3, 35.0),
            point("Hertz", 1, 50.0),
        ];
        let (series, x_bounds, y_bounds, epoch) = chart_series(&points).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "Avis");
        assert_eq!(series[0].1, vec![(0.0, 30.0), (2.0, 35.0)]);
        assert_eq!(x_bounds, [0.0, 2.0]);
        assert!(y_bounds[0] < 30.0 && y_bounds[1] > 50.0);
        assert_eq!(epoch, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    }

    #[test]
    fn chart_series_is_none_when_empty() {
        assert!(chart_series(&[]).is_none());
    }

    #[test]
    fn single_date_still_has_positive_x_span() {
        let points = vec![point("Avis", 1, 30.0)];
        let (_, x_bounds, _, _) = chart_series(&points).unwrap();
        assert!(x_bounds[1] > x_bounds[0]);
    }

    #[test]
    fn selector_line_marks_cursor_and_membership() {
        let values: Vec<String> = ["1", "7"].iter().map(|s| s.to_string()).collect();
        let line = selector_line(&values, 1, |v| v == "7");
        assert_eq!(line, "1 (+7)");
    }
}
