//! Ratatui-based terminal UI.
//!
//! The TUI loads the dataset once, then lets you move the cutoff year and the
//! horizon; every change refits and redraws the actual vs forecast chart and
//! the forecast table.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table},
};

use crate::aggregate::yearly_counts;
use crate::app::pipeline::{RunOutput, run_forecast_with_counts};
use crate::domain::{ForecastConfig, IngestStats, MAX_HORIZON, YearlyCounts};
use crate::error::{AppError, ErrorKind};
use crate::io::ingest::load_dataset;
use crate::models::predict;

mod plotters_chart;

use plotters_chart::GrowthChart;

/// Start the TUI on `data_path` with `config` as the initial settings.
pub fn run(data_path: PathBuf, config: ForecastConfig) -> Result<(), AppError> {
    // Load before touching the terminal so data errors print normally.
    let mut app = App::new(data_path, config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend).map_err(|e| term_err(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Restores the terminal (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| term_err(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(term_err(format!("Failed to enter alternate screen: {e}")));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Cutoff,
    Horizon,
}

impl Field {
    const ALL: [Field; 2] = [Field::Cutoff, Field::Horizon];
}

struct App {
    data_path: PathBuf,
    stats: IngestStats,
    yearly: YearlyCounts,
    config: ForecastConfig,
    selected: usize,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(data_path: PathBuf, config: ForecastConfig) -> Result<Self, AppError> {
        let dataset = load_dataset(&data_path)?;
        let mut app = Self {
            data_path,
            stats: dataset.stats,
            yearly: yearly_counts(&dataset),
            config,
            selected: 0,
            status: String::new(),
            run: None,
        };
        app.refit();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| term_err(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100)).map_err(|e| term_err(format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| term_err(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(Field::ALL.len() - 1),
            KeyCode::Left => self.adjust(-1),
            KeyCode::Right => self.adjust(1),
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    fn adjust(&mut self, delta: i32) {
        match Field::ALL[self.selected] {
            Field::Cutoff => {
                self.config.cutoff_year = self.config.cutoff_year.saturating_add(delta);
            }
            Field::Horizon => {
                let next = if delta >= 0 {
                    self.config.horizon.saturating_add(1)
                } else {
                    self.config.horizon.saturating_sub(1)
                };
                self.config.horizon = next.clamp(1, MAX_HORIZON);
            }
        }
        self.refit();
    }

    fn reload(&mut self) {
        match load_dataset(&self.data_path) {
            Ok(dataset) => {
                self.stats = dataset.stats;
                self.yearly = yearly_counts(&dataset);
                self.refit();
            }
            Err(err) => self.status = format!("Reload failed: {err}"),
        }
    }

    /// Refit with the current settings. Fit errors stay in the status line.
    fn refit(&mut self) {
        match run_forecast_with_counts(self.stats, self.yearly.clone(), &self.config) {
            Ok(run) => {
                self.status = match run.outcome.diagnostics.warnings.first() {
                    Some(w) => format!("warning: {w}"),
                    None => format!(
                        "cutoff {} | horizon {} | fitted",
                        self.config.cutoff_year, self.config.horizon
                    ),
                };
                self.run = Some(run);
            }
            Err(err) => {
                self.status = format!("{:?}: {err}", err.kind());
                self.run = None;
            }
        }
    }

    fn write_debug(&mut self) {
        let Some(run) = &self.run else {
            self.status = "No fit to debug.".to_string();
            return;
        };
        self.status = match crate::debug::write_debug_bundle(&self.data_path, &self.config, run) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines = vec![Line::from(vec![
            Span::styled("evf", Style::default().fg(Color::Cyan)),
            Span::raw(format!(
                " EV registrations | {} | rows used {} of {}",
                self.data_path.display(),
                self.stats.rows_used,
                self.stats.rows_read
            )),
        ])];

        if let Some(run) = &self.run {
            let o = &run.outcome;
            lines.push(Line::from(Span::styled(
                format!(
                    "a={:.3} b={:.4} | base {} | rmse={:.1} | starts {}/{}",
                    o.params.a,
                    o.params.b,
                    o.base_year,
                    o.diagnostics.rmse,
                    o.diagnostics.starts_converged,
                    o.diagnostics.starts_tried
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(30)])
            .split(area);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(columns[1]);

        self.draw_chart(frame, columns[0]);
        self.draw_settings(frame, side[0]);
        self.draw_forecast_table(frame, side[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Actual vs forecast").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("No fit for the current settings.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let series = chart_series(run);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = GrowthChart {
            curve: &series.curve,
            actual: &series.actual,
            excluded: &series.excluded,
            forecast: &series.forecast,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "model year",
            y_label: "registrations",
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_count,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = Field::ALL
            .iter()
            .map(|field| match field {
                Field::Cutoff => ListItem::new(format!("Cutoff year: {}", self.config.cutoff_year)),
                Field::Horizon => ListItem::new(format!("Horizon: {}", self.config.horizon)),
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_forecast_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Forecast").borders(Borders::ALL);
        let Some(run) = &self.run else {
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };

        let rows: Vec<Row> = run
            .outcome
            .forecast
            .iter()
            .map(|p| Row::new(vec![p.year.to_string(), format!("{:.0}", p.value)]))
            .collect();
        let table = Table::new(rows, [Constraint::Length(6), Constraint::Min(10)])
            .header(Row::new(vec!["year", "registrations"]).style(Style::default().add_modifier(Modifier::BOLD)))
            .block(block);
        frame.render_widget(table, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  r reload  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart data derived from a run.
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    curve: Vec<(f64, f64)>,
    actual: Vec<(f64, f64)>,
    excluded: Vec<(f64, f64)>,
    forecast: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_series(run: &RunOutput) -> ChartSeries {
    let o = &run.outcome;
    let point = |(year, count): (i32, u64)| (f64::from(year), count as f64);

    let actual: Vec<(f64, f64)> = o.training.iter().map(point).collect();
    let excluded: Vec<(f64, f64)> = run.yearly.iter().filter(|&(y, _)| y >= o.cutoff_year).map(point).collect();
    let forecast: Vec<(f64, f64)> = o.forecast.iter().map(|p| (f64::from(p.year), p.value)).collect();

    let x0 = f64::from(o.base_year);
    let last_year = o.forecast.last().map(|p| p.year).unwrap_or(o.cutoff_year);
    let x1 = f64::from(last_year.max(run.yearly.max_year().unwrap_or(last_year)));
    let x_bounds = if x1 > x0 { [x0, x1] } else { [x0 - 0.5, x0 + 0.5] };

    let n = 200usize;
    let curve: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let x = x_bounds[0] + (x_bounds[1] - x_bounds[0]) * i as f64 / (n as f64 - 1.0);
            (x, predict(&o.params, x - x0))
        })
        .collect();

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in actual.iter().chain(&excluded).chain(&forecast).chain(&curve) {
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min) * 0.05).max(1e-12);

    ChartSeries {
        curve,
        actual,
        excluded,
        forecast,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    }
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_count(v: f64) -> String {
    if v.abs() >= 1_000.0 {
        format!("{:.0}k", v / 1_000.0)
    } else {
        format!("{v:.0}")
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };
    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    let y = chart.y + chart.height;
    if y < inner.y + inner.height - 1 {
        for i in 0..ticks {
            let u = i as f64 / (ticks as f64 - 1.0);
            let label = fmt_axis_year(x_bounds[0] + u * (x_bounds[1] - x_bounds[0]));
            let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
            let rect = Rect {
                x: x.saturating_sub(label.len() as u16 / 2),
                y,
                width: label.len() as u16,
                height: 1,
            };
            frame.render_widget(Paragraph::new(label).style(style), rect);
        }
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let label = fmt_axis_count(y_bounds[0] + u * (y_bounds[1] - y_bounds[0]));
        let start = (inner.x + insets.left.saturating_sub(1)).saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        let rect = Rect {
            x: start,
            y: chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16,
            width: label.len() as u16,
            height: 1,
        };
        frame.render_widget(Paragraph::new(label).style(style), rect);
    }

    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(
            Paragraph::new("model year").alignment(Alignment::Center).style(style),
            x_rect,
        );
    }
}

fn term_err(msg: String) -> AppError {
    AppError::new(ErrorKind::Terminal, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run() -> RunOutput {
        let yearly: YearlyCounts = [(2018, 100), (2019, 160), (2020, 260), (2021, 420), (2022, 150)]
            .into_iter()
            .collect();
        run_forecast_with_counts(IngestStats::default(), yearly, &ForecastConfig::new(2022, 3)).unwrap()
    }

    #[test]
    fn chart_series_splits_training_and_partial_years() {
        let series = chart_series(&run());
        assert_eq!(series.actual.len(), 4);
        assert_eq!(series.excluded, vec![(2022.0, 150.0)]);
        assert_eq!(series.forecast.len(), 3);
        assert_eq!(series.x_bounds, [2018.0, 2024.0]);
        assert_eq!(series.curve.first().map(|p| p.0), Some(2018.0));
        assert!(series.y_bounds[0] < 100.0 && series.y_bounds[1] > series.forecast[2].1);
    }

    #[test]
    fn axis_counts_use_thousands() {
        assert_eq!(fmt_axis_count(57_519.0), "58k");
        assert_eq!(fmt_axis_count(250.0), "250");
    }
}
