//! Ratatui-based terminal UI.
//!
//! The TUI lists the chosen fits, and charts the selected training series
//! against its candidate together with the test points assigned to it.

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
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::app::pipeline::{RunOutput, run_match};
use crate::domain::{Fit, MatchConfig, Outcome, SeriesId};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::FitChart;

/// Run the pipeline, then start the TUI on its output.
pub fn run(config: &MatchConfig) -> Result<(), AppError> {
    // Load before touching the terminal so input errors print normally.
    let run = run_match(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let debug_dir = config.debug_dir.clone().unwrap_or_else(|| PathBuf::from("debug"));
    let mut app = App::new(run, debug_dir);
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
    run: RunOutput,
    /// Index into `run.selection.fits`.
    selected: usize,
    show_all: bool,
    debug_dir: PathBuf,
    status: String,
}

impl App {
    fn new(run: RunOutput, debug_dir: PathBuf) -> Self {
        let status = format!(
            "{} fits, {} of {} points matched",
            run.selection.fits.len(),
            run.summary.matched,
            run.summary.total
        );
        Self {
            run,
            selected: 0,
            show_all: false,
            debug_dir,
            status,
        }
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

            if !event::poll(Duration::from_millis(100)).map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
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

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < self.run.selection.fits.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('a') => {
                self.show_all = !self.show_all;
                self.status = if self.show_all {
                    "Showing all test points.".to_string()
                } else {
                    "Showing points assigned to the selected fit.".to_string()
                };
            }
            KeyCode::Char('d') => match crate::debug::write_debug_bundle(&self.run, &self.debug_dir) {
                Ok(path) => self.status = format!("Wrote debug bundle: {}", path.display()),
                Err(err) => self.status = format!("Debug write failed: {err}"),
            },
            _ => {}
        }
        false
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
        let d = &self.run.datasets;
        let s = &self.run.summary;
        let gray = Style::default().fg(Color::Gray);
        let lines = vec![
            Line::from(vec![
                Span::styled("ideal", Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    " | training: {} ({} series) | candidates: {} ({} series) | samples: {}",
                    d.training.source,
                    d.training.stats.n_series,
                    d.candidates.source,
                    d.candidates.stats.n_series,
                    d.candidates.stats.n_samples
                )),
            ]),
            Line::from(Span::styled(
                format!(
                    "test: {} points | matched={} unmappable={} no_fit={} | rejected series={}",
                    s.total,
                    s.matched,
                    s.unmappable,
                    s.no_fit,
                    self.run.selection.rejected.len()
                ),
                gray,
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(area);

        self.draw_fit_list(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
    }

    fn draw_fit_list(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .run
            .selection
            .fits
            .iter()
            .map(|fit| ListItem::new(fit_list_label(&self.run, fit)))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Fits").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !self.run.selection.fits.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let fit = self.run.selection.fits.get(self.selected);
        let title = fit
            .map(|f| {
                format!(
                    "{} vs {} | sse={:.4} tol={:.4}",
                    f.training_label, f.candidate_label, f.sum_squared_error, f.tolerance
                )
            })
            .unwrap_or_else(|| "No fits".to_string());
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = fit.and_then(|f| chart_series(&self.run, f.training_id, self.show_all)) else {
            let msg = Paragraph::new("Nothing to chart.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let widget = FitChart {
            curve: &data.curve,
            training: &data.training,
            matched: &data.matched,
            unassigned: &data.unassigned,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  a all points  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Series handed to the chart widget.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    curve: Vec<(f64, f64)>,
    training: Vec<(f64, f64)>,
    matched: Vec<(f64, f64)>,
    unassigned: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Points are counted per training series, so two fits sharing a candidate
/// each show only their own matches.
fn fit_list_label(run: &RunOutput, fit: &Fit) -> String {
    let n = run
        .assignments
        .iter()
        .filter(|a| a.matched_training_id == Some(fit.training_id))
        .count();
    format!("{} → {} ({n} pts)", fit.training_label, fit.candidate_label)
}

fn chart_series(run: &RunOutput, training_id: SeriesId, show_all: bool) -> Option<ChartData> {
    let fit = run.selection.fit_for(training_id)?;
    let training = run.datasets.training.set.get(training_id)?;
    let candidate = run.datasets.candidates.set.get(fit.candidate_id)?;

    let curve: Vec<(f64, f64)> = candidate.points().collect();
    let training: Vec<(f64, f64)> = training.points().filter(|(_, y)| y.is_finite()).collect();

    let mut matched = Vec::new();
    let mut unassigned = Vec::new();
    for a in &run.assignments {
        if !a.y.is_finite() {
            continue;
        }
        let mine = a.matched_training_id == Some(training_id);
        match a.outcome {
            Outcome::Matched if mine || show_all => matched.push((a.x, a.y)),
            Outcome::NoQualifyingFit | Outcome::UnmappableDomain if show_all => unassigned.push((a.x, a.y)),
            _ => {}
        }
    }

    let x_bounds = [*candidate.x().first()?, *candidate.x().last()?];
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in curve.iter().chain(&training).chain(&matched).chain(&unassigned) {
        if x >= x_bounds[0] && x <= x_bounds[1] && y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !(y_min.is_finite() && y_max.is_finite()) || y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    if !(y_min.is_finite() && y_max.is_finite()) {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some(ChartData {
        curve,
        training,
        matched,
        unassigned,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    })
}
