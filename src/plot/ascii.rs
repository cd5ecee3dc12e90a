//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - chosen candidate: `-` line
//! - training samples: `o`
//! - test points: matched training id (`1`-`9`, `#` above 9), `x` when unassigned

use crate::domain::{Assignment, MatchReport, Series};

/// Render one training series against its chosen candidate.
pub fn render_fit_plot(training: &Series, candidate: &Series, width: usize, height: usize) -> String {
    let curve: Vec<(f64, f64)> = candidate.points().collect();
    let marks: Vec<(f64, f64, char)> = training.points().map(|(x, y)| (x, y, 'o')).collect();
    render_plot(&[curve], &marks, width, height)
}

/// Render every chosen curve of a saved report with its test points.
pub fn render_assignment_plot(report: &MatchReport, width: usize, height: usize) -> String {
    let curves: Vec<Vec<(f64, f64)>> = report
        .curves
        .iter()
        .map(|c| c.x.iter().copied().zip(c.y.iter().copied()).collect())
        .collect();
    let marks: Vec<(f64, f64, char)> = report
        .assignments
        .iter()
        .map(|a| (a.x, a.y, assignment_mark(a)))
        .collect();
    render_plot(&curves, &marks, width, height)
}

fn assignment_mark(a: &Assignment) -> char {
    match a.matched_training_id {
        Some(id) if a.is_matched() => u32::try_from(id)
            .ok()
            .filter(|id| *id <= 9)
            .and_then(|id| char::from_digit(id, 10))
            .unwrap_or('#'),
        _ => 'x',
    }
}

fn render_plot(curves: &[Vec<(f64, f64)>], marks: &[(f64, f64, char)], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let all = curves
        .iter()
        .flatten()
        .copied()
        .chain(marks.iter().map(|&(x, y, _)| (x, y)));
    let ((x_min, x_max), (y_min, y_max)) = ranges(all).unwrap_or(((0.0, 1.0), (0.0, 1.0)));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Curves first so the marks overlay them.
    for curve in curves {
        draw_curve(&mut grid, curve, (x_min, x_max), (y_min, y_max));
    }

    for &(x, y, ch) in marks {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = ch;
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n"));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

type Range = (f64, f64);

fn ranges(points: impl Iterator<Item = (f64, f64)>) -> Option<(Range, Range)> {
    let mut x_range = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y_range = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in points.filter(|(x, y)| x.is_finite() && y.is_finite()) {
        x_range = (x_range.0.min(x), x_range.1.max(x));
        y_range = (y_range.0.min(y), y_range.1.max(y));
    }
    let usable = |(lo, hi): Range| lo.is_finite() && hi.is_finite() && hi > lo;
    match (usable(x_range), usable(y_range)) {
        (true, true) => Some((x_range, y_range)),
        (true, false) if y_range.0.is_finite() => Some((x_range, (y_range.0 - 1.0, y_range.0 + 1.0))),
        _ => None,
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max is row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], (x_min, x_max): Range, (y_min, y_max): Range) {
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);

    // A non-finite sample breaks the line.
    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, '-'),
            None => grid[row][col] = '-',
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|cell| **cell == ' ')
        {
            *cell = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
