//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - actual registrations: `o` joined by `-`
//! - forecast registrations: `*` joined by `.`

use crate::domain::{ForecastFile, ForecastOutcome};

/// Render actual vs forecast for an in-memory outcome.
pub fn render_forecast_plot(outcome: &ForecastOutcome, width: usize, height: usize) -> String {
    let actual: Vec<(f64, f64)> = outcome
        .training
        .iter()
        .map(|(year, count)| (f64::from(year), count as f64))
        .collect();
    let forecast: Vec<(f64, f64)> = outcome.forecast.iter().map(|p| (f64::from(p.year), p.value)).collect();
    render_plot(&actual, &forecast, width, height)
}

/// Render actual vs forecast from a saved forecast JSON file.
pub fn render_forecast_file_plot(file: &ForecastFile, width: usize, height: usize) -> String {
    let actual: Vec<(f64, f64)> = file
        .training
        .iter()
        .map(|p| (f64::from(p.year), p.count as f64))
        .collect();
    let forecast: Vec<(f64, f64)> = file.forecast.iter().map(|p| (f64::from(p.year), p.value)).collect();
    render_plot(&actual, &forecast, width, height)
}

fn render_plot(actual: &[(f64, f64)], forecast: &[(f64, f64)], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = range(actual.iter().chain(forecast.iter()).map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(actual.iter().chain(forecast.iter()).map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so that markers overlay them.
    draw_polyline(&mut grid, actual, '-', (x_min, x_max), (y_min, y_max));
    draw_polyline(&mut grid, forecast, '.', (x_min, x_max), (y_min, y_max));

    for &(x, y) in actual {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }
    for &(x, y) in forecast {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = '*';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: year=[{x_min:.0}, {x_max:.0}] | registrations=[{y_min:.0}, {y_max:.0}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push_str("Legend: o actual, * forecast\n");
    out
}

/// Min/max of finite values; degenerate ranges are widened by ±0.5.
fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min { Some((min, max)) } else { Some((min - 0.5, max + 0.5)) }
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
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], points: &[(f64, f64)], ch: char, xr: (f64, f64), yr: (f64, f64)) {
    let height = grid.len();
    let width = grid[0].len();

    let cells: Vec<(usize, usize)> = points
        .iter()
        .map(|&(x, y)| (map_x(x, xr.0, xr.1, width), map_y(y, yr.0, yr.1, height)))
        .collect();
    for w in cells.windows(2) {
        draw_line(grid, w[0].0, w[0].1, w[1].0, w[1].1, ch);
    }
}

/// Integer line drawing (Bresenham-ish).
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
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let actual = [(2020.0, 0.0), (2021.0, 10.0)];
        let forecast = [(2022.0, 20.0)];

        let txt = render_plot(&actual, &forecast, 10, 5);
        let expected = concat!(
            "Plot: year=[2020, 2022] | registrations=[-1, 21]\n",
            "         *\n",
            "          \n",
            "    -o    \n",
            "  --      \n",
            "o-        \n",
            "Legend: o actual, * forecast\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn single_year_plot_does_not_panic() {
        let txt = render_plot(&[(2020.0, 5.0)], &[], 12, 6);
        assert!(txt.contains('o'));
    }
}
